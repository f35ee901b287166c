//! Shareable invitation links.
//!
//! An invitation is the organizer's base URL plus a `session` query
//! parameter carrying the code:
//!
//! ```text
//! http://localhost:8080/?session=K3X9QZ
//! ```
//!
//! Older links also carried the whole session record as JSON in a `data`
//! parameter, so a participant on another device could vote without the
//! organizer's storage. Those links are still understood.

mod visual;

pub use visual::{VisualCode, render_visual_code};

use crate::error::{Result, TallyError};
use crate::session::{Session, SessionCode};
use url::Url;

const SESSION_PARAM: &str = "session";
const DATA_PARAM: &str = "data";

/// A parsed or to-be-shared invitation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invitation {
    pub base_url: Url,
    pub code: SessionCode,
    /// Full session record, only present in legacy links
    pub embedded: Option<Session>,
}

impl Invitation {
    /// Creates a code-only invitation.
    pub fn new(base_url: &str, code: SessionCode) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            code,
            embedded: None,
        })
    }

    /// Creates a legacy invitation that embeds the session record.
    pub fn with_embedded(base_url: &str, session: Session) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            code: session.code.clone(),
            embedded: Some(session),
        })
    }

    /// Renders the shareable link.
    pub fn to_link(&self) -> Result<String> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(SESSION_PARAM, self.code.as_str());
            if let Some(session) = &self.embedded {
                query.append_pair(DATA_PARAM, &serde_json::to_string(session)?);
            }
        }
        Ok(url.into())
    }

    /// Parses a link produced by [`Invitation::to_link`].
    ///
    /// A `data` parameter that does not decode to a session is ignored; the
    /// code alone is still usable.
    pub fn parse(link: &str) -> Result<Self> {
        let url = Url::parse(link.trim())?;

        let mut code = None;
        let mut data = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                SESSION_PARAM => code = Some(value.into_owned()),
                DATA_PARAM => data = Some(value.into_owned()),
                _ => {}
            }
        }

        let code = code
            .ok_or_else(|| TallyError::validation("invitation", "link has no session code"))?;
        let code = SessionCode::parse(&code)?;

        let embedded = data.and_then(|json| match serde_json::from_str::<Session>(&json) {
            Ok(session) if session.code == code => Some(session),
            Ok(session) => {
                tracing::warn!(
                    link_code = %code,
                    embedded_code = %session.code,
                    "ignoring embedded session with mismatched code"
                );
                None
            }
            Err(e) => {
                tracing::warn!(%code, error = %e, "ignoring undecodable embedded session");
                None
            }
        });

        let mut base_url = url;
        base_url.set_query(None);
        base_url.set_fragment(None);

        Ok(Self {
            base_url,
            code,
            embedded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NewSession;

    const BASE: &str = "http://localhost:8080/vote/";

    #[test]
    fn test_code_only_link() {
        let code = SessionCode::parse("K3X9QZ").unwrap();
        let link = Invitation::new(BASE, code.clone()).unwrap().to_link().unwrap();
        assert_eq!(link, "http://localhost:8080/vote/?session=K3X9QZ");

        let parsed = Invitation::parse(&link).unwrap();
        assert_eq!(parsed.code, code);
        assert!(parsed.embedded.is_none());
        assert_eq!(parsed.base_url.as_str(), BASE);
    }

    #[test]
    fn test_base_query_is_replaced() {
        let code = SessionCode::parse("AAAAAA").unwrap();
        let link = Invitation::new("http://host/?session=OLD&x=1", code)
            .unwrap()
            .to_link()
            .unwrap();
        assert_eq!(link, "http://host/?session=AAAAAA");
    }

    #[test]
    fn test_legacy_link_carries_session() {
        let mut session = Session::create(SessionCode::parse("LEG4CY").unwrap(), NewSession::default());
        session.attach_participant("Ann & Bob");

        let link = Invitation::with_embedded(BASE, session.clone())
            .unwrap()
            .to_link()
            .unwrap();
        assert!(link.contains("data="));

        let parsed = Invitation::parse(&link).unwrap();
        assert_eq!(parsed.embedded, Some(session));
    }

    #[test]
    fn test_undecodable_data_is_ignored() {
        let parsed = Invitation::parse("http://host/?session=abc123&data=%7Bbroken").unwrap();
        assert_eq!(parsed.code.as_str(), "ABC123");
        assert!(parsed.embedded.is_none());
    }

    #[test]
    fn test_link_without_code_is_rejected() {
        let err = Invitation::parse("http://host/?data=x").unwrap_err();
        assert!(err.is_validation());
        assert!(Invitation::parse("not a url").unwrap_err().is_validation());
    }
}
