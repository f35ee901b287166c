//! Scannable representation of an invitation.

use super::Invitation;
use crate::error::Result;

/// What to show so a second device can pick up the invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualCode {
    /// Unicode QR code of the full link.
    Barcode(String),
    /// The bare session code in large letter-spaced print, used when no
    /// barcode could be produced.
    Fallback(String),
}

impl VisualCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Barcode(text) | Self::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Renders the invitation link as a QR code, or the bare code if that fails.
pub fn render_visual_code(invitation: &Invitation) -> Result<VisualCode> {
    let link = invitation.to_link()?;
    match render_barcode(&link) {
        Some(barcode) => Ok(VisualCode::Barcode(barcode)),
        None => Ok(VisualCode::Fallback(large_print(invitation.code.as_str()))),
    }
}

#[cfg(feature = "qr")]
fn render_barcode(payload: &str) -> Option<String> {
    match qrcode::QrCode::new(payload.as_bytes()) {
        Ok(qr) => Some(
            qr.render::<qrcode::render::unicode::Dense1x2>()
                .quiet_zone(true)
                .build(),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "barcode rendering failed, using fallback");
            None
        }
    }
}

#[cfg(not(feature = "qr"))]
fn render_barcode(_payload: &str) -> Option<String> {
    None
}

fn large_print(code: &str) -> String {
    let spaced: Vec<String> = code.chars().map(|c| c.to_string()).collect();
    let body = format!("  {}  ", spaced.join("   "));
    let rule = "═".repeat(body.chars().count());
    format!("╔{rule}╗\n║{body}║\n╚{rule}╝")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionCode;

    #[test]
    fn test_large_print_contains_every_character() {
        let text = large_print("AB12CD");
        let middle = text.lines().nth(1).unwrap();
        assert!(middle.contains("A   B   1   2   C   D"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_render_visual_code() {
        let invitation =
            Invitation::new("http://localhost:8080/", SessionCode::parse("QR0001").unwrap())
                .unwrap();
        let visual = render_visual_code(&invitation).unwrap();

        if cfg!(feature = "qr") {
            assert!(!visual.is_fallback());
            assert!(visual.as_str().lines().count() > 5);
        } else {
            assert!(visual.as_str().contains("Q   R   0   0   0   1"));
        }
    }
}
