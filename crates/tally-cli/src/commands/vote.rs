use super::{open_usecase, parse_code, print_json};
use crate::AppContext;
use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;
use std::collections::BTreeMap;
use tally_core::session::Session;
use tally_core::voting::{BallotInput, EvaluationMethod, PairPreference};

/// Ballot flags as typed on the command line.
#[derive(Debug, Default)]
pub struct RawBallot {
    pub scores: Vec<String>,
    pub ranking: Vec<String>,
    pub preferences: Vec<String>,
}

pub async fn submit(ctx: &AppContext, code: &str, participant: &str, raw: RawBallot) -> Result<()> {
    let usecase = open_usecase(ctx).await?;
    let code = parse_code(code)?;
    let session = usecase.session(&code).await?;

    let participant_id = resolve_participant(&session, participant)?;
    let input = parse_ballot(&session, raw)?;
    let ballot = usecase.submit_ballot(&code, &participant_id, &input).await?;

    if ctx.json {
        return print_json(&ballot);
    }

    println!("{}", format!("Ballot recorded for {}", ballot.participant_name).green());
    for object in &session.objects {
        println!("  {:<24} {:>5.1}", object, ballot.score(object));
    }
    Ok(())
}

/// Accepts a participant id, falling back to an exact name.
fn resolve_participant(session: &Session, key: &str) -> Result<String> {
    if let Some(p) = session.participant(key) {
        return Ok(p.id.clone());
    }
    session
        .participant_named(key)
        .map(|p| p.id.clone())
        .ok_or_else(|| anyhow!("No participant '{}' in session {}", key, session.code))
}

/// Maps a label or a 1-based object number to the object label.
///
/// Unknown keys are passed through so the voting engine can apply its own
/// rules to them.
fn resolve_object(session: &Session, key: &str) -> String {
    let key = key.trim();
    if session.objects.iter().any(|o| o == key) {
        return key.to_string();
    }
    match key.parse::<usize>() {
        Ok(n) if (1..=session.objects.len()).contains(&n) => session.objects[n - 1].clone(),
        _ => key.to_string(),
    }
}

fn parse_ballot(session: &Session, raw: RawBallot) -> Result<BallotInput> {
    let kinds = [
        !raw.scores.is_empty(),
        !raw.ranking.is_empty(),
        !raw.preferences.is_empty(),
    ];
    if kinds.iter().filter(|given| **given).count() > 1 {
        bail!("Use only one of --score, --rank or --prefer");
    }

    // Without flags, submit an empty ballot of the session's own kind and let
    // the engine fill defaults or report what is missing.
    if !kinds.contains(&true) {
        return Ok(match session.method {
            EvaluationMethod::Direct => BallotInput::Direct(BTreeMap::new()),
            EvaluationMethod::Ranking => BallotInput::Ranking(Vec::new()),
            EvaluationMethod::Pairwise => BallotInput::Pairwise(Vec::new()),
        });
    }

    if !raw.ranking.is_empty() {
        let order = raw.ranking.iter().map(|k| resolve_object(session, k)).collect();
        return Ok(BallotInput::Ranking(order));
    }

    if !raw.preferences.is_empty() {
        let mut preferences = Vec::with_capacity(raw.preferences.len());
        for text in &raw.preferences {
            let pref: PairPreference = text
                .parse()
                .with_context(|| format!("Invalid preference '{}'", text))?;
            preferences.push(PairPreference::new(
                resolve_object(session, &pref.preferred),
                resolve_object(session, &pref.other),
            ));
        }
        return Ok(BallotInput::Pairwise(preferences));
    }

    let mut scores = BTreeMap::new();
    for text in &raw.scores {
        let (key, value) = text
            .rsplit_once('=')
            .ok_or_else(|| anyhow!("Expected OBJECT=VALUE, got '{}'", text))?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid score in '{}'", text))?;
        scores.insert(resolve_object(session, key), value);
    }
    Ok(BallotInput::Direct(scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::TallyError;
    use tally_core::session::{NewSession, SessionCode};
    use tally_core::voting::VotingEngine;

    fn session() -> Session {
        session_with(EvaluationMethod::Direct)
    }

    fn session_with(method: EvaluationMethod) -> Session {
        let mut session = Session::create(
            SessionCode::parse("VOTE01").unwrap(),
            NewSession {
                method,
                ..NewSession::default()
            },
        );
        session.attach_participant("Ann");
        session
    }

    fn normalize_without_flags(method: EvaluationMethod) -> tally_core::Result<BTreeMap<String, f64>> {
        let session = session_with(method);
        let input = parse_ballot(&session, RawBallot::default()).unwrap();
        VotingEngine::default().normalize(&session.objects, session.method, &input)
    }

    #[test]
    fn test_no_flags_on_ranking_session_uses_defaults() {
        let scores = normalize_without_flags(EvaluationMethod::Ranking).unwrap();
        assert_eq!(scores.len(), 4);
    }

    #[test]
    fn test_no_flags_on_pairwise_session_is_incomplete() {
        let err = normalize_without_flags(EvaluationMethod::Pairwise).unwrap_err();
        assert_eq!(
            err,
            TallyError::IncompleteBallot {
                designated: 0,
                required: 6
            }
        );
    }

    #[test]
    fn test_no_flags_on_direct_session_uses_defaults() {
        let scores = normalize_without_flags(EvaluationMethod::Direct).unwrap();
        assert_eq!(scores.len(), 4);
    }

    #[test]
    fn test_objects_by_number_or_label() {
        let s = session();
        assert_eq!(resolve_object(&s, "2"), "Object 2");
        assert_eq!(resolve_object(&s, " Object 4 "), "Object 4");
        assert_eq!(resolve_object(&s, "9"), "9");
    }

    #[test]
    fn test_participant_by_id_or_name() {
        let s = session();
        let id = s.participants[0].id.clone();
        assert_eq!(resolve_participant(&s, &id).unwrap(), id);
        assert_eq!(resolve_participant(&s, "Ann").unwrap(), id);
        assert!(resolve_participant(&s, "Bob").is_err());
    }

    #[test]
    fn test_direct_scores() {
        let raw = RawBallot {
            scores: vec!["1=7".to_string(), "Object 3 = 2.5".to_string()],
            ..RawBallot::default()
        };
        match parse_ballot(&session(), raw).unwrap() {
            BallotInput::Direct(scores) => {
                assert_eq!(scores["Object 1"], 7.0);
                assert_eq!(scores["Object 3"], 2.5);
            }
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_preferences() {
        let raw = RawBallot {
            preferences: vec!["1>2".to_string()],
            ..RawBallot::default()
        };
        match parse_ballot(&session(), raw).unwrap() {
            BallotInput::Pairwise(prefs) => {
                assert_eq!(prefs, vec![PairPreference::new("Object 1", "Object 2")]);
            }
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_mixed_kinds_are_rejected() {
        let raw = RawBallot {
            scores: vec!["1=3".to_string()],
            ranking: vec!["2".to_string()],
            ..RawBallot::default()
        };
        assert!(parse_ballot(&session(), raw).is_err());
    }
}
