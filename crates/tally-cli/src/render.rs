//! Terminal rendering of sessions and projections.

use colored::Colorize;
use tally_application::{ParticipantStatus, Progress, SessionView};
use tally_core::aggregation::AggregateResult;
use tally_core::session::{JoinOutcome, Phase, Session};

pub fn phase(phase: Phase) -> String {
    match phase {
        Phase::Inviting => "inviting".cyan().to_string(),
        Phase::Voting => "voting".yellow().to_string(),
        Phase::Completed => "completed".green().to_string(),
    }
}

pub fn session(session: &Session) -> String {
    let mut out = format!(
        "{} {}\n  code:     {}\n  method:   {}\n  capacity: {}\n  phase:    {}\n  objects:\n",
        "Session".bold(),
        session.name.bright_magenta(),
        session.code.as_str().bold(),
        session.method.label(),
        session.capacity,
        phase(session.phase),
    );
    for (index, object) in session.objects.iter().enumerate() {
        out.push_str(&format!("    {}. {}\n", index + 1, object));
    }
    out
}

pub fn join_outcome(outcome: &JoinOutcome) -> String {
    let session = outcome.session();
    let participant = outcome.participant();
    let mut out = String::new();

    if outcome.is_materialized() {
        out.push_str(&format!(
            "{}\n",
            format!(
                "Session {} was not found here; started a default {} session with {} objects.",
                session.code,
                session.method.label(),
                session.object_count()
            )
            .yellow()
        ));
    }

    out.push_str(&format!(
        "Joined {} ({}) as {}\n  participant id: {}\n",
        session.name.bright_magenta(),
        session.code.as_str().bold(),
        participant.name.green(),
        participant.id,
    ));
    out
}

pub fn progress(progress: &Progress) -> String {
    format!(
        "{}  joined {}/{}  submitted {}/{}",
        phase(progress.phase),
        progress.joined,
        progress.capacity,
        progress.submitted,
        progress.capacity,
    )
}

pub fn roster(rows: &[ParticipantStatus]) -> String {
    if rows.is_empty() {
        return format!("{}\n", "No participants yet.".dimmed());
    }

    rows.iter()
        .map(|row| {
            let mark = if row.has_ballot {
                "voted".green()
            } else {
                "waiting".dimmed()
            };
            format!("  {:<24} {}\n", row.participant.name, mark)
        })
        .collect()
}

pub fn results(result: &AggregateResult) -> String {
    let mut out = format!(
        "{} ({} ballots from {} participants)\n",
        "Results".bold(),
        result.ballot_count,
        result.participant_count
    );

    for (place, object, mean) in result.standings() {
        let line = format!("  {:>2}. {:<24} {:>6.2}", place, object, mean);
        if place == 1 {
            out.push_str(&format!("{}\n", line.green().bold()));
        } else {
            out.push_str(&format!("{}\n", line));
        }
    }

    if let Some(winner) = &result.winner {
        out.push_str(&format!("Winner: {}\n", winner.green().bold()));
    }
    out
}

pub fn view(view: &SessionView) -> String {
    match view {
        SessionView::Inviting { roster: rows } => {
            format!("{}\n{}", phase(Phase::Inviting), roster(rows))
        }
        SessionView::Voting {
            progress: counters,
            roster: rows,
        } => format!("{}\n{}", progress(counters), roster(rows)),
        SessionView::Completed { result } => results(result),
    }
}
