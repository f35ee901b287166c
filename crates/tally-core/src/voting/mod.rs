//! Voting engine.
//!
//! Each [`EvaluationMethod`] collects a different kind of raw input
//! ([`BallotInput`]); [`VotingEngine::normalize`] turns it into per-object
//! scores that aggregation can compare across methods.

mod engine;
mod input;
mod method;

pub use engine::{
    DIRECT_DEFAULT, DIRECT_MAX, DIRECT_MIN, RankScoring, ScoreStep, VotingEngine, all_pairs,
    required_pairs,
};
pub use input::{BallotInput, PairPreference};
pub use method::EvaluationMethod;
