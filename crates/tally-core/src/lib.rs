//! Domain layer for tally evaluation sessions.
//!
//! # Module Structure
//!
//! - `session`: session records, codes, lifecycle phases and the storage traits
//! - `voting`: elicitation methods and ballot normalization
//! - `aggregation`: ranking of objects from submitted ballots
//! - `invitation`: shareable links and their visual representation
//! - `config`: configuration model

pub mod aggregation;
pub mod config;
pub mod error;
pub mod invitation;
pub mod session;
pub mod voting;

pub use error::{Result, TallyError};
