//! Session domain module.
//!
//! This module contains the session record, its lifecycle phases, the code
//! that identifies it, and the storage abstractions it is replicated through.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `Participant`, `Ballot`, `Phase`, `NewSession`
//! - `code`: `SessionCode` generation and parsing
//! - `outcome`: `JoinOutcome` (resolved vs materialized joins)
//! - `merge`: whole-record last-writer-wins merge of session maps
//! - `repository`: the `SessionStore` trait
//! - `substrate`: the `KeyValueSubstrate` trait and the persisted blob layout

mod code;
mod merge;
mod model;
mod outcome;
mod repository;
mod substrate;

pub use code::{CODE_ALPHABET, CODE_LENGTH, SessionCode};
pub use merge::{MergeReport, SessionMap, merge_into};
pub use model::{
    Ballot, DEFAULT_SESSION_NAME, MATERIALIZED_CAPACITY, MATERIALIZED_OBJECT_COUNT, MAX_OBJECTS,
    MIN_OBJECTS, NewSession, Participant, Phase, Session,
};
pub use outcome::JoinOutcome;
pub use repository::SessionStore;
pub use substrate::{KeyValueSubstrate, SESSIONS_BLOB_KEY, SubstrateError, decode_blob, encode_blob};
