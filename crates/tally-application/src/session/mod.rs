//! Session helpers shared by the use case and the sync daemon.

pub mod updater;
pub mod views;

pub use updater::SessionUpdater;
pub use views::{ParticipantStatus, Progress, SessionView};
