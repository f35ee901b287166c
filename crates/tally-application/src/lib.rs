pub mod evaluation_usecase;
pub mod session;
pub mod sync;

pub use evaluation_usecase::EvaluationUseCase;
pub use session::{ParticipantStatus, Progress, SessionUpdater, SessionView};
pub use sync::{SyncDaemon, SyncHandle};
