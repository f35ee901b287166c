pub mod config_service;
pub mod paths;
pub mod replicated_session_store;
pub mod storage;
pub mod substrate;

pub use crate::config_service::ConfigService;
pub use crate::paths::TallyPaths;
pub use crate::replicated_session_store::ReplicatedSessionStore;
pub use crate::substrate::{FileSubstrate, MemorySubstrate};
