//! Key-value substrates backing the replicated session store.

mod file;
mod memory;

pub use file::FileSubstrate;
pub use memory::MemorySubstrate;
