mod backend;
mod vote_store;

pub use backend::{DisabledBackend, FileBackend, MemoryBackend};
pub use vote_store::LocalVoteStore;
