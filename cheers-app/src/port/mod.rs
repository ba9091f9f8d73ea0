//! Capabilities the rotation engine consumes. Implementations live in
//! `infrastructure`.

mod storage_backend;
mod toast_repository;

pub use storage_backend::{StorageBackend, StorageError};
pub use toast_repository::ToastRepository;
