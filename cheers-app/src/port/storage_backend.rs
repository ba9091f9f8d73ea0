/// Device-scoped key-value persistence, the moral equivalent of browser
/// local storage.
pub trait StorageBackend: Send + Sync {
    fn is_available(&self) -> bool;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend unavailable")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
