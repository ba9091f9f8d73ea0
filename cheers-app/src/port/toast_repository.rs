use crate::domain::{NewToast, Toast, VoteChange};
use async_trait::async_trait;
use cheers_errors::AppError;

/// Shared toast collection with server-authoritative counters.
#[async_trait]
pub trait ToastRepository: Send + Sync {
    /// All toasts, newest first.
    async fn list_toasts(&self) -> Result<Vec<Toast>, AppError>;

    async fn get_toast_by_id(&self, id: uuid::Uuid) -> Result<Option<Toast>, AppError>;

    /// Uniform pick among `ids`. `None` when `ids` is empty or the pick no
    /// longer exists.
    async fn get_random_toast_from_ids(&self, ids: &[uuid::Uuid]) -> Result<Option<Toast>, AppError>;

    /// Persists a toast with a fresh id and zeroed counters.
    async fn create_toast(&self, new_toast: NewToast) -> Result<Toast, AppError>;

    /// Applies the signed delta between `previous_vote` and `vote`.
    /// A change from `None` to `None` must succeed without touching anything.
    async fn update_vote(&self, change: VoteChange) -> Result<(), AppError>;
}
