use crate::domain::{NewToast, Toast, VoteChange};
use crate::port::ToastRepository;
use async_trait::async_trait;
use cheers_errors::AppError;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Toast collection held in process memory, newest first.
#[derive(Default)]
pub struct InMemoryToastRepository {
    toasts: RwLock<Vec<Toast>>,
}

impl InMemoryToastRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// `toasts` is taken as already ordered newest first.
    pub fn with_toasts(toasts: Vec<Toast>) -> Self {
        Self {
            toasts: RwLock::new(toasts),
        }
    }
}

#[async_trait]
impl ToastRepository for InMemoryToastRepository {
    async fn list_toasts(&self) -> Result<Vec<Toast>, AppError> {
        Ok(self.toasts.read().await.clone())
    }

    async fn get_toast_by_id(&self, id: Uuid) -> Result<Option<Toast>, AppError> {
        Ok(self.toasts.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn get_random_toast_from_ids(&self, ids: &[Uuid]) -> Result<Option<Toast>, AppError> {
        let picked = {
            let mut rng = rand::thread_rng();
            ids.choose(&mut rng).copied()
        };

        match picked {
            Some(id) => self.get_toast_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn create_toast(&self, new_toast: NewToast) -> Result<Toast, AppError> {
        let toast = Toast::new(new_toast);
        self.toasts.write().await.insert(0, toast.clone());
        tracing::info!("Created toast {}", toast.id);
        Ok(toast)
    }

    async fn update_vote(&self, change: VoteChange) -> Result<(), AppError> {
        let delta = change.delta();
        if delta.is_noop() {
            return Ok(());
        }

        let mut toasts = self.toasts.write().await;
        let toast = toasts
            .iter_mut()
            .find(|t| t.id == change.toast_id)
            .ok_or(AppError::NotFound)?;
        toast.record_delta(delta, chrono::Utc::now());
        Ok(())
    }
}
