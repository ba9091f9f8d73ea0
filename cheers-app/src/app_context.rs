use crate::config::AppConfig;
use crate::infrastructure::memory::InMemoryToastRepository;
use crate::port::ToastRepository;
use cheers_errors::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub toast_repo: Arc<dyn ToastRepository>,
}

impl AppContext {
    pub fn new(toast_repo: Arc<dyn ToastRepository>) -> Self {
        Self { toast_repo }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryToastRepository::new()))
    }

    #[cfg(feature = "db")]
    pub async fn with_database(database_url: &str) -> Result<Self, AppError> {
        use crate::infrastructure::db::{create_connection, run_migrations, SeaOrmToastRepository};

        let db = create_connection(database_url)
            .await
            .map_err(|e| AppError::Repository(e.to_string()))?;
        run_migrations(&db)
            .await
            .map_err(|e| AppError::Repository(e.to_string()))?;
        Ok(Self::new(Arc::new(SeaOrmToastRepository::new(db))))
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let ctx = match config.database_url.as_deref() {
            #[cfg(feature = "db")]
            Some(url) => {
                tracing::info!("Using Postgres toast repository");
                Self::with_database(url).await?
            }
            #[cfg(not(feature = "db"))]
            Some(_) => {
                tracing::warn!("DATABASE_URL set but built without the db feature, using memory");
                Self::in_memory()
            }
            None => {
                tracing::info!("Using in-memory toast repository");
                Self::in_memory()
            }
        };

        if config.seed_samples {
            crate::application::seed_sample_toasts(ctx.toast_repo.as_ref()).await?;
        }
        Ok(ctx)
    }
}
