use super::types::{CreateToastRequest, ErrorResponse, RandomToastRequest, VoteRequest};
use crate::domain::{NewToast, Toast, VoteChange};
use crate::port::ToastRepository;
use async_trait::async_trait;
use cheers_errors::AppError;
use uuid::Uuid;

/// Talks to a `cheers-api` server.
pub struct HttpToastRepository {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpToastRepository {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/toasts{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("Toast API error: {} - {}", status, body);
        Err(error_from_body(status, &body))
    }
}

/// Rebuilds the server's `AppError` from a `{ message }` body.
fn error_from_body(status: reqwest::StatusCode, body: &str) -> AppError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => err.message.parse().unwrap_or_else(|never| match never {}),
        Err(_) => AppError::Repository(format!("API error: {}", status)),
    }
}

fn transport(e: reqwest::Error) -> AppError {
    AppError::Repository(e.to_string())
}

#[async_trait]
impl ToastRepository for HttpToastRepository {
    async fn list_toasts(&self) -> Result<Vec<Toast>, AppError> {
        let response = self
            .http_client
            .get(self.url(""))
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?.json().await.map_err(transport)
    }

    async fn get_toast_by_id(&self, id: Uuid) -> Result<Option<Toast>, AppError> {
        let response = self
            .http_client
            .get(self.url(&format!("/{}", id)))
            .send()
            .await
            .map_err(transport)?;
        match Self::check(response).await {
            Ok(response) => response.json().await.map(Some).map_err(transport),
            Err(AppError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_random_toast_from_ids(&self, ids: &[Uuid]) -> Result<Option<Toast>, AppError> {
        if ids.is_empty() {
            return Ok(None);
        }
        let request = RandomToastRequest { ids: ids.to_vec() };
        let response = self
            .http_client
            .post(self.url("/random"))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?.json().await.map_err(transport)
    }

    async fn create_toast(&self, new_toast: NewToast) -> Result<Toast, AppError> {
        let request = CreateToastRequest {
            text: new_toast.text().to_string(),
            created_by: new_toast.created_by().map(str::to_string),
        };
        let response = self
            .http_client
            .post(self.url(""))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?.json().await.map_err(transport)
    }

    async fn update_vote(&self, change: VoteChange) -> Result<(), AppError> {
        if change.delta().is_noop() {
            return Ok(());
        }
        let request = VoteRequest {
            vote: change.vote,
            previous_vote: change.previous_vote,
        };
        let response = self
            .http_client
            .post(self.url(&format!("/{}/vote", change.toast_id)))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }
}
