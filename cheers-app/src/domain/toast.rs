use super::vote::{Vote, VoteDelta};
use cheers_errors::AppError;
use serde::{Deserialize, Serialize};

pub const MAX_TOAST_LENGTH: usize = 300;
pub const MAX_CREATOR_LENGTH: usize = 30;
pub const DEFAULT_CREATOR: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: uuid::Uuid,
    pub text: String,
    pub created_by: String,
    pub likes: u32,
    pub dislikes: u32,
    #[serde(default)]
    pub total_votes: u32,
    #[serde(default)]
    pub last_vote_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Toast {
    pub fn new(new_toast: NewToast) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            text: new_toast.text,
            created_by: new_toast
                .created_by
                .unwrap_or_else(|| DEFAULT_CREATOR.to_string()),
            likes: 0,
            dislikes: 0,
            total_votes: 0,
            last_vote_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the counters by `delta`, never below zero.
    pub fn apply_delta(&mut self, delta: VoteDelta) {
        self.likes = shift(self.likes, delta.likes);
        self.dislikes = shift(self.dislikes, delta.dislikes);
        self.total_votes = shift(self.total_votes, delta.total_votes);
    }

    /// Server-side bookkeeping for a delta: counters plus timestamps.
    pub fn record_delta(&mut self, delta: VoteDelta, at: chrono::DateTime<chrono::Utc>) {
        self.apply_delta(delta);
        self.updated_at = at;
        if delta.casts_vote {
            self.last_vote_at = Some(at);
        }
    }

    pub fn with_user_vote(self, user_vote: Option<Vote>) -> ToastWithUserVote {
        ToastWithUserVote {
            toast: self,
            user_vote,
        }
    }
}

fn shift(counter: u32, by: i32) -> u32 {
    let shifted = i64::from(counter) + i64::from(by);
    u32::try_from(shifted.max(0)).unwrap_or(u32::MAX)
}

/// Toast as displayed on this device, with the local vote attached at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastWithUserVote {
    #[serde(flatten)]
    pub toast: Toast,
    pub user_vote: Option<Vote>,
}

impl ToastWithUserVote {
    pub fn id(&self) -> uuid::Uuid {
        self.toast.id
    }
}

/// Validated input for creating a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToast {
    text: String,
    created_by: Option<String>,
}

impl NewToast {
    pub fn parse(text: &str, created_by: Option<&str>) -> Result<Self, AppError> {
        let text = text.trim();

        if text.is_empty() {
            return Err(AppError::InvalidToast(
                "Toast text cannot be empty".to_string(),
            ));
        }

        if text.chars().count() > MAX_TOAST_LENGTH {
            return Err(AppError::InvalidToast(format!(
                "Toast text must be at most {} characters",
                MAX_TOAST_LENGTH
            )));
        }

        let created_by = created_by.map(str::trim).filter(|name| !name.is_empty());
        if let Some(name) = created_by {
            if name.chars().count() > MAX_CREATOR_LENGTH {
                return Err(AppError::InvalidToast(format!(
                    "Name must be at most {} characters",
                    MAX_CREATOR_LENGTH
                )));
            }
        }

        Ok(Self {
            text: text.to_string(),
            created_by: created_by.map(str::to_string),
        })
    }

    /// Whether the add action should be enabled for this input.
    pub fn is_submittable(text: &str, created_by: Option<&str>) -> bool {
        Self::parse(text, created_by).is_ok()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }
}
