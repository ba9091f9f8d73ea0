use crate::domain::Vote;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomToastRequest {
    pub ids: Vec<uuid::Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateToastRequest {
    pub text: String,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote: Option<Vote>,
    #[serde(default)]
    pub previous_vote: Option<Vote>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorResponse {
    pub message: String,
}
