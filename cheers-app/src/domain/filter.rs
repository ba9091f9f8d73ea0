use super::toast::Toast;
use super::vote::{LocalVote, Vote};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const TOP_TOAST_LIMIT: usize = 25;

/// Which slice of the collection the rotation draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastFilter {
    #[default]
    All,
    Liked,
    #[serde(alias = "popular")]
    Top25,
}

impl ToastFilter {
    pub const ALL: [ToastFilter; 3] = [Self::All, Self::Liked, Self::Top25];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Liked => "liked",
            Self::Top25 => "top25",
        }
    }

    /// Candidate ids in cache order, except `Top25` which is ranked by likes.
    pub fn candidates(&self, toasts: &[Toast], votes: &HashMap<uuid::Uuid, LocalVote>) -> Vec<uuid::Uuid> {
        match self {
            Self::All => toasts.iter().map(|t| t.id).collect(),
            Self::Liked => toasts
                .iter()
                .filter(|t| votes.get(&t.id).is_some_and(|v| v.vote == Vote::Like))
                .map(|t| t.id)
                .collect(),
            Self::Top25 => {
                let mut liked: Vec<&Toast> = toasts.iter().filter(|t| t.likes > 0).collect();
                // stable: ties keep cache order
                liked.sort_by(|a, b| b.likes.cmp(&a.likes));
                liked.into_iter().take(TOP_TOAST_LIMIT).map(|t| t.id).collect()
            }
        }
    }

    pub fn empty_reason(&self) -> EmptyReason {
        match self {
            Self::All => EmptyReason::NoToasts,
            Self::Liked => EmptyReason::NothingLiked,
            Self::Top25 => EmptyReason::NothingPopular,
        }
    }
}

impl fmt::Display for ToastFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToastFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "liked" => Ok(Self::Liked),
            "top25" | "popular" => Ok(Self::Top25),
            other => Err(format!("unknown filter: {}", other)),
        }
    }
}

/// Why a filter has nothing to show. Not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmptyReason {
    NoToasts,
    NothingLiked,
    NothingPopular,
}

impl EmptyReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoToasts => "No toasts available yet. Add the first one!",
            Self::NothingLiked => "You haven't liked any toasts yet.",
            Self::NothingPopular => "No toast has been liked yet.",
        }
    }
}
