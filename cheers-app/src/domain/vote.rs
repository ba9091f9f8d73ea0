use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// Pressing the button of the vote already cast clears it.
    pub fn toggled(current: Option<Vote>, pressed: Vote) -> Option<Vote> {
        if current == Some(pressed) {
            None
        } else {
            Some(pressed)
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vote remembered on this device. Clearing a vote removes the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVote {
    pub toast_id: uuid::Uuid,
    pub vote: Vote,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl LocalVote {
    pub fn new(toast_id: uuid::Uuid, vote: Vote) -> Self {
        Self {
            toast_id,
            vote,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Request to move one device's vote on a toast from `previous_vote` to `vote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteChange {
    pub toast_id: uuid::Uuid,
    pub vote: Option<Vote>,
    pub previous_vote: Option<Vote>,
}

impl VoteChange {
    pub fn new(toast_id: uuid::Uuid, vote: Option<Vote>, previous_vote: Option<Vote>) -> Self {
        Self {
            toast_id,
            vote,
            previous_vote,
        }
    }

    pub fn delta(&self) -> VoteDelta {
        VoteDelta::between(self.previous_vote, self.vote)
    }
}

/// Signed counter adjustment. Counters are shared across devices, so they are
/// only ever moved by deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteDelta {
    pub likes: i32,
    pub dislikes: i32,
    pub total_votes: i32,
    pub casts_vote: bool,
}

impl VoteDelta {
    pub fn between(previous: Option<Vote>, next: Option<Vote>) -> Self {
        let mut delta = Self::default();

        match previous {
            Some(Vote::Like) => {
                delta.likes -= 1;
                delta.total_votes -= 1;
            }
            Some(Vote::Dislike) => {
                delta.dislikes -= 1;
                delta.total_votes -= 1;
            }
            None => {}
        }

        match next {
            Some(Vote::Like) => {
                delta.likes += 1;
                delta.total_votes += 1;
            }
            Some(Vote::Dislike) => {
                delta.dislikes += 1;
                delta.total_votes += 1;
            }
            None => {}
        }

        delta.casts_vote = next.is_some();
        delta
    }

    pub fn is_noop(&self) -> bool {
        self.likes == 0 && self.dislikes == 0 && self.total_votes == 0
    }
}
