use super::backend::MemoryBackend;
use crate::domain::{LocalVote, ToastFilter, Vote};
use crate::port::{StorageBackend, StorageError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

const VOTES_KEY: &str = "cheers-up-user-votes";
const SEEN_KEY_PREFIX: &str = "cheers-up-seen-";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRecords {
    votes: HashMap<Uuid, LocalVote>,
    last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

/// Per-device votes and per-filter seen sets.
///
/// Best effort: every operation degrades to an empty read or a skipped write
/// when the backend is unavailable or fails, and failures are only logged.
#[derive(Clone)]
pub struct LocalVoteStore {
    backend: Arc<dyn StorageBackend>,
}

impl LocalVoteStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn get_vote(&self, toast_id: Uuid) -> Option<Vote> {
        self.read_votes().votes.get(&toast_id).map(|v| v.vote)
    }

    /// `None` deletes the record.
    pub fn set_vote(&self, toast_id: Uuid, vote: Option<Vote>) {
        if !self.is_available() {
            return;
        }

        let mut records = self.read_votes();
        match vote {
            Some(vote) => {
                records.votes.insert(toast_id, LocalVote::new(toast_id, vote));
            }
            None => {
                records.votes.remove(&toast_id);
            }
        }
        records.last_updated = Some(chrono::Utc::now());
        self.write(VOTES_KEY, &records);
    }

    pub fn get_all_votes(&self) -> HashMap<Uuid, LocalVote> {
        self.read_votes().votes
    }

    pub fn clear_votes(&self) {
        self.remove(VOTES_KEY);
    }

    pub fn get_seen_set(&self, filter: ToastFilter) -> HashSet<Uuid> {
        self.read(&seen_key(filter)).unwrap_or_default()
    }

    pub fn add_seen(&self, filter: ToastFilter, toast_id: Uuid) {
        if !self.is_available() {
            return;
        }

        let mut seen = self.get_seen_set(filter);
        if seen.insert(toast_id) {
            self.write(&seen_key(filter), &seen);
        }
    }

    pub fn clear_seen(&self, filter: ToastFilter) {
        self.remove(&seen_key(filter));
    }

    pub fn clear_all_seen(&self) {
        for filter in ToastFilter::ALL {
            self.clear_seen(filter);
        }
    }

    fn read_votes(&self) -> VoteRecords {
        self.read(VOTES_KEY).unwrap_or_default()
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.is_available() {
            return None;
        }

        let raw = match self.backend.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = StorageError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!("{}", err);
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
            .and_then(|json| self.backend.set(key, &json));

        if let Err(e) = result {
            tracing::warn!("Failed to save {}: {}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        if !self.is_available() {
            return;
        }
        if let Err(e) = self.backend.remove(key) {
            tracing::warn!("Failed to clear {}: {}", key, e);
        }
    }
}

fn seen_key(filter: ToastFilter) -> String {
    format!("{}{}", SEEN_KEY_PREFIX, filter.as_str())
}
