use crate::domain::{
    EmptyReason, NewToast, Toast, ToastFilter, ToastWithUserVote, Vote, VoteChange,
};
use crate::infrastructure::local_store::LocalVoteStore;
use crate::port::ToastRepository;
use cheers_errors::AppError;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Outcome of a request for the next toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Shown(ToastWithUserVote),
    Empty(EmptyReason),
    /// Another selection was still running; this request was dropped.
    Busy,
}

/// Read-only view of the engine for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationSnapshot {
    pub phase: Phase,
    pub filter: ToastFilter,
    pub current: Option<ToastWithUserVote>,
    pub history_len: usize,
    pub can_go_back: bool,
    pub error: Option<String>,
    pub empty: Option<EmptyReason>,
}

struct RotationState {
    phase: Phase,
    toasts: Vec<Toast>,
    current: Option<ToastWithUserVote>,
    filter: ToastFilter,
    history: Vec<ToastWithUserVote>,
    error: Option<String>,
    empty: Option<EmptyReason>,
    /// Loads and selections currently holding the phase on `Loading`.
    in_flight: usize,
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            toasts: Vec::new(),
            current: None,
            filter: ToastFilter::default(),
            history: Vec::new(),
            error: None,
            empty: None,
            in_flight: 0,
        }
    }
}

/// Picks which toast to show next.
///
/// Each filter rotates through its candidates without repeats until every
/// candidate has been shown, then its seen set is reset. A toast counts as
/// seen as soon as it becomes the current toast. Shown toasts are pushed onto
/// a history stack so the user can step back without another fetch.
///
/// The state lock never spans an await point. Selections are serialized by
/// an async latch: a `next_toast` call that arrives while another is in
/// flight returns [`Selection::Busy`] instead of queueing, while
/// `set_filter` waits for the running selection before switching pools.
pub struct RotationEngine {
    repository: Arc<dyn ToastRepository>,
    store: LocalVoteStore,
    state: Mutex<RotationState>,
    selecting: tokio::sync::Mutex<()>,
}

impl RotationEngine {
    pub fn new(repository: Arc<dyn ToastRepository>, store: LocalVoteStore) -> Self {
        Self {
            repository,
            store,
            state: Mutex::new(RotationState::default()),
            selecting: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &LocalVoteStore {
        &self.store
    }

    pub fn snapshot(&self) -> RotationSnapshot {
        let st = self.state();
        RotationSnapshot {
            phase: st.phase,
            filter: st.filter,
            current: st.current.clone(),
            history_len: st.history.len(),
            can_go_back: st.history.len() > 1,
            error: st.error.clone(),
            empty: st.empty,
        }
    }

    pub fn current(&self) -> Option<ToastWithUserVote> {
        self.state().current.clone()
    }

    pub fn filter(&self) -> ToastFilter {
        self.state().filter
    }

    pub fn history(&self) -> Vec<ToastWithUserVote> {
        self.state().history.clone()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.state().toasts.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().phase == Phase::Loading
    }

    /// Fetches the full collection into the cache. A failure keeps the
    /// previous cache and current toast.
    pub async fn load_toasts(&self) -> Result<(), AppError> {
        let _loading = self.begin_loading();

        match self.repository.list_toasts().await {
            Ok(toasts) => {
                tracing::info!("Loaded {} toasts", toasts.len());
                self.state().toasts = toasts;
                Ok(())
            }
            Err(e) => {
                self.fail("load toasts", &e);
                Err(e)
            }
        }
    }

    /// Draws the next toast for the active filter.
    pub async fn next_toast(&self) -> Result<Selection, AppError> {
        let Ok(_selecting) = self.selecting.try_lock() else {
            tracing::debug!("Selection already in flight, dropping request");
            return Ok(Selection::Busy);
        };
        self.select_next().await
    }

    /// Steps back to the previously shown toast. No-op with one entry or less.
    pub fn previous_toast(&self) -> Option<ToastWithUserVote> {
        let mut st = self.state();
        if st.history.len() <= 1 {
            return None;
        }
        st.history.pop();
        let previous = st.history.last().cloned();
        st.current = previous.clone();
        st.empty = None;
        previous
    }

    /// Switches filter, drops the history and draws from the new pool.
    /// `Liked` and `Top25` depend on counts and votes that may have moved
    /// since the last load, so they refresh the cache first.
    ///
    /// A selection already in flight for the old filter finishes first, so its
    /// result never lands in the new history.
    pub async fn set_filter(&self, filter: ToastFilter) -> Result<Selection, AppError> {
        let _selecting = self.selecting.lock().await;
        {
            let mut st = self.state();
            st.filter = filter;
            st.history.clear();
        }
        tracing::info!("Filter changed to {}", filter);

        if matches!(filter, ToastFilter::Liked | ToastFilter::Top25) {
            self.load_toasts().await?;
        }
        self.select_next().await
    }

    /// Records `vote` (or clears it with `None`) for this device and sends the
    /// counter delta to the repository. The displayed counts move before the
    /// repository call completes; they are reconciled on the next full load.
    pub async fn vote(&self, toast_id: Uuid, vote: Option<Vote>) -> Result<VoteChange, AppError> {
        let previous = self.store.get_vote(toast_id);
        self.store.set_vote(toast_id, vote);

        let change = VoteChange::new(toast_id, vote, previous);
        self.apply_locally(change);
        tracing::debug!(
            "Vote on {}: {:?} -> {:?}",
            toast_id,
            change.previous_vote,
            change.vote
        );

        if let Err(e) = self.repository.update_vote(change).await {
            tracing::warn!("Failed to update vote on {}: {}", toast_id, e);
            self.state().error = Some(e.user_message().to_string());
            return Err(e);
        }
        Ok(change)
    }

    /// Button semantics: pressing the active vote again clears it.
    pub async fn toggle_vote(&self, toast_id: Uuid, pressed: Vote) -> Result<VoteChange, AppError> {
        let next = Vote::toggled(self.store.get_vote(toast_id), pressed);
        self.vote(toast_id, next).await
    }

    /// Validates and creates a toast. Invalid input never reaches the
    /// repository.
    pub async fn add_toast(&self, text: &str, created_by: Option<&str>) -> Result<Toast, AppError> {
        let new_toast = NewToast::parse(text, created_by)?;

        match self.repository.create_toast(new_toast).await {
            Ok(toast) => {
                self.state().toasts.insert(0, toast.clone());
                Ok(toast)
            }
            Err(e) => {
                tracing::warn!("Failed to create toast: {}", e);
                self.state().error = Some(e.user_message().to_string());
                Err(e)
            }
        }
    }

    pub async fn toast_with_user_vote(&self, toast_id: Uuid) -> Result<Option<ToastWithUserVote>, AppError> {
        let toast = self.repository.get_toast_by_id(toast_id).await?;
        Ok(toast.map(|t| {
            let vote = self.store.get_vote(t.id);
            t.with_user_vote(vote)
        }))
    }

    /// Candidates of `filter` not yet shown in the current rotation.
    pub fn unseen_candidates(&self, filter: ToastFilter) -> Vec<Uuid> {
        let toasts = self.toasts();
        let candidates = filter.candidates(&toasts, &self.store.get_all_votes());
        let seen = self.store.get_seen_set(filter);
        candidates.into_iter().filter(|id| !seen.contains(id)).collect()
    }

    /// Caller holds the selection latch.
    async fn select_next(&self) -> Result<Selection, AppError> {
        let _loading = self.begin_loading();
        let (filter, toasts) = {
            let st = self.state();
            (st.filter, st.toasts.clone())
        };
        self.select(filter, &toasts).await
    }

    async fn select(&self, filter: ToastFilter, toasts: &[Toast]) -> Result<Selection, AppError> {
        let candidates = filter.candidates(toasts, &self.store.get_all_votes());

        if candidates.is_empty() {
            let reason = filter.empty_reason();
            tracing::debug!("Nothing to show for {}", filter);
            let mut st = self.state();
            st.current = None;
            st.empty = Some(reason);
            return Ok(Selection::Empty(reason));
        }

        let pool = self.unseen_or_reset(filter, &candidates);

        let picked = match self.repository.get_random_toast_from_ids(&pool).await {
            Ok(Some(toast)) => toast,
            Ok(None) => match pick_from_cache(&pool, toasts) {
                Some(toast) => toast,
                None => {
                    let reason = filter.empty_reason();
                    let mut st = self.state();
                    st.current = None;
                    st.empty = Some(reason);
                    return Ok(Selection::Empty(reason));
                }
            },
            Err(e) => {
                self.fail("load next toast", &e);
                return Err(e);
            }
        };

        self.store.add_seen(filter, picked.id);
        let user_vote = self.store.get_vote(picked.id);
        let shown = picked.with_user_vote(user_vote);
        tracing::debug!("Showing toast {} for {}", shown.id(), filter);

        let mut st = self.state();
        if let Some(cached) = st.toasts.iter_mut().find(|t| t.id == shown.id()) {
            *cached = shown.toast.clone();
        }
        st.current = Some(shown.clone());
        st.history.push(shown.clone());
        st.empty = None;
        Ok(Selection::Shown(shown))
    }

    fn unseen_or_reset(&self, filter: ToastFilter, candidates: &[Uuid]) -> Vec<Uuid> {
        let seen = self.store.get_seen_set(filter);
        let unseen: Vec<Uuid> = candidates
            .iter()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();

        if !unseen.is_empty() {
            return unseen;
        }

        tracing::info!(
            "All {} toasts for {} shown, starting a new rotation",
            candidates.len(),
            filter
        );
        self.store.clear_seen(filter);
        candidates.to_vec()
    }

    fn apply_locally(&self, change: VoteChange) {
        let delta = change.delta();
        let mut st = self.state();

        if let Some(cached) = st.toasts.iter_mut().find(|t| t.id == change.toast_id) {
            cached.apply_delta(delta);
        }
        for entry in st.history.iter_mut().filter(|e| e.id() == change.toast_id) {
            entry.toast.apply_delta(delta);
            entry.user_vote = change.vote;
        }
        if let Some(current) = st.current.as_mut().filter(|c| c.id() == change.toast_id) {
            current.toast.apply_delta(delta);
            current.user_vote = change.vote;
        }
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        let mut st = self.state();
        st.in_flight += 1;
        st.phase = Phase::Loading;
        st.error = None;
        LoadingGuard { engine: self }
    }

    fn fail(&self, action: &str, err: &AppError) {
        tracing::warn!("Failed to {}: {}", action, err);
        let mut st = self.state();
        st.phase = Phase::Error;
        st.error = Some(err.user_message().to_string());
    }

    fn state(&self) -> MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Moves the phase from `Loading` to `Ready` once the last load or selection
/// in flight finishes, including when its future is dropped mid-flight.
struct LoadingGuard<'a> {
    engine: &'a RotationEngine,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut st = self.engine.state();
        st.in_flight = st.in_flight.saturating_sub(1);
        if st.in_flight == 0 && st.phase == Phase::Loading {
            st.phase = Phase::Ready;
        }
    }
}

fn pick_from_cache(pool: &[Uuid], toasts: &[Toast]) -> Option<Toast> {
    let id = {
        let mut rng = rand::thread_rng();
        *pool.choose(&mut rng)?
    };
    toasts.iter().find(|t| t.id == id).cloned()
}
