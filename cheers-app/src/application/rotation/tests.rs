use super::*;
use crate::domain::{NewToast, TOP_TOAST_LIMIT};
use crate::infrastructure::local_store::DisabledBackend;
use crate::infrastructure::memory::InMemoryToastRepository;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory repository with call counters and failure switches.
#[derive(Default)]
struct ScriptedRepository {
    inner: InMemoryToastRepository,
    list_calls: AtomicUsize,
    random_calls: AtomicUsize,
    create_calls: AtomicUsize,
    vote_changes: Mutex<Vec<VoteChange>>,
    fail: AtomicBool,
    yield_on_pick: AtomicBool,
    lose_picks: AtomicBool,
}

impl ScriptedRepository {
    fn with_toasts(toasts: Vec<Toast>) -> Self {
        Self {
            inner: InMemoryToastRepository::with_toasts(toasts),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(AppError::Repository("connection reset".to_string()))
        } else {
            Ok(())
        }
    }

    fn random_calls(&self) -> usize {
        self.random_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToastRepository for ScriptedRepository {
    async fn list_toasts(&self) -> Result<Vec<Toast>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.list_toasts().await
    }

    async fn get_toast_by_id(&self, id: Uuid) -> Result<Option<Toast>, AppError> {
        self.check()?;
        self.inner.get_toast_by_id(id).await
    }

    async fn get_random_toast_from_ids(&self, ids: &[Uuid]) -> Result<Option<Toast>, AppError> {
        self.random_calls.fetch_add(1, Ordering::SeqCst);
        if self.yield_on_pick.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.check()?;
        if self.lose_picks.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get_random_toast_from_ids(ids).await
    }

    async fn create_toast(&self, new_toast: NewToast) -> Result<Toast, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.create_toast(new_toast).await
    }

    async fn update_vote(&self, change: VoteChange) -> Result<(), AppError> {
        self.vote_changes.lock().unwrap().push(change);
        self.check()?;
        self.inner.update_vote(change).await
    }
}

fn toast(text: &str, likes: u32, dislikes: u32) -> Toast {
    let mut toast = Toast::new(NewToast::parse(text, None).unwrap());
    toast.likes = likes;
    toast.dislikes = dislikes;
    toast.total_votes = likes + dislikes;
    toast
}

fn toasts(n: usize) -> Vec<Toast> {
    (0..n).map(|i| toast(&format!("Toast number {}", i), 0, 0)).collect()
}

async fn loaded_engine(toasts: Vec<Toast>) -> (RotationEngine, Arc<ScriptedRepository>) {
    let repo = Arc::new(ScriptedRepository::with_toasts(toasts));
    let engine = RotationEngine::new(repo.clone(), LocalVoteStore::in_memory());
    engine.load_toasts().await.unwrap();
    (engine, repo)
}

fn shown(selection: Selection) -> ToastWithUserVote {
    match selection {
        Selection::Shown(toast) => toast,
        other => panic!("expected a toast, got {:?}", other),
    }
}

#[tokio::test]
async fn test_load_moves_idle_to_ready() {
    let repo = Arc::new(ScriptedRepository::with_toasts(toasts(3)));
    let engine = RotationEngine::new(repo, LocalVoteStore::in_memory());
    assert_eq!(engine.snapshot().phase, Phase::Idle);

    engine.load_toasts().await.unwrap();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert_eq!(engine.toasts().len(), 3);
    assert!(snapshot.current.is_none());
}

#[tokio::test]
async fn test_next_marks_seen_and_pushes_history() {
    let (engine, _repo) = loaded_engine(toasts(3)).await;

    let first = shown(engine.next_toast().await.unwrap());
    assert_eq!(engine.current(), Some(first.clone()));
    assert_eq!(engine.history(), vec![first.clone()]);
    assert!(engine.store().get_seen_set(ToastFilter::All).contains(&first.id()));
    assert!(!engine.is_loading());
}

#[tokio::test]
async fn test_rotation_shows_every_candidate_once_then_resets() {
    let all = toasts(6);
    let expected: HashSet<Uuid> = all.iter().map(|t| t.id).collect();
    let (engine, _repo) = loaded_engine(all).await;

    let mut drawn = Vec::new();
    for _ in 0..6 {
        drawn.push(shown(engine.next_toast().await.unwrap()).id());
    }
    let unique: HashSet<Uuid> = drawn.iter().copied().collect();
    assert_eq!(unique, expected);
    assert_eq!(engine.store().get_seen_set(ToastFilter::All).len(), 6);
    assert!(engine.unseen_candidates(ToastFilter::All).is_empty());

    let after_reset = shown(engine.next_toast().await.unwrap());
    let seen = engine.store().get_seen_set(ToastFilter::All);
    assert_eq!(seen.len(), 1);
    assert!(seen.contains(&after_reset.id()));
    assert_eq!(engine.history().len(), 7);
}

#[tokio::test]
async fn test_concurrent_next_advances_once() {
    let (engine, repo) = loaded_engine(toasts(4)).await;
    repo.yield_on_pick.store(true, Ordering::SeqCst);

    let (a, b) = tokio::join!(engine.next_toast(), engine.next_toast());
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(outcomes.iter().filter(|s| matches!(s, Selection::Shown(_))).count(), 1);
    assert_eq!(outcomes.iter().filter(|s| **s == Selection::Busy).count(), 1);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.store().get_seen_set(ToastFilter::All).len(), 1);
    assert_eq!(repo.random_calls(), 1);

    shown(engine.next_toast().await.unwrap());
    assert_eq!(engine.history().len(), 2);
}

#[tokio::test]
async fn test_back_is_deterministic_and_local() {
    let (engine, repo) = loaded_engine(toasts(5)).await;
    let a = shown(engine.next_toast().await.unwrap());
    let b = shown(engine.next_toast().await.unwrap());
    let _c = shown(engine.next_toast().await.unwrap());
    let calls = repo.random_calls();

    assert_eq!(engine.previous_toast(), Some(b.clone()));
    assert_eq!(engine.current(), Some(b.clone()));
    assert_eq!(engine.history(), vec![a.clone(), b]);

    assert_eq!(engine.previous_toast(), Some(a.clone()));
    assert_eq!(engine.previous_toast(), None);
    assert_eq!(engine.current(), Some(a));
    assert!(!engine.snapshot().can_go_back);

    assert_eq!(repo.random_calls(), calls);
    assert_eq!(engine.store().get_seen_set(ToastFilter::All).len(), 3);
}

#[tokio::test]
async fn test_back_on_fresh_engine_is_noop() {
    let (engine, _repo) = loaded_engine(toasts(2)).await;
    assert_eq!(engine.previous_toast(), None);
    shown(engine.next_toast().await.unwrap());
    assert_eq!(engine.previous_toast(), None);
    assert!(engine.current().is_some());
}

#[tokio::test]
async fn test_vote_switch_arithmetic() {
    let (engine, repo) = loaded_engine(vec![toast("Prost!", 5, 2)]).await;
    let current = shown(engine.next_toast().await.unwrap());
    let id = current.id();
    assert_eq!(current.user_vote, None);

    engine.vote(id, Some(Vote::Like)).await.unwrap();
    let now = engine.current().unwrap();
    assert_eq!((now.toast.likes, now.toast.dislikes), (6, 2));
    assert_eq!(now.user_vote, Some(Vote::Like));

    engine.vote(id, Some(Vote::Dislike)).await.unwrap();
    let now = engine.current().unwrap();
    assert_eq!((now.toast.likes, now.toast.dislikes), (5, 3));

    engine.vote(id, None).await.unwrap();
    let now = engine.current().unwrap();
    assert_eq!((now.toast.likes, now.toast.dislikes), (5, 2));
    assert_eq!(now.user_vote, None);

    let stored = repo.get_toast_by_id(id).await.unwrap().unwrap();
    assert_eq!((stored.likes, stored.dislikes), (5, 2));

    let changes = repo.vote_changes.lock().unwrap().clone();
    assert_eq!(
        changes,
        vec![
            VoteChange::new(id, Some(Vote::Like), None),
            VoteChange::new(id, Some(Vote::Dislike), Some(Vote::Like)),
            VoteChange::new(id, None, Some(Vote::Dislike)),
        ]
    );
}

#[tokio::test]
async fn test_toggle_twice_nets_zero() {
    let (engine, repo) = loaded_engine(vec![toast("Cheers", 3, 0)]).await;
    let id = shown(engine.next_toast().await.unwrap()).id();

    let first = engine.toggle_vote(id, Vote::Like).await.unwrap();
    assert_eq!(first.vote, Some(Vote::Like));
    let second = engine.toggle_vote(id, Vote::Like).await.unwrap();
    assert_eq!(second.vote, None);

    assert_eq!(engine.current().unwrap().toast.likes, 3);
    assert_eq!(engine.store().get_vote(id), None);
    assert_eq!(repo.get_toast_by_id(id).await.unwrap().unwrap().likes, 3);
}

#[tokio::test]
async fn test_vote_leaves_navigation_alone() {
    let (engine, _repo) = loaded_engine(toasts(3)).await;
    let a = shown(engine.next_toast().await.unwrap());
    let b = shown(engine.next_toast().await.unwrap());

    engine.vote(a.id(), Some(Vote::Like)).await.unwrap();

    assert_eq!(engine.current().unwrap().id(), b.id());
    assert_eq!(engine.current().unwrap().toast.likes, 0);
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.store().get_seen_set(ToastFilter::All).len(), 2);

    let back = engine.previous_toast().unwrap();
    assert_eq!(back.id(), a.id());
    assert_eq!(back.toast.likes, 1);
    assert_eq!(back.user_vote, Some(Vote::Like));
}

#[tokio::test]
async fn test_failed_vote_keeps_optimistic_state_and_reports() {
    let (engine, repo) = loaded_engine(vec![toast("Salud", 1, 1)]).await;
    let id = shown(engine.next_toast().await.unwrap()).id();
    repo.fail.store(true, Ordering::SeqCst);

    let result = engine.vote(id, Some(Vote::Dislike)).await;
    assert!(matches!(result, Err(AppError::Repository(_))));
    assert_eq!(engine.current().unwrap().toast.dislikes, 2);
    assert_eq!(engine.store().get_vote(id), Some(Vote::Dislike));
    assert!(engine.snapshot().error.is_some());
}

#[tokio::test]
async fn test_filter_seen_sets_are_isolated() {
    let mut all = toasts(4);
    all[0].likes = 3;
    all[2].likes = 1;
    let (engine, _repo) = loaded_engine(all).await;

    for _ in 0..4 {
        shown(engine.next_toast().await.unwrap());
    }
    assert!(engine.unseen_candidates(ToastFilter::All).is_empty());
    assert_eq!(engine.unseen_candidates(ToastFilter::Top25).len(), 2);
    assert!(engine.store().get_seen_set(ToastFilter::Top25).is_empty());
}

#[tokio::test]
async fn test_empty_repository_never_picks() {
    let (engine, repo) = loaded_engine(Vec::new()).await;

    let selection = engine.next_toast().await.unwrap();
    assert_eq!(selection, Selection::Empty(EmptyReason::NoToasts));
    assert!(engine.current().is_none());
    assert_eq!(repo.random_calls(), 0);
    assert_eq!(repo.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.snapshot().empty, Some(EmptyReason::NoToasts));
}

#[tokio::test]
async fn test_liked_filter_empty_is_distinct() {
    let (engine, repo) = loaded_engine(toasts(3)).await;
    shown(engine.next_toast().await.unwrap());

    let selection = engine.set_filter(ToastFilter::Liked).await.unwrap();
    assert_eq!(selection, Selection::Empty(EmptyReason::NothingLiked));
    assert!(engine.current().is_none());
    assert!(engine.history().is_empty());
    assert_eq!(repo.random_calls(), 1);
}

#[tokio::test]
async fn test_liked_filter_draws_only_local_likes() {
    let all = toasts(5);
    let liked = all[3].id;
    let (engine, repo) = loaded_engine(all).await;
    engine.vote(liked, Some(Vote::Like)).await.unwrap();

    let lists_before = repo.list_calls.load(Ordering::SeqCst);
    let picked = shown(engine.set_filter(ToastFilter::Liked).await.unwrap());
    assert_eq!(picked.id(), liked);
    assert_eq!(picked.user_vote, Some(Vote::Like));
    assert_eq!(repo.list_calls.load(Ordering::SeqCst), lists_before + 1);

    // single candidate: rotation resets and repeats it
    let again = shown(engine.next_toast().await.unwrap());
    assert_eq!(again.id(), liked);
}

#[tokio::test]
async fn test_filter_change_resets_history() {
    let mut all = toasts(30);
    for (i, t) in all.iter_mut().enumerate() {
        t.likes = i as u32;
    }
    let (engine, _repo) = loaded_engine(all).await;
    shown(engine.next_toast().await.unwrap());
    shown(engine.next_toast().await.unwrap());

    let picked = shown(engine.set_filter(ToastFilter::Top25).await.unwrap());
    assert_eq!(engine.filter(), ToastFilter::Top25);
    assert_eq!(engine.history(), vec![picked.clone()]);
    assert!(picked.toast.likes >= 5);
    assert_eq!(engine.unseen_candidates(ToastFilter::Top25).len(), TOP_TOAST_LIMIT - 1);
}

#[tokio::test]
async fn test_fetch_failure_keeps_current_and_clears_loading() {
    let (engine, repo) = loaded_engine(toasts(3)).await;
    let current = shown(engine.next_toast().await.unwrap());

    repo.fail.store(true, Ordering::SeqCst);
    assert!(engine.next_toast().await.is_err());
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Error);
    assert_eq!(snapshot.current, Some(current.clone()));
    assert!(snapshot.error.is_some());
    assert_eq!(engine.history().len(), 1);

    assert!(engine.load_toasts().await.is_err());
    assert_eq!(engine.toasts().len(), 3);

    repo.fail.store(false, Ordering::SeqCst);
    shown(engine.next_toast().await.unwrap());
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn test_lost_pick_falls_back_to_cache() {
    let (engine, repo) = loaded_engine(toasts(2)).await;
    repo.lose_picks.store(true, Ordering::SeqCst);

    let picked = shown(engine.next_toast().await.unwrap());
    assert!(engine.toasts().iter().any(|t| t.id == picked.id()));
    assert_eq!(engine.history().len(), 1);
}

#[tokio::test]
async fn test_add_toast_validates_before_repository() {
    let (engine, repo) = loaded_engine(toasts(1)).await;

    let err = engine.add_toast("   ", None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidToast(_)));
    assert!(engine.add_toast(&"x".repeat(301), None).await.is_err());
    assert_eq!(repo.create_calls.load(Ordering::SeqCst), 0);
    assert!(engine.snapshot().error.is_none());

    let created = engine.add_toast(" Na zdrowie! ", Some("Kasia")).await.unwrap();
    assert_eq!(created.text, "Na zdrowie!");
    assert_eq!(created.created_by, "Kasia");
    assert_eq!((created.likes, created.dislikes), (0, 0));
    assert_eq!(engine.toasts()[0].id, created.id);
}

#[tokio::test]
async fn test_toast_with_user_vote_attaches_local_vote() {
    let all = toasts(2);
    let id = all[1].id;
    let (engine, _repo) = loaded_engine(all).await;
    engine.store().set_vote(id, Some(Vote::Dislike));

    let found = engine.toast_with_user_vote(id).await.unwrap().unwrap();
    assert_eq!(found.user_vote, Some(Vote::Dislike));
    assert!(engine.toast_with_user_vote(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unavailable_store_still_rotates() {
    let repo = Arc::new(ScriptedRepository::with_toasts(toasts(3)));
    let engine = RotationEngine::new(repo, LocalVoteStore::new(Arc::new(DisabledBackend)));
    engine.load_toasts().await.unwrap();

    let picked = shown(engine.next_toast().await.unwrap());
    engine.vote(picked.id(), Some(Vote::Like)).await.unwrap();
    assert_eq!(engine.current().unwrap().toast.likes, 1);
    assert_eq!(engine.store().get_vote(picked.id()), None);
    assert_eq!(engine.unseen_candidates(ToastFilter::All).len(), 3);
}

#[tokio::test]
async fn test_filter_change_waits_for_running_selection() {
    let (engine, repo) = loaded_engine(toasts(4)).await;
    repo.yield_on_pick.store(true, Ordering::SeqCst);

    let (first, switched) = tokio::join!(engine.next_toast(), engine.set_filter(ToastFilter::Liked));
    first.unwrap();
    assert_eq!(switched.unwrap(), Selection::Empty(EmptyReason::NothingLiked));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.filter, ToastFilter::Liked);
    assert!(snapshot.current.is_none());
    assert_eq!(snapshot.empty, Some(EmptyReason::NothingLiked));
    assert!(engine.history().is_empty());
    assert_eq!(snapshot.phase, Phase::Ready);
}

#[tokio::test]
async fn test_reload_during_selection_keeps_loading() {
    let (engine, repo) = loaded_engine(toasts(3)).await;
    repo.yield_on_pick.store(true, Ordering::SeqCst);

    let (picked, loading_after_reload) = tokio::join!(engine.next_toast(), async {
        engine.load_toasts().await.unwrap();
        engine.is_loading()
    });

    shown(picked.unwrap());
    assert!(loading_after_reload);
    assert!(!engine.is_loading());
    assert_eq!(engine.snapshot().phase, Phase::Ready);
}
