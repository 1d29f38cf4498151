//! Observable per-screen state driven by one asynchronous fetch.
//!
//! # Design
//! `StateHolder` owns a `watch` channel carrying `ViewState` snapshots and
//! the handle of the fetch task currently in flight. Starting a fetch is a
//! check-and-set on the channel: if a fetch is already loading, the new one
//! is ignored. Errors never escape the holder; they become the `error`
//! message of the snapshot while `data` keeps its previous value.
//!
//! The fetch task belongs to the holder: `cancel()` or dropping the holder
//! aborts it. Each launch takes a new generation number; a task only
//! publishes its outcome while its generation is still current, so a task
//! that finishes after being cancelled changes nothing.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Message shown when an error somehow renders as blank.
const UNKNOWN_ERROR: &str = "unknown error";

/// Data a screen can display. `is_empty` separates "loaded nothing" from
/// "loaded something".
pub trait ViewData: Clone + Default + Send + Sync + 'static {
    fn is_empty(&self) -> bool;
}

impl<T: Clone + Send + Sync + 'static> ViewData for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<T: Clone + Send + Sync + 'static> ViewData for Option<T> {
    fn is_empty(&self) -> bool {
        self.is_none()
    }
}

/// Coarse screen phase derived from the snapshot flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet.
    Idle,
    Loading,
    /// Last fetch succeeded with data.
    Loaded,
    /// Last fetch succeeded with nothing to show.
    Empty,
    Error,
}

/// One snapshot of a screen's state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState<T> {
    pub data: T,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Set once any fetch has succeeded.
    pub loaded: bool,
}

impl<T: ViewData> ViewState<T> {
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if !self.loaded {
            Phase::Idle
        } else if self.data.is_empty() {
            Phase::Empty
        } else {
            Phase::Loaded
        }
    }
}

pub struct StateHolder<T> {
    state: Arc<watch::Sender<ViewState<T>>>,
    generation: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: ViewData> Default for StateHolder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ViewData> StateHolder<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> ViewState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<T>> {
        self.state.subscribe()
    }

    /// Enter Loading and run `fetch` on the current tokio runtime.
    ///
    /// Returns `false` without polling `fetch` when a fetch is already in
    /// flight. Must be called from within a runtime.
    pub fn launch<F>(&self, fetch: F) -> bool
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut launched = None;
        self.state.send_if_modified(|state| {
            if state.is_loading {
                return false;
            }
            state.is_loading = true;
            state.error = None;
            launched = Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
            true
        });
        let Some(mine) = launched else {
            debug!("fetch already in flight, ignoring launch");
            return false;
        };

        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);
        let handle = tokio::spawn(async move {
            let outcome = fetch.await;
            state.send_if_modified(|state| {
                if generation.load(Ordering::SeqCst) != mine {
                    debug!(generation = mine, "dropping outcome of a cancelled fetch");
                    return false;
                }
                state.is_loading = false;
                match outcome {
                    Ok(data) => {
                        state.data = data;
                        state.error = None;
                        state.loaded = true;
                    }
                    Err(err) => {
                        warn!(error = %err, "fetch failed");
                        state.error = Some(error_message(&err));
                    }
                }
                true
            });
        });
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        true
    }

    /// Abort the fetch in flight, if any, and leave Loading.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
        let cancelled = self.state.send_if_modified(|state| {
            if !state.is_loading {
                return false;
            }
            state.is_loading = false;
            true
        });
        if cancelled {
            debug!("fetch cancelled");
        }
    }

    /// Wait until no fetch is loading and return that snapshot.
    pub async fn settled(&self) -> ViewState<T> {
        let mut receiver = self.subscribe();
        let settled = match receiver.wait_for(|state| !state.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }
}

impl<T> Drop for StateHolder<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}

fn error_message(err: &ApiError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn starts_idle() {
        let holder: StateHolder<Vec<u32>> = StateHolder::new();
        let state = holder.snapshot();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.data.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn success_replaces_data() {
        let holder = StateHolder::new();
        assert!(holder.launch(async { Ok(vec![1, 2, 3]) }));
        let state = holder.settled().await;
        assert_eq!(state.data, vec![1, 2, 3]);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(state.phase(), Phase::Loaded);
    }

    #[tokio::test]
    async fn failure_keeps_previous_data() {
        let holder = StateHolder::new();
        holder.launch(async { Ok(vec!["a".to_string()]) });
        holder.settled().await;

        holder.launch(async { Err(ApiError::Transport("connection refused".to_string())) });
        let state = holder.settled().await;
        assert_eq!(state.data, vec!["a".to_string()]);
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("network error: connection refused"));
        assert_eq!(state.phase(), Phase::Error);
    }

    #[tokio::test]
    async fn first_failure_leaves_data_empty() {
        let holder: StateHolder<Vec<u32>> = StateHolder::new();
        holder.launch(async { Err(ApiError::NotFound(String::new())) });
        let state = holder.settled().await;
        assert!(state.data.is_empty());
        assert!(!state.error.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_is_distinct_from_error_and_loading() {
        let holder: StateHolder<Vec<u32>> = StateHolder::new();
        holder.launch(async { Ok(Vec::new()) });
        let state = holder.settled().await;
        assert_eq!(state.phase(), Phase::Empty);
        assert_ne!(state.phase(), Phase::Error);
        assert_ne!(state.phase(), Phase::Loading);
    }

    #[tokio::test]
    async fn retry_clears_error_before_result() {
        let holder: StateHolder<Vec<i32>> = StateHolder::new();
        holder.launch(async { Err(ApiError::Transport("down".to_string())) });
        assert_eq!(holder.settled().await.phase(), Phase::Error);

        let (release, gate) = oneshot::channel::<()>();
        assert!(holder.launch(async move {
            let _ = gate.await;
            Ok(vec![7])
        }));
        let pending = holder.snapshot();
        assert!(pending.is_loading);
        assert!(pending.error.is_none());
        assert_eq!(pending.phase(), Phase::Loading);

        release.send(()).unwrap();
        let state = holder.settled().await;
        assert_eq!(state.data, vec![7]);
        assert_eq!(state.phase(), Phase::Loaded);
    }

    #[tokio::test]
    async fn second_launch_while_loading_is_ignored() {
        let holder = StateHolder::new();
        let (release, gate) = oneshot::channel::<()>();
        assert!(holder.launch(async move {
            let _ = gate.await;
            Ok(vec![1])
        }));

        let polled = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&polled);
        assert!(!holder.launch(async move {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(vec![2])
        }));

        release.send(()).unwrap();
        let state = holder.settled().await;
        assert_eq!(state.data, vec![1]);
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancel_leaves_loading() {
        let holder: StateHolder<Vec<u32>> = StateHolder::new();
        holder.launch(std::future::pending());
        assert!(holder.snapshot().is_loading);

        holder.cancel();
        let state = holder.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.phase(), Phase::Idle);

        assert!(holder.launch(async { Ok(vec![4]) }));
        assert_eq!(holder.settled().await.data, vec![4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_fetch_cannot_overwrite_its_replacement() {
        let holder: StateHolder<Vec<u32>> = StateHolder::new();
        // Completes in a single poll that outlasts the cancel below.
        assert!(holder.launch(async {
            std::thread::sleep(Duration::from_millis(300));
            Ok(vec![1])
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;

        holder.cancel();
        assert!(holder.launch(std::future::pending()));
        tokio::time::sleep(Duration::from_millis(500)).await;

        let state = holder.snapshot();
        assert!(state.is_loading, "replacement fetch is still in flight");
        assert!(state.data.is_empty());
        assert!(!state.loaded);
        assert!(!holder.launch(async { Ok(vec![3]) }));
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let holder = StateHolder::new();
        let mut receiver = holder.subscribe();
        let (release, gate) = oneshot::channel::<()>();
        holder.launch(async move {
            let _ = gate.await;
            Ok(Some(5u8))
        });

        receiver.changed().await.unwrap();
        assert!(receiver.borrow_and_update().is_loading);

        release.send(()).unwrap();
        receiver.changed().await.unwrap();
        let state = receiver.borrow_and_update().clone();
        assert_eq!(state.data, Some(5));
        assert_eq!(state.phase(), Phase::Loaded);
    }
}
