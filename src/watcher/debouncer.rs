//! Per-path debouncing of relevant filesystem events.
//!
//! Each path with a pending change owns one timer task. A new event for the
//! same path aborts the old timer, records the latest [`ChangeKind`] and
//! restarts the quiet window. When the window elapses without another event
//! the timer removes itself from the pending set and emits exactly once.
//!
//! Timer tasks and callers share one mutex, held across the emit callback.
//! A timer that wakes up after it has been superseded or cancelled finds its
//! generation missing from the pending set and exits without emitting. The
//! callback must not call back into the debouncer.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::error::WatcherError;
use super::event::ChangeKind;

/// Quiet period after the last event on a path before it is emitted.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Callback invoked once per debounced path, under the debouncer's lock.
pub type EmitFn = Arc<dyn Fn(&Path, ChangeKind) + Send + Sync>;

/// A scheduled emission for one path.
struct PendingTimer {
    generation: u64,
    kind: ChangeKind,
    deadline: Instant,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct PendingState {
    timers: HashMap<PathBuf, PendingTimer>,
    next_generation: u64,
    closed: bool,
}

/// Coalesces bursts of events per path into a single emission.
pub struct Debouncer {
    window: Duration,
    state: Arc<Mutex<PendingState>>,
    emit: EmitFn,
    runtime: Handle,
}

impl Debouncer {
    /// Create a debouncer whose timers run on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::NoRuntime`] when called outside a tokio runtime.
    pub fn new(window: Duration, emit: EmitFn) -> Result<Self, WatcherError> {
        let runtime = Handle::try_current().map_err(|_| WatcherError::NoRuntime)?;
        Ok(Self::with_runtime(window, emit, runtime))
    }

    /// Create a debouncer whose timers run on the given runtime.
    #[must_use]
    pub fn with_runtime(window: Duration, emit: EmitFn, runtime: Handle) -> Self {
        Self {
            window,
            state: Arc::new(Mutex::new(PendingState::default())),
            emit,
            runtime,
        }
    }

    /// Schedule an emission for `path`, replacing any pending one.
    ///
    /// Safe to call from any thread, including notify's event thread.
    /// Ignored after [`Debouncer::close`].
    pub fn schedule(&self, path: PathBuf, kind: ChangeKind) {
        let mut state = lock(&self.state);
        if state.closed {
            return;
        }

        if let Some(previous) = state.timers.remove(&path) {
            previous.task.abort();
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let deadline = Instant::now() + self.window;

        let task = self.runtime.spawn(fire_after(
            Arc::clone(&self.state),
            Arc::clone(&self.emit),
            path.clone(),
            generation,
            deadline,
        ));

        state.timers.insert(
            path,
            PendingTimer {
                generation,
                kind,
                deadline,
                task,
            },
        );
    }

    /// Cancel every pending timer without emitting.
    ///
    /// Idempotent. Returns the number of timers cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut state = lock(&self.state);
        cancel_pending(&mut state)
    }

    /// Cancel every pending timer and reject all future events.
    ///
    /// Returns the number of timers cancelled.
    pub fn close(&self) -> usize {
        let mut state = lock(&self.state);
        state.closed = true;
        cancel_pending(&mut state)
    }

    /// Number of paths with a pending emission.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.state).timers.len()
    }

    /// The kind that will be emitted for `path`, if one is pending.
    #[must_use]
    pub fn pending_kind(&self, path: &Path) -> Option<ChangeKind> {
        lock(&self.state).timers.get(path).map(|timer| timer.kind)
    }

    /// When the pending emission for `path` is due.
    #[must_use]
    pub fn pending_deadline(&self, path: &Path) -> Option<Instant> {
        lock(&self.state).timers.get(path).map(|timer| timer.deadline)
    }

    /// Whether [`Debouncer::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Configured quiet period.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

fn lock(state: &Mutex<PendingState>) -> MutexGuard<'_, PendingState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn cancel_pending(state: &mut PendingState) -> usize {
    let cancelled = state.timers.len();
    for (_, timer) in state.timers.drain() {
        timer.task.abort();
    }
    cancelled
}

async fn fire_after(
    state: Arc<Mutex<PendingState>>,
    emit: EmitFn,
    path: PathBuf,
    generation: u64,
    deadline: Instant,
) {
    tokio::time::sleep_until(deadline).await;

    // Only the timer that still owns the slot may emit. The lock is held
    // across the callback so cancel_all and close never return mid-emission.
    let mut state = lock(&state);
    let kind = match state.timers.get(&path) {
        Some(timer) if timer.generation == generation => {
            state.timers.remove(&path).map(|timer| timer.kind)
        }
        _ => None,
    };

    if let Some(kind) = kind {
        if panic::catch_unwind(AssertUnwindSafe(|| emit(&path, kind))).is_err() {
            tracing::error!(
                path = %path.display(),
                event = %kind,
                "Change callback panicked"
            );
        }
    }
    drop(state);
}
