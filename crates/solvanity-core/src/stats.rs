//! Run state and live search statistics

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Progress never reads as complete until a match is in hand
pub const MAX_RUNNING_PROGRESS: f64 = 97.99;

/// Lifecycle of one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SearchState {
    Idle = 0,
    Running = 1,
    Succeeded = 2,
    Stopped = 3,
    Failed = 4,
}

impl SearchState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SearchState::Running,
            2 => SearchState::Succeeded,
            3 => SearchState::Stopped,
            4 => SearchState::Failed,
            _ => SearchState::Idle,
        }
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchState::Idle => "idle",
            SearchState::Running => "running",
            SearchState::Succeeded => "succeeded",
            SearchState::Stopped => "stopped",
            SearchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The flag shared between the search loop and whoever may cancel it
#[derive(Debug)]
pub struct RunState {
    state: AtomicU8,
}

impl RunState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self) -> SearchState {
        SearchState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.get() == SearchState::Running
    }

    /// Move a running search to `Stopped`. Returns false when nothing was running.
    pub fn stop(&self) -> bool {
        self.transition(SearchState::Running, SearchState::Stopped)
    }

    pub(crate) fn begin(&self) {
        self.state.store(SearchState::Running as u8, Ordering::Release);
    }

    pub(crate) fn finish(&self, state: SearchState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn transition(&self, from: SearchState, to: SearchState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(SearchState::Idle as u8),
        }
    }
}

/// Cloneable handle that cancels a search from any thread
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: Arc<RunState>,
}

impl StopHandle {
    pub(crate) fn new(state: Arc<RunState>) -> Self {
        Self { state }
    }

    /// Request cancellation; a no-op if no search is running
    pub fn stop(&self) {
        self.state.stop();
    }

    pub fn state(&self) -> SearchState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

/// Marks the run `Failed` if it unwinds while still `Running`
pub(crate) struct RunGuard<'a> {
    state: &'a RunState,
}

impl<'a> RunGuard<'a> {
    pub(crate) fn begin(state: &'a RunState) -> Self {
        state.begin();
        Self { state }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.transition(SearchState::Running, SearchState::Failed);
    }
}

/// Emitted once per completed batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub attempts: u64,
    pub elapsed_millis: u64,
    pub estimated_progress_percent: f64,
}

impl ProgressSnapshot {
    /// Attempts per second so far
    pub fn attempts_per_second(&self) -> f64 {
        if self.elapsed_millis > 0 {
            self.attempts as f64 * 1000.0 / self.elapsed_millis as f64
        } else {
            0.0
        }
    }

    /// One-line status for terminals
    pub fn format(&self) -> String {
        format!(
            "[{}/s][Total {}][Progress {:.2}%][{:.1}s]",
            format_attempts(self.attempts_per_second() as u64),
            format_attempts(self.attempts),
            self.estimated_progress_percent,
            self.elapsed_millis as f64 / 1000.0
        )
    }
}

/// `attempts / difficulty` as a percentage, capped below 100 while running
pub fn estimated_progress(attempts: u64, difficulty: f64) -> f64 {
    if difficulty <= 0.0 {
        return 0.0;
    }
    (attempts as f64 / difficulty * 100.0).clamp(0.0, MAX_RUNNING_PROGRESS)
}

pub fn format_attempts(attempts: u64) -> String {
    if attempts >= 1_000_000_000_000 {
        format!("{:.2}T", attempts as f64 / 1e12)
    } else if attempts >= 1_000_000_000 {
        format!("{:.2}G", attempts as f64 / 1e9)
    } else if attempts >= 1_000_000 {
        format!("{:.2}M", attempts as f64 / 1e6)
    } else if attempts >= 1000 {
        format!("{:.2}K", attempts as f64 / 1e3)
    } else {
        format!("{}", attempts)
    }
}
