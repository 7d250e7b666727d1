//! Hooks the search loop calls between batches

use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::stats::ProgressSnapshot;

/// Where the loop is suspending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldPoint {
    /// After a batch is generated, before it is scanned
    Batch,
    /// After a progress report, before the next batch
    Idle,
}

/// Cooperative suspension between batches
pub trait Yield: Send {
    fn pause(&mut self, point: YieldPoint);
}

impl<F> Yield for F
where
    F: FnMut(YieldPoint) + Send,
{
    fn pause(&mut self, point: YieldPoint) {
        self(point)
    }
}

/// Yield for a native thread: hand the core back to the OS scheduler, and
/// optionally sleep a little after each progress report
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadYield {
    pub idle_pause: Duration,
}

impl ThreadYield {
    pub fn new(idle_pause: Duration) -> Self {
        Self { idle_pause }
    }
}

impl Yield for ThreadYield {
    fn pause(&mut self, point: YieldPoint) {
        match point {
            YieldPoint::Idle if !self.idle_pause.is_zero() => thread::sleep(self.idle_pause),
            _ => thread::yield_now(),
        }
    }
}

/// Receives a snapshot after every batch that did not match.
///
/// Called synchronously on the search thread, so it should return quickly.
/// A panic here aborts the run and propagates to the caller of `start`.
pub trait ProgressObserver {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressSnapshot),
{
    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        self(snapshot)
    }
}

/// Observer that ignores every snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _snapshot: &ProgressSnapshot) {}
}

/// Forwards snapshots to another thread; drops them if the channel is full
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: Sender<ProgressSnapshot>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<ProgressSnapshot>) -> Self {
        Self { sender }
    }
}

impl ProgressObserver for ChannelProgress {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        let _ = self.sender.try_send(*snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn snapshot(attempts: u64) -> ProgressSnapshot {
        ProgressSnapshot {
            attempts,
            elapsed_millis: 1,
            estimated_progress_percent: 0.0,
        }
    }

    #[test]
    fn test_closure_yield_sees_points() {
        let mut seen = Vec::new();
        {
            let mut hook = |point: YieldPoint| seen.push(point);
            hook.pause(YieldPoint::Batch);
            hook.pause(YieldPoint::Idle);
        }
        assert_eq!(seen, vec![YieldPoint::Batch, YieldPoint::Idle]);
    }

    #[test]
    fn test_channel_observer_never_blocks() {
        let (tx, rx) = bounded(1);
        let mut observer = ChannelProgress::new(tx);
        observer.on_progress(&snapshot(1));
        observer.on_progress(&snapshot(2));
        assert_eq!(rx.try_recv().unwrap().attempts, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_thread_yield_returns() {
        let mut hook = ThreadYield::new(Duration::from_millis(1));
        hook.pause(YieldPoint::Batch);
        hook.pause(YieldPoint::Idle);
    }
}
