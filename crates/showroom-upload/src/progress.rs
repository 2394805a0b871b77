//! Progress observation for compression and upload.
//!
//! Callers either implement [`ProgressListener`], pass a closure, or subscribe to
//! a `tokio::sync::watch` channel of [`ProgressCounters`] snapshots.

use std::sync::Mutex;

use showroom_core::models::ProgressCounters;
use showroom_processing::CompressionProgress;
use tokio::sync::watch;

/// Observer of a submission's progress
pub trait ProgressListener: Send + Sync {
    /// Called once per settled upload task with the new counter snapshot
    fn on_upload_progress(&self, counters: &ProgressCounters);

    /// Called once per compressed photo, in completion order
    fn on_compression_progress(&self, _progress: &CompressionProgress) {}
}

impl<F> ProgressListener for F
where
    F: Fn(&ProgressCounters) + Send + Sync,
{
    fn on_upload_progress(&self, counters: &ProgressCounters) {
        self(counters)
    }
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ProgressListener for NoopListener {
    fn on_upload_progress(&self, _counters: &ProgressCounters) {}
}

/// Listener publishing snapshots into a watch channel
#[derive(Debug)]
pub struct WatchListener {
    tx: watch::Sender<ProgressCounters>,
}

impl ProgressListener for WatchListener {
    fn on_upload_progress(&self, counters: &ProgressCounters) {
        self.tx.send_replace(*counters);
    }
}

/// Create a watch-backed listener seeded with an empty snapshot for `total` files.
pub fn progress_channel(total: usize) -> (WatchListener, watch::Receiver<ProgressCounters>) {
    let (tx, rx) = watch::channel(ProgressCounters::new(total));
    (WatchListener { tx }, rx)
}

/// Shared counters of one upload run.
///
/// Tasks mark themselves started from inside the pool; settlement happens only in
/// the orchestrator's completion loop. Both go through the same lock so every
/// snapshot satisfies `success + failed == completed`.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    counters: Mutex<ProgressCounters>,
}

impl ProgressTracker {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            counters: Mutex::new(ProgressCounters::new(total)),
        }
    }

    fn update(&self, f: impl FnOnce(&mut ProgressCounters)) -> ProgressCounters {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut counters);
        *counters
    }

    pub(crate) fn started(&self) -> ProgressCounters {
        self.update(|c| c.in_flight += 1)
    }

    pub(crate) fn settled(&self, success: bool) -> ProgressCounters {
        self.update(|c| {
            c.in_flight = c.in_flight.saturating_sub(1);
            c.completed += 1;
            if success {
                c.success += 1;
            } else {
                c.failed += 1;
            }
        })
    }

    /// Drop all in-flight work from the counters after cancellation
    pub(crate) fn abandon_in_flight(&self) -> ProgressCounters {
        self.update(|c| c.in_flight = 0)
    }

    pub(crate) fn snapshot(&self) -> ProgressCounters {
        self.update(|_| {})
    }
}
