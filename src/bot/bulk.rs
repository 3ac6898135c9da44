//! Bulk-send orchestration over one sequential browsing context.
//!
//! [`SendStats`] is a single-writer/multi-reader status record: the
//! batch task is the only writer, pollers take lock-free snapshots of
//! the counters at any time without ever blocking the run. Cancellation
//! is cooperative: clearing `running` stops the loop before the next
//! target, never mid-send.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::automation::error::Result;

/// Sending seam between the orchestrator and the browser-backed sender,
/// so batch semantics are testable without a browser.
#[async_trait]
pub trait TargetSender: Send + Sync {
    async fn send_to(&self, handle: &str, message: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendLogEntry {
    pub at: String,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendStatus {
    pub total: usize,
    pub sent: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub running: bool,
    pub recent_log: Vec<SendLogEntry>,
}

/// Live counters of the active (or last) batch.
/// Invariant: `succeeded + failed ≤ sent ≤ total`.
#[derive(Debug, Default)]
pub struct SendStats {
    total: AtomicUsize,
    sent: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    running: AtomicBool,
    log: Mutex<Vec<SendLogEntry>>,
}

const LOG_CAPACITY: usize = 200;

impl SendStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the record for a new batch: counters to zero, running set.
    pub fn begin(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.sent.store(0, Ordering::SeqCst);
        self.succeeded.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.log.lock().unwrap().clear();
        self.running.store(true, Ordering::SeqCst);
        self.push_log(format!("batch started: {} targets", total));
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cooperative cancellation: the loop observes this before the
    /// next target; nothing in flight is interrupted.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.push_log("finished");
    }

    fn record_attempt(&self, succeeded: bool) {
        self.sent.fetch_add(1, Ordering::SeqCst);
        if succeeded {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn push_log(&self, line: impl Into<String>) {
        let mut log = self.log.lock().unwrap();
        if log.len() >= LOG_CAPACITY {
            log.remove(0);
        }
        log.push(SendLogEntry {
            at: chrono::Utc::now().to_rfc3339(),
            line: line.into(),
        });
    }

    pub fn snapshot(&self) -> SendStatus {
        SendStatus {
            total: self.total.load(Ordering::SeqCst),
            sent: self.sent.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
            recent_log: self.log.lock().unwrap().clone(),
        }
    }
}

/// Drive one batch to completion. Assumes `stats.begin(targets.len())`
/// was called by the dispatcher (so pollers see the armed state before
/// the task is scheduled).
///
/// Per-target failures are counted, logged, and absorbed. One bad
/// target never stops the batch, and a driver-fatal error is recorded
/// like any other failure rather than restarting the context mid-run.
pub async fn run_batch<S>(sender: &S, targets: &[String], message: &str, stats: &SendStats)
where
    S: TargetSender + ?Sized,
{
    for handle in targets {
        if !stats.is_running() {
            stats.push_log("stopped by user");
            info!("batch stopped by user after {} targets", stats.snapshot().sent);
            break;
        }

        match sender.send_to(handle, message).await {
            Ok(()) => {
                stats.record_attempt(true);
                stats.push_log(format!("sent to {}", handle));
            }
            Err(e) => {
                stats.record_attempt(false);
                stats.push_log(format!("failed for {}: {}", handle, e));
                warn!("batch send to '{}' failed: {}", handle, e);
            }
        }
    }
    stats.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::error::BotError;

    struct AlwaysOk;

    #[async_trait]
    impl TargetSender for AlwaysOk {
        async fn send_to(&self, _handle: &str, _message: &str) -> Result<()> {
            Ok(())
        }
    }

    struct FailOn(usize, AtomicUsize);

    #[async_trait]
    impl TargetSender for FailOn {
        async fn send_to(&self, _handle: &str, _message: &str) -> Result<()> {
            let n = self.1.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.0 {
                Err(BotError::TargetNotFound {
                    query: "x".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn targets(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("@user{}", i)).collect()
    }

    #[tokio::test]
    async fn test_all_success_counts() {
        let stats = SendStats::new();
        let list = targets(5);
        stats.begin(list.len());
        run_batch(&AlwaysOk, &list, "hi", &stats).await;

        let s = stats.snapshot();
        assert_eq!(s.sent, 5);
        assert_eq!(s.succeeded, 5);
        assert_eq!(s.failed, 0);
        assert!(!s.running);
    }

    #[tokio::test]
    async fn test_single_failure_does_not_abort_batch() {
        let stats = SendStats::new();
        let list = targets(4);
        stats.begin(list.len());
        run_batch(&FailOn(2, AtomicUsize::new(0)), &list, "hi", &stats).await;

        let s = stats.snapshot();
        assert_eq!(s.sent, 4, "targets after the failure must still be attempted");
        assert_eq!(s.succeeded, 3);
        assert_eq!(s.failed, 1);
        assert!(!s.running);
    }

    /// A sender that stops the batch after k sends, emulating a user
    /// pressing stop mid-run.
    struct StopAfter<'a>(usize, AtomicUsize, &'a SendStats);

    #[async_trait]
    impl TargetSender for StopAfter<'_> {
        async fn send_to(&self, _handle: &str, _message: &str) -> Result<()> {
            let n = self.1.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.0 {
                self.2.request_stop();
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_cancellation_halts_before_next_target() {
        let stats = SendStats::new();
        let list = targets(10);
        stats.begin(list.len());
        let sender = StopAfter(3, AtomicUsize::new(0), &stats);
        run_batch(&sender, &list, "hi", &stats).await;

        let s = stats.snapshot();
        assert_eq!(s.sent, 3, "target k+1 must never be processed");
        assert_eq!(s.succeeded, 3);
        assert!(!s.running);
        assert!(s.recent_log.iter().any(|e| e.line == "stopped by user"));
        assert!(s.recent_log.iter().any(|e| e.line == "finished"));
    }

    #[tokio::test]
    async fn test_counter_invariant_holds() {
        let stats = SendStats::new();
        let list = targets(7);
        stats.begin(list.len());
        run_batch(&FailOn(4, AtomicUsize::new(0)), &list, "hi", &stats).await;

        let s = stats.snapshot();
        assert!(s.succeeded + s.failed <= s.sent);
        assert!(s.sent <= s.total);
    }
}
