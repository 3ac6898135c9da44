//! Batch pipeline tests: orchestrator semantics against a scripted
//! sender, live status polling during a run, and the report trail.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use peyk::automation::BotError;
use peyk::bot::{run_batch, SendStats, TargetSender};
use peyk::storage::{DataStore, SendReport};

// Initialize logging for tests
fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

/// Sender that sleeps per target and fails on the given 1-based indices.
struct ScriptedSender {
    delay: Duration,
    fail_on: Vec<usize>,
    calls: AtomicUsize,
}

#[async_trait]
impl TargetSender for ScriptedSender {
    async fn send_to(&self, _handle: &str, _message: &str) -> Result<(), BotError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.fail_on.contains(&n) {
            Err(BotError::TargetNotFound {
                query: format!("target{}", n),
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
async fn test_status_is_pollable_while_batch_runs() {
    init_logger();

    let stats = Arc::new(SendStats::new());
    let sender = Arc::new(ScriptedSender {
        delay: Duration::from_millis(20),
        fail_on: vec![],
        calls: AtomicUsize::new(0),
    });
    let list = targets(8);
    stats.begin(list.len());

    let run_stats = stats.clone();
    let run_sender = sender.clone();
    let run = tokio::spawn(async move {
        run_batch(run_sender.as_ref(), &list, "hello", &run_stats).await;
    });

    // Poll concurrently: counters must be readable mid-run, monotonic,
    // and always satisfy succeeded + failed ≤ sent ≤ total.
    let mut last_sent = 0;
    while !run.is_finished() {
        let s = stats.snapshot();
        assert!(s.sent >= last_sent);
        assert!(s.succeeded + s.failed <= s.sent);
        assert!(s.sent <= s.total);
        last_sent = s.sent;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    run.await.unwrap();

    let s = stats.snapshot();
    assert_eq!(s.sent, 8);
    assert_eq!(s.succeeded, 8);
    assert_eq!(s.failed, 0);
    assert!(!s.running);
}

#[tokio::test]
async fn test_mixed_failures_complete_with_full_counts() {
    init_logger();

    let stats = SendStats::new();
    let sender = ScriptedSender {
        delay: Duration::from_millis(1),
        fail_on: vec![2, 5],
        calls: AtomicUsize::new(0),
    };
    let list = targets(6);
    stats.begin(list.len());
    run_batch(&sender, &list, "hello", &stats).await;

    let s = stats.snapshot();
    assert_eq!(s.sent, 6);
    assert_eq!(s.succeeded, 4);
    assert_eq!(s.failed, 2);
    assert!(!s.running);
    assert!(s.recent_log.iter().any(|e| e.line == "finished"));
}

#[tokio::test]
async fn test_stop_mid_run_halts_promptly() {
    init_logger();

    let stats = Arc::new(SendStats::new());
    let sender = Arc::new(ScriptedSender {
        delay: Duration::from_millis(30),
        fail_on: vec![],
        calls: AtomicUsize::new(0),
    });
    let list = targets(50);
    stats.begin(list.len());

    let run_stats = stats.clone();
    let run_sender = sender.clone();
    let run = tokio::spawn(async move {
        run_batch(run_sender.as_ref(), &list, "hello", &run_stats).await;
    });

    // Let a few targets through, then ask for a stop.
    tokio::time::sleep(Duration::from_millis(100)).await;
    stats.request_stop();
    run.await.unwrap();

    let s = stats.snapshot();
    assert!(s.sent < 50, "run must not have processed the whole list");
    assert!(!s.running);
    assert!(s.recent_log.iter().any(|e| e.line == "stopped by user"));
}

#[tokio::test]
async fn test_report_trail_records_partial_runs() {
    init_logger();

    let tmp = tempfile::tempdir().unwrap();
    let store = DataStore::new(tmp.path());

    let stats = SendStats::new();
    let sender = ScriptedSender {
        delay: Duration::from_millis(1),
        fail_on: vec![1],
        calls: AtomicUsize::new(0),
    };
    let list = targets(3);
    stats.begin(list.len());
    run_batch(&sender, &list, "hello", &stats).await;

    let s = stats.snapshot();
    store.append_report(SendReport {
        bot_id: "test-bot".into(),
        started_at: "t0".into(),
        finished_at: "t1".into(),
        total: s.total,
        succeeded: s.succeeded,
        failed: s.failed,
        stopped: s.sent < s.total,
    });

    let reports = store.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].total, 3);
    assert_eq!(reports[0].succeeded, 2);
    assert_eq!(reports[0].failed, 1);
    assert!(!reports[0].stopped);
}
