//! Backend task list with fixed-interval polling.
//!
//! Polls may overlap: each tick starts a fetch on its own thread without
//! waiting for the previous one. Every fetch is tagged with a sequence number
//! when it is issued, and [`TaskBoard::resolve`] only applies a response that
//! is newer than the last one applied. A slow, older response that resolves
//! after a newer one is dropped instead of overwriting fresher data.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::analytics::ActivityLog;
use crate::api::TaskSummary;
use crate::error::Result;

/// Anything that can produce the backend's task list.
pub trait TaskSource: Send + Sync {
    fn fetch_tasks(&self) -> Result<Vec<TaskSummary>>;
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BoardState {
    tasks: Vec<TaskSummary>,
    last_error: Option<String>,
    /// Highest sequence number handed out.
    issued: u64,
    /// Sequence number of the response currently reflected in `tasks` /
    /// `last_error`. Zero before the first response.
    applied: u64,
}

/// Shared, polled view of the backend's task list.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    state: Arc<Mutex<BoardState>>,
    activity: ActivityLog,
}

impl TaskBoard {
    /// A board that does not write fetch failures to the activity log.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activity(activity: ActivityLog) -> Self {
        Self {
            state: Arc::default(),
            activity,
        }
    }

    /// Reserve the sequence number for a fetch about to be issued.
    pub fn begin_request(&self) -> u64 {
        let mut state = self.lock();
        state.issued += 1;
        state.issued
    }

    /// Apply the outcome of request `seq`.
    ///
    /// Returns `false` (and changes nothing) when a newer request has already
    /// been applied. A success replaces the whole list and clears the error;
    /// a failure keeps the previous list and records the message.
    pub fn resolve(&self, seq: u64, result: Result<Vec<TaskSummary>>) -> bool {
        let mut state = self.lock();
        if seq <= state.applied {
            log::debug!("discarding stale task list response #{seq} (applied #{})", state.applied);
            return false;
        }
        state.applied = seq;
        match result {
            Ok(tasks) => {
                state.tasks = tasks;
                state.last_error = None;
            }
            Err(e) => state.last_error = Some(e.to_string()),
        }
        true
    }

    /// Fetch once on the calling thread.
    pub fn refresh(&self, source: &dyn TaskSource) -> bool {
        let seq = self.begin_request();
        let result = source.fetch_tasks();
        if let Err(e) = &result {
            self.report_failure(e);
        }
        self.resolve(seq, result)
    }

    /// Tasks in the order the backend returned them.
    pub fn tasks(&self) -> Vec<TaskSummary> {
        self.lock().tasks.clone()
    }

    /// Task queue for display: newest (highest id) first.
    pub fn queue(&self) -> Vec<TaskSummary> {
        let mut tasks = self.tasks();
        tasks.sort_by(|a, b| b.id.cmp(&a.id));
        tasks
    }

    /// Only tasks whose data can be browsed.
    pub fn completed(&self) -> Vec<TaskSummary> {
        self.tasks()
            .into_iter()
            .filter(|t| t.status.is_completed())
            .collect()
    }

    /// Message of the most recent applied failure, if the latest response
    /// was one.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn applied_sequence(&self) -> u64 {
        self.lock().applied
    }

    fn report_failure(&self, err: &crate::error::DashboardError) {
        log::warn!("Error fetching tasks: {err}");
        self.activity.fetch_failure(&err.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// Shortest interval a poller will tick at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Running poll loop. Stops on [`stop`](Self::stop) or when dropped.
///
/// Fetches already in flight are not aborted; if they resolve after a newer
/// response they are discarded by the board.
pub struct TaskPoller {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TaskPoller {
    /// Fetch immediately, then once per `interval`, floored at
    /// [`MIN_POLL_INTERVAL`].
    pub fn start(source: Arc<dyn TaskSource>, board: TaskBoard, interval: Duration) -> Self {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::spawn(move || {
            loop {
                spawn_fetch(&source, &board);
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            log::debug!("task polling stopped");
        });

        Self {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TaskPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_fetch(source: &Arc<dyn TaskSource>, board: &TaskBoard) {
    let seq = board.begin_request();
    let source = Arc::clone(source);
    let board = board.clone();
    thread::spawn(move || {
        let result = source.fetch_tasks();
        if let Err(e) = &result {
            board.report_failure(e);
        }
        board.resolve(seq, result);
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::task::TaskStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn summary(id: u64, status: TaskStatus) -> TaskSummary {
        TaskSummary {
            id,
            name: None,
            created_at: "2025-03-01 10:00:00".into(),
            status,
        }
    }

    #[test]
    fn stale_response_is_discarded() {
        let board = TaskBoard::new();
        let older = board.begin_request();
        let newer = board.begin_request();

        assert!(board.resolve(newer, Ok(vec![summary(2, TaskStatus::Pending)])));
        assert!(!board.resolve(older, Ok(vec![summary(1, TaskStatus::Completed)])));

        let ids: Vec<u64> = board.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, [2]);
        assert_eq!(board.applied_sequence(), newer);
    }

    #[test]
    fn in_order_responses_all_apply() {
        let board = TaskBoard::new();
        let first = board.begin_request();
        let second = board.begin_request();
        assert!(board.resolve(first, Ok(vec![summary(1, TaskStatus::Pending)])));
        assert!(board.resolve(second, Ok(vec![summary(1, TaskStatus::InProgress)])));
        assert_eq!(board.tasks()[0].status, TaskStatus::InProgress);
    }

    #[test]
    fn failure_keeps_previous_list() {
        let board = TaskBoard::new();
        let ok = board.begin_request();
        board.resolve(ok, Ok(vec![summary(1, TaskStatus::Completed)]));

        let failed = board.begin_request();
        board.resolve(
            failed,
            Err(DashboardError::Transport {
                context: "Failed to get tasks",
                message: "connection refused".into(),
            }),
        );

        assert_eq!(board.tasks().len(), 1);
        assert_eq!(
            board.last_error().as_deref(),
            Some("Failed to get tasks: connection refused")
        );
    }

    #[test]
    fn queue_is_newest_first_and_completed_filters() {
        let board = TaskBoard::new();
        let seq = board.begin_request();
        board.resolve(
            seq,
            Ok(vec![
                summary(1, TaskStatus::Completed),
                summary(3, TaskStatus::Pending),
                summary(2, TaskStatus::Completed),
            ]),
        );

        let ids: Vec<u64> = board.queue().iter().map(|t| t.id).collect();
        assert_eq!(ids, [3, 2, 1]);
        let done: Vec<u64> = board.completed().iter().map(|t| t.id).collect();
        assert_eq!(done, [1, 2]);
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl TaskSource for CountingSource {
        fn fetch_tasks(&self) -> Result<Vec<TaskSummary>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as u64 + 1;
            Ok(vec![summary(n, TaskStatus::Pending)])
        }
    }

    #[test]
    fn poller_fetches_until_stopped() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let board = TaskBoard::new();
        let poller = TaskPoller::start(source.clone(), board.clone(), Duration::from_millis(10));

        thread::sleep(Duration::from_millis(60));
        poller.stop();
        // Let the last spawned fetch land.
        thread::sleep(Duration::from_millis(20));
        let calls_at_stop = source.calls.load(Ordering::SeqCst);
        assert!(calls_at_stop >= 2, "expected repeated polls, got {calls_at_stop}");

        thread::sleep(Duration::from_millis(40));
        assert_eq!(source.calls.load(Ordering::SeqCst), calls_at_stop);
    }

    #[test]
    fn zero_interval_is_floored() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let started = std::time::Instant::now();
        let poller = TaskPoller::start(source.clone(), TaskBoard::new(), Duration::ZERO);

        thread::sleep(Duration::from_millis(20));
        poller.stop();
        let elapsed = started.elapsed();
        thread::sleep(Duration::from_millis(10));

        // At most one tick per floor interval, plus the immediate fetch.
        let ticks = (elapsed.as_micros() / MIN_POLL_INTERVAL.as_micros()) as usize + 1;
        let calls = source.calls.load(Ordering::SeqCst);
        assert!(calls >= 1);
        assert!(calls <= ticks, "{calls} fetches in {elapsed:?}");
    }

    struct FailingSource;

    impl TaskSource for FailingSource {
        fn fetch_tasks(&self) -> Result<Vec<TaskSummary>> {
            Err(DashboardError::Transport {
                context: "Failed to get tasks",
                message: "connection refused".into(),
            })
        }
    }

    #[test]
    fn failures_go_to_the_board_activity_log() {
        use crate::config::schema::LoggingConfig;

        let path = std::env::temp_dir().join(format!(
            "salesdash-board-{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let log = ActivityLog::new(Some(path.clone()), &LoggingConfig { activity_log: true });
        let board = TaskBoard::with_activity(log.clone());

        board.refresh(&FailingSource);

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, "fetch_failed");
        let _ = std::fs::remove_file(&path);
    }
}
