//! Simulated backend processing for locally tracked tasks.
//!
//! Drives one task through its lifecycle with two fixed delays, writing each
//! step to the [`TaskStore`]. Stands in for real job progress until the
//! backend reports it.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::Rng;

use crate::analytics::ActivityLog;
use crate::config::schema::SimulationConfig;
use crate::error::Result;

use super::{Task, TaskStore};

#[derive(Debug, Clone)]
pub struct TaskSimulator {
    store: TaskStore,
    pending_delay: Duration,
    processing_delay: Duration,
    activity: ActivityLog,
}

impl TaskSimulator {
    /// The store must exist before the simulator; it is a required handle,
    /// not an optional lookup.
    pub fn new(store: TaskStore, config: &SimulationConfig, activity: ActivityLog) -> Self {
        Self::with_delays(
            store,
            Duration::from_millis(config.pending_delay_ms),
            Duration::from_millis(config.processing_delay_ms),
        )
        .with_activity(activity)
    }

    /// Explicit delays and no activity logging.
    pub fn with_delays(store: TaskStore, pending_delay: Duration, processing_delay: Duration) -> Self {
        Self {
            store,
            pending_delay,
            processing_delay,
            activity: ActivityLog::disabled(),
        }
    }

    /// Record every transition to `activity`.
    pub fn with_activity(mut self, activity: ActivityLog) -> Self {
        self.activity = activity;
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Run the full lifecycle for `task` and return the completed value.
    pub fn run<R: Rng + ?Sized>(&self, task: Task, rng: &mut R) -> Result<Task> {
        self.run_with(task, rng, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_update` after every store write
    /// (including the initial `add`).
    pub fn run_with<R, F>(&self, task: Task, rng: &mut R, mut on_update: F) -> Result<Task>
    where
        R: Rng + ?Sized,
        F: FnMut(&Task),
    {
        self.store.add(task.clone())?;
        self.activity.transition(task.id, task.status);
        on_update(&task);

        let mut current = task;
        for delay in [self.pending_delay, self.processing_delay] {
            thread::sleep(delay);
            let next = current.advance(rng)?;
            self.store.replace(next.clone())?;
            log::info!("task {} is now {}", next.id, next.status);
            self.activity.transition(next.id, next.status);
            on_update(&next);
            current = next;
        }

        Ok(current)
    }

    /// Run the lifecycle on a background thread.
    pub fn spawn(&self, task: Task) -> JoinHandle<Result<Task>> {
        let simulator = self.clone();
        thread::spawn(move || simulator.run(task, &mut rand::thread_rng()))
    }
}
