//! Session task store.
//!
//! The one place local tasks live. Construct it first and hand a clone of
//! the handle to every consumer; clones share the same task list. All
//! mutations go through [`add`](TaskStore::add) and
//! [`replace`](TaskStore::replace), each of which swaps whole `Task` values
//! under a single lock acquisition.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{DashboardError, Result};

use super::Task;

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<Mutex<Vec<Task>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly created task. Ids are unique within the session.
    pub fn add(&self, task: Task) -> Result<()> {
        let mut tasks = self.lock();
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(DashboardError::DuplicateTask(task.id));
        }
        log::debug!("task {} added as {}", task.id, task.status);
        tasks.push(task);
        Ok(())
    }

    /// Replace the stored task with the same id.
    ///
    /// The new status must equal the current one or be its direct successor,
    /// so a task can neither go backwards nor skip `in progress`.
    pub fn replace(&self, task: Task) -> Result<()> {
        let mut tasks = self.lock();
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(DashboardError::TaskNotFound(task.id))?;

        let from = slot.status;
        if task.status != from && from.next() != Some(task.status) {
            return Err(DashboardError::InvalidTransition {
                id: task.id,
                from,
                to: task.status,
            });
        }

        log::debug!("task {} replaced: {} -> {}", task.id, from, task.status);
        *slot = task;
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<Task> {
        self.lock().iter().find(|t| t.id == id).cloned()
    }

    /// Copy of every task in insertion order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Writes are single assignments; a poisoned lock never holds a partial task.
    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskParams, TaskStatus};

    fn task(id: u64, status: TaskStatus) -> Task {
        Task {
            status,
            ..Task::pending(id, TaskParams::default())
        }
    }

    #[test]
    fn clones_share_state() {
        let store = TaskStore::new();
        let consumer = store.clone();
        store.add(task(1, TaskStatus::Pending)).unwrap();
        assert_eq!(consumer.len(), 1);
    }

    #[test]
    fn add_rejects_duplicate_ids() {
        let store = TaskStore::new();
        store.add(task(1, TaskStatus::Pending)).unwrap();
        assert!(matches!(
            store.add(task(1, TaskStatus::Pending)),
            Err(DashboardError::DuplicateTask(1))
        ));
    }

    #[test]
    fn replace_follows_the_lifecycle() {
        let store = TaskStore::new();
        store.add(task(1, TaskStatus::Pending)).unwrap();
        store.replace(task(1, TaskStatus::InProgress)).unwrap();
        store.replace(task(1, TaskStatus::Completed)).unwrap();
        assert_eq!(store.get(1).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn replace_rejects_skipping_in_progress() {
        let store = TaskStore::new();
        store.add(task(1, TaskStatus::Pending)).unwrap();
        let err = store.replace(task(1, TaskStatus::Completed)).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::InvalidTransition {
                from: TaskStatus::Pending,
                to: TaskStatus::Completed,
                ..
            }
        ));
        assert_eq!(store.get(1).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn replace_rejects_going_backwards() {
        let store = TaskStore::new();
        store.add(task(1, TaskStatus::Pending)).unwrap();
        store.replace(task(1, TaskStatus::InProgress)).unwrap();
        assert!(store.replace(task(1, TaskStatus::Pending)).is_err());
    }

    #[test]
    fn replace_unknown_task_fails() {
        let store = TaskStore::new();
        assert!(matches!(
            store.replace(task(9, TaskStatus::InProgress)),
            Err(DashboardError::TaskNotFound(9))
        ));
    }

    #[test]
    fn same_status_replacement_is_allowed() {
        let store = TaskStore::new();
        store.add(task(1, TaskStatus::Pending)).unwrap();
        let mut renamed = task(1, TaskStatus::Pending);
        renamed.params.name = Some("renamed".into());
        store.replace(renamed).unwrap();
        assert_eq!(store.get(1).unwrap().params.name.as_deref(), Some("renamed"));
    }
}
