//! Planner reconciliation engine
//!
//! Keeps the ordered in-memory task list consistent with the task store.
//! The list is only ever the last applied fetch plus mutations the store
//! has confirmed. Toggles are applied optimistically and then settle
//! through an explicit transition: `Pending -> Confirmed` when the store
//! accepts the write, `Pending -> RolledBack` when it does not.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use super::models::{task_order, CreateTaskRequest, PlannerTask, TaskPatch};
use super::storage::TaskStore;
use crate::error::{CoreError, Result};
use crate::storage::StoreError;

/// How the list is brought back in line with the store after a confirmed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Apply the confirmed change, then replace the list with a full fetch.
    /// The local splice keeps the change visible if that fetch fails; the
    /// fetch result replaces it either way.
    #[default]
    FullRefetch,
    /// Apply the confirmed change by id and re-sort, without fetching
    MergeById,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub reconcile: ReconcileMode,
}

/// Store synchronization state of a task in the local list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Matches what the store last confirmed
    Confirmed,
    /// An optimistic toggle is waiting for the store
    Pending { previous_completed: bool },
}

/// How a pending change settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone)]
struct TaskEntry {
    task: PlannerTask,
    sync: SyncState,
}

impl TaskEntry {
    fn confirmed(task: PlannerTask) -> Self {
        Self {
            task,
            sync: SyncState::Confirmed,
        }
    }

    fn is_pending(&self) -> bool {
        matches!(self.sync, SyncState::Pending { .. })
    }

    /// Flip `completed` locally and remember the value to roll back to
    fn begin_toggle(&mut self) -> bool {
        let previous = self.task.completed;
        self.sync = SyncState::Pending {
            previous_completed: previous,
        };
        self.task.completed = !previous;
        self.task.completed
    }

    fn settle(&mut self, accepted: bool) -> Transition {
        let transition = match self.sync {
            SyncState::Pending { previous_completed } if !accepted => {
                self.task.completed = previous_completed;
                Transition::RolledBack
            }
            _ => Transition::Confirmed,
        };
        self.sync = SyncState::Confirmed;
        transition
    }
}

#[derive(Debug, Default)]
struct PlannerState {
    entries: Vec<TaskEntry>,
    fetches_issued: u64,
    /// Fetches with a ticket at or below this are stale
    fetch_watermark: u64,
}

impl PlannerState {
    fn entry(&self, id: &str) -> Option<&TaskEntry> {
        self.entries.iter().find(|e| e.task.id == id)
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut TaskEntry> {
        self.entries.iter_mut().find(|e| e.task.id == id)
    }

    fn tasks(&self) -> Vec<PlannerTask> {
        self.entries.iter().map(|e| e.task.clone()).collect()
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| task_order(&a.task, &b.task));
    }

    fn begin_fetch(&mut self) -> u64 {
        self.fetches_issued += 1;
        self.fetches_issued
    }

    /// Fetches already in flight started before a local mutation and must not overwrite it
    fn invalidate_inflight_fetches(&mut self) {
        self.fetch_watermark = self.fetches_issued;
    }

    /// Replace the list with a fetch result unless a newer view was applied first.
    /// Returns whether the result was applied.
    fn finish_fetch(&mut self, ticket: u64, fetched: Vec<PlannerTask>) -> bool {
        if ticket <= self.fetch_watermark {
            return false;
        }
        self.fetch_watermark = ticket;

        // Unsettled toggles keep their optimistic value until their write resolves
        let pending: HashMap<String, TaskEntry> = self
            .entries
            .drain(..)
            .filter(TaskEntry::is_pending)
            .map(|e| (e.task.id.clone(), e))
            .collect();

        self.entries = fetched
            .into_iter()
            .map(|task| match pending.get(&task.id) {
                Some(local) => TaskEntry {
                    task: PlannerTask {
                        completed: local.task.completed,
                        ..task
                    },
                    sync: local.sync,
                },
                None => TaskEntry::confirmed(task),
            })
            .collect();
        self.sort();
        true
    }
}

fn lock_state(state: &Mutex<PlannerState>) -> MutexGuard<'_, PlannerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn task_not_found(id: &str) -> CoreError {
    CoreError::NotFound(format!("task {}", id))
}

/// Apply the store's answer to a pending toggle
fn settle_toggle(
    state: &Mutex<PlannerState>,
    id: &str,
    result: crate::storage::Result<()>,
) -> Result<PlannerTask> {
    let mut state = lock_state(state);

    let Some(entry) = state.entry_mut(id) else {
        log::debug!("Task {} left the planner before its update settled", id);
        return Err(match result {
            Err(e) => CoreError::StoreWrite(e),
            Ok(()) => task_not_found(id),
        });
    };

    match result {
        Ok(()) => {
            entry.settle(true);
            let task = entry.task.clone();
            state.invalidate_inflight_fetches();
            Ok(task)
        }
        Err(e) => {
            let transition = entry.settle(false);
            log::warn!(
                "Failed to update task {} ({:?}, completed={}): {}",
                id,
                transition,
                entry.task.completed,
                e
            );
            Err(CoreError::StoreWrite(e))
        }
    }
}

/// Owner of one user's planner task list
///
/// Every operation takes `&self`. The list lock is never held across a
/// store call, so reads keep working while a mutation is in flight.
/// Mutations of the same task id are serialized.
pub struct PlannerEngine {
    store: Arc<dyn TaskStore>,
    config: PlannerConfig,
    state: Arc<Mutex<PlannerState>>,
    entity_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PlannerEngine {
    pub fn new(store: Arc<dyn TaskStore>, config: PlannerConfig) -> Self {
        Self {
            store,
            config,
            state: Arc::new(Mutex::new(PlannerState::default())),
            entity_locks: Mutex::new(HashMap::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PlannerState> {
        lock_state(&self.state)
    }

    fn entity_lock(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .entity_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    /// Drop locks nobody holds for ids that are no longer in the list
    fn prune_entity_locks(&self) {
        let state = self.state();
        self.entity_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, lock| Arc::strong_count(lock) > 1 || state.entry(id).is_some());
    }

    // ===== Reads =====

    /// Current ordered task list
    pub fn tasks(&self) -> Vec<PlannerTask> {
        self.state().tasks()
    }

    pub fn tasks_for_day(&self, day: NaiveDate) -> Vec<PlannerTask> {
        self.state()
            .entries
            .iter()
            .filter(|e| e.task.day == day)
            .map(|e| e.task.clone())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<PlannerTask> {
        self.state().entry(id).map(|e| e.task.clone())
    }

    pub fn sync_state(&self, id: &str) -> Option<SyncState> {
        self.state().entry(id).map(|e| e.sync)
    }

    // ===== Store operations =====

    /// Replace the list with the store's tasks; on failure the current list is kept
    pub async fn fetch_all(&self) -> Result<Vec<PlannerTask>> {
        let ticket = self.state().begin_fetch();

        let fetched = self.store.select_all().await.map_err(|e| {
            log::warn!("Failed to fetch planner tasks: {}", e);
            CoreError::StoreRead(e)
        })?;

        let tasks = {
            let mut state = self.state();
            if !state.finish_fetch(ticket, fetched) {
                log::debug!("Discarded stale planner fetch #{}", ticket);
            }
            state.tasks()
        };
        self.prune_entity_locks();
        Ok(tasks)
    }

    /// Validate, insert, and reconcile a new task
    pub async fn create(&self, request: CreateTaskRequest) -> Result<PlannerTask> {
        let new_task = request.validate()?;

        let created = self.store.insert(&new_task).await.map_err(|e| {
            log::warn!("Failed to create task '{}': {}", new_task.topic, e);
            CoreError::StoreWrite(e)
        })?;
        log::info!("Created task {} on {}", created.id, created.day);

        {
            let mut state = self.state();
            state.invalidate_inflight_fetches();
            state.entries.push(TaskEntry::confirmed(created.clone()));
            state.sort();
        }

        self.reconcile().await;
        Ok(created)
    }

    /// Flip a task's completion optimistically, rolling back if the store rejects it
    ///
    /// The store write and its settlement run on their own task, so the
    /// list still settles if the caller stops waiting.
    pub async fn toggle_complete(&self, id: &str) -> Result<PlannerTask> {
        if self.get(id).is_none() {
            return Err(task_not_found(id));
        }
        let serial = self.entity_lock(id).lock_owned().await;

        let begun = self.state().entry_mut(id).map(TaskEntry::begin_toggle);
        let Some(completed) = begun else {
            drop(serial);
            self.prune_entity_locks();
            return Err(task_not_found(id));
        };

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let task_id = id.to_string();
        let settled = tokio::spawn(async move {
            let _serial = serial;
            let patch = TaskPatch {
                completed: Some(completed),
            };
            let result = store.update_by_id(&task_id, &patch).await;
            settle_toggle(&state, &task_id, result)
        });

        settled.await.map_err(|e| {
            CoreError::StoreWrite(StoreError::Unavailable(format!(
                "update of task {} was interrupted: {}",
                id, e
            )))
        })?
    }

    /// Delete a task; on failure it stays in the list
    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(task_not_found(id));
        }
        let serial = self.entity_lock(id).lock_owned().await;

        let known = self.state().entry(id).is_some();
        if !known {
            drop(serial);
            self.prune_entity_locks();
            return Err(task_not_found(id));
        }

        self.store.delete_by_id(id).await.map_err(|e| {
            log::warn!("Failed to delete task {}: {}", id, e);
            CoreError::StoreWrite(e)
        })?;
        log::info!("Deleted task {}", id);

        {
            let mut state = self.state();
            state.invalidate_inflight_fetches();
            state.entries.retain(|e| e.task.id != id);
        }
        drop(serial);
        self.prune_entity_locks();

        self.reconcile().await;
        Ok(())
    }

    /// Follow a confirmed mutation with a full fetch when configured to.
    /// The confirmed change is already applied, so a failed fetch only leaves the list stale.
    async fn reconcile(&self) {
        if self.config.reconcile != ReconcileMode::FullRefetch {
            return;
        }
        if let Err(e) = self.fetch_all().await {
            log::warn!("Keeping local planner view after failed refetch: {}", e);
        }
    }
}
