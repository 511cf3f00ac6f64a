//! Task store contract and bundled implementations
//!
//! Layout of the JSON store:
//! ```text
//! {data-dir}/
//! └── tasks.json   # Array of all planner tasks
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::models::{task_order, NewTask, PlannerTask, TaskPatch};
use crate::storage::{read_json_or_default, write_json, Result, StoreError};

/// Durable keyed storage of planner tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Read every task ordered by day, then start time
    async fn select_all(&self) -> Result<Vec<PlannerTask>>;

    /// Insert a task; the store assigns its id and creation time
    async fn insert(&self, task: &NewTask) -> Result<PlannerTask>;

    async fn update_by_id(&self, id: &str, patch: &TaskPatch) -> Result<()>;

    async fn delete_by_id(&self, id: &str) -> Result<()>;
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound(format!("task {}", id))
}

/// In-process task store
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<PlannerTask>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn select_all(&self) -> Result<Vec<PlannerTask>> {
        let mut tasks = self.tasks.read().await.clone();
        tasks.sort_by(task_order);
        Ok(tasks)
    }

    async fn insert(&self, task: &NewTask) -> Result<PlannerTask> {
        let created = task.clone().into_task(Uuid::new_v4().to_string(), Utc::now());
        self.tasks.write().await.push(created.clone());
        Ok(created)
    }

    async fn update_by_id(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(id))?;
        task.apply_patch(patch);
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

/// Task store backed by a single JSON file
pub struct JsonTaskStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl JsonTaskStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("tasks.json"),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<PlannerTask>> {
        read_json_or_default(&self.path).await
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn select_all(&self) -> Result<Vec<PlannerTask>> {
        let mut tasks = self.load().await?;
        tasks.sort_by(task_order);
        Ok(tasks)
    }

    async fn insert(&self, task: &NewTask) -> Result<PlannerTask> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;
        let created = task.clone().into_task(Uuid::new_v4().to_string(), Utc::now());
        tasks.push(created.clone());
        write_json(&self.path, &tasks).await?;
        Ok(created)
    }

    async fn update_by_id(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(id))?;
        task.apply_patch(patch);
        write_json(&self.path, &tasks).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(not_found(id));
        }
        write_json(&self.path, &tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::models::CreateTaskRequest;
    use tempfile::tempdir;

    fn new_task(topic: &str, day: &str, start: Option<&str>) -> NewTask {
        let mut request = CreateTaskRequest::new(topic, day);
        request.start_time = start.map(str::to_string);
        request.validate().unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_orders_reads() {
        let store = MemoryTaskStore::new();
        store.insert(&new_task("later", "2024-05-02", None)).await.unwrap();
        store.insert(&new_task("untimed", "2024-05-01", None)).await.unwrap();
        store.insert(&new_task("morning", "2024-05-01", Some("08:00"))).await.unwrap();

        let topics: Vec<String> = store
            .select_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.topic)
            .collect();
        assert_eq!(topics, vec!["morning", "untimed", "later"]);
    }

    #[tokio::test]
    async fn test_memory_store_update_and_delete() {
        let store = MemoryTaskStore::new();
        let created = store.insert(&new_task("essay", "2024-05-01", None)).await.unwrap();

        let patch = TaskPatch {
            completed: Some(true),
        };
        store.update_by_id(&created.id, &patch).await.unwrap();
        assert!(store.select_all().await.unwrap()[0].completed);

        store.delete_by_id(&created.id).await.unwrap();
        assert!(store.select_all().await.unwrap().is_empty());
        assert!(matches!(
            store.delete_by_id(&created.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonTaskStore::new(dir.path());
        assert!(store.select_all().await.unwrap().is_empty());

        let first = store.insert(&new_task("flashcards", "2024-05-01", Some("10:00"))).await.unwrap();
        let second = store.insert(&new_task("reading", "2024-05-01", Some("09:00"))).await.unwrap();
        store
            .update_by_id(&first.id, &TaskPatch { completed: Some(true) })
            .await
            .unwrap();

        let reopened = JsonTaskStore::new(dir.path());
        let tasks = reopened.select_all().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, second.id);
        assert_eq!(tasks[1].id, first.id);
        assert!(tasks[1].completed);

        reopened.delete_by_id(&second.id).await.unwrap();
        assert_eq!(store.select_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_json_store_update_unknown_id() {
        let dir = tempdir().unwrap();
        let store = JsonTaskStore::new(dir.path());
        let result = store
            .update_by_id("nope", &TaskPatch { completed: Some(true) })
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
