//! In-memory registry of import tasks.
//!
//! Tasks are shared between the use case (progress queries, listing,
//! deletion) and the background worker that mutates them. Each task
//! lives behind its own lock so the worker can update counters without
//! holding the registry lock.

use std::collections::HashMap;
use std::sync::Arc;

use caseforge_core::import::ImportTask;
use tokio::sync::RwLock;

/// Thread-safe map of task id to shared task state.
///
/// Removing a task from the registry only unlists it; a worker holding
/// the task's `Arc` keeps running to completion on its own copy.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Arc<RwLock<ImportTask>>>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a task and returns the shared handle the worker will
    /// hold onto.
    pub async fn insert(&self, task: ImportTask) -> Arc<RwLock<ImportTask>> {
        let task_id = task.task_id.clone();
        let handle = Arc::new(RwLock::new(task));
        let mut tasks = self.tasks.write().await;
        tasks.insert(task_id, Arc::clone(&handle));
        handle
    }

    /// Returns the shared handle for a task id, if registered.
    pub async fn get(&self, task_id: &str) -> Option<Arc<RwLock<ImportTask>>> {
        let tasks = self.tasks.read().await;
        tasks.get(task_id).cloned()
    }

    /// Unregisters a task. Returns false when the id was unknown.
    pub async fn remove(&self, task_id: &str) -> bool {
        let mut tasks = self.tasks.write().await;
        tasks.remove(task_id).is_some()
    }

    /// Point-in-time copies of every registered task, in no particular
    /// order.
    pub async fn snapshots(&self) -> Vec<ImportTask> {
        let handles: Vec<Arc<RwLock<ImportTask>>> = {
            let tasks = self.tasks.read().await;
            tasks.values().cloned().collect()
        };
        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshots.push(handle.read().await.clone());
        }
        snapshots
    }

    /// Number of registered tasks.
    pub async fn len(&self) -> usize {
        let tasks = self.tasks.read().await;
        tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
