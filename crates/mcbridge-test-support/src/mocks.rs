//! In-memory fakes for the transfer service and the upload pipeline.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mcbridge_transfer_core::{
    Task, TaskFilter, TransferError, TransferItem, TransferResult, TransferService,
    UploadPipeline,
};

enum ScriptedList {
    Tasks(Vec<Task>),
    Failure(String),
}

#[derive(Default)]
struct Script {
    task_lists: VecDeque<ScriptedList>,
    items: HashMap<String, Vec<TransferItem>>,
    failing_items: HashSet<String>,
    filters: Vec<(String, TaskFilter)>,
    item_calls: Vec<(String, u64)>,
}

/// [`TransferService`] that replays queued task-list responses.
///
/// Each list call pops one queued response; once the queue is empty every
/// call returns an empty list.
#[derive(Default)]
pub struct ScriptedTransferService {
    script: Mutex<Script>,
}

impl ScriptedTransferService {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a successful task-list response.
    pub fn push_tasks(&self, tasks: Vec<Task>) {
        self.lock().task_lists.push_back(ScriptedList::Tasks(tasks));
    }

    /// Queue a failing task-list response.
    pub fn push_failure(&self, message: &str) {
        self.lock()
            .task_lists
            .push_back(ScriptedList::Failure(message.to_string()));
    }

    /// Items returned for `task_id`; unknown tasks have none.
    pub fn set_items(&self, task_id: &str, items: Vec<TransferItem>) {
        self.lock().items.insert(task_id.to_string(), items);
    }

    /// Make item lookups for `task_id` fail.
    pub fn fail_items(&self, task_id: &str) {
        self.lock().failing_items.insert(task_id.to_string());
    }

    /// Number of task-list calls observed.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.lock().filters.len()
    }

    /// Endpoint and filter of every task-list call, in order.
    #[must_use]
    pub fn filters(&self) -> Vec<(String, TaskFilter)> {
        self.lock().filters.clone()
    }

    /// Task ids whose items were requested, in order.
    #[must_use]
    pub fn item_calls(&self) -> Vec<String> {
        self.lock()
            .item_calls
            .iter()
            .map(|(task_id, _)| task_id.clone())
            .collect()
    }

    /// Offsets passed with each item request, in order.
    #[must_use]
    pub fn item_offsets(&self) -> Vec<u64> {
        self.lock()
            .item_calls
            .iter()
            .map(|(_, offset)| *offset)
            .collect()
    }
}

#[async_trait]
impl TransferService for ScriptedTransferService {
    async fn list_recent_succeeded_tasks(
        &self,
        endpoint_id: &str,
        filter: &TaskFilter,
    ) -> TransferResult<Vec<Task>> {
        let mut script = self.lock();
        script
            .filters
            .push((endpoint_id.to_string(), filter.clone()));
        match script.task_lists.pop_front() {
            Some(ScriptedList::Tasks(tasks)) => Ok(tasks),
            Some(ScriptedList::Failure(message)) => {
                Err(TransferError::service("task_list", endpoint_id, message))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn list_successful_transfer_items(
        &self,
        task_id: &str,
        offset: u64,
    ) -> TransferResult<Vec<TransferItem>> {
        let mut script = self.lock();
        script.item_calls.push((task_id.to_string(), offset));
        if script.failing_items.contains(task_id) {
            return Err(TransferError::service(
                "successful_transfers",
                task_id,
                "scripted failure",
            ));
        }
        Ok(script.items.get(task_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct Recorded {
    routing_ids: Vec<String>,
    failing: HashSet<String>,
}

/// [`UploadPipeline`] that records every hand-off it receives.
#[derive(Default)]
pub struct RecordingPipeline {
    recorded: Mutex<Recorded>,
}

impl RecordingPipeline {
    /// Pipeline that accepts every hand-off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject hand-offs for `routing_id` after recording them.
    pub fn fail_for(&self, routing_id: &str) {
        self.lock().failing.insert(routing_id.to_string());
    }

    /// Routing ids received, in order, including rejected ones.
    #[must_use]
    pub fn routing_ids(&self) -> Vec<String> {
        self.lock().routing_ids.clone()
    }
}

#[async_trait]
impl UploadPipeline for RecordingPipeline {
    async fn on_upload_ready(&self, routing_id: &str) -> TransferResult<()> {
        let mut recorded = self.lock();
        recorded.routing_ids.push(routing_id.to_string());
        if recorded.failing.contains(routing_id) {
            return Err(TransferError::handoff(routing_id, "scripted rejection"));
        }
        Ok(())
    }
}
