//! Capabilities the monitor consumes upstream and drives downstream.

use async_trait::async_trait;

use crate::error::TransferResult;
use crate::model::{Task, TaskFilter, TransferItem};

/// Read access to the external bulk transfer service.
#[async_trait]
pub trait TransferService: Send + Sync {
    /// List tasks on `endpoint_id` matching `filter`.
    async fn list_recent_succeeded_tasks(
        &self,
        endpoint_id: &str,
        filter: &TaskFilter,
    ) -> TransferResult<Vec<Task>>;

    /// List the files a task transferred successfully, starting at `offset`.
    async fn list_successful_transfer_items(
        &self,
        task_id: &str,
        offset: u64,
    ) -> TransferResult<Vec<TransferItem>>;
}

/// Downstream ingestion pipeline notified when a staging scope is complete.
///
/// Implementations must be idempotent: the same routing id can be delivered
/// again after a restart because the caller keeps no durable record of it.
#[async_trait]
pub trait UploadPipeline: Send + Sync {
    /// Mark every file under the scope identified by `routing_id` as ready
    /// for ingestion.
    async fn on_upload_ready(&self, routing_id: &str) -> TransferResult<()>;
}
