//! Response documents returned by the transfer API.

use mcbridge_transfer_core::{Task, TransferItem};
use serde::Deserialize;

/// Paged list wrapper; the API nests results under `DATA`.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    #[serde(rename = "DATA", default = "Vec::new")]
    pub(crate) data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskDocument {
    task_id: String,
    // Null while a task is still running.
    #[serde(default)]
    completion_time: Option<String>,
}

impl From<TaskDocument> for Task {
    fn from(doc: TaskDocument) -> Self {
        Self::new(doc.task_id, doc.completion_time.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransferDocument {
    #[serde(default)]
    source_path: Option<String>,
    #[serde(default)]
    destination_path: Option<String>,
}

impl From<TransferDocument> for TransferItem {
    fn from(doc: TransferDocument) -> Self {
        Self {
            source_path: doc.source_path.unwrap_or_default(),
            destination_path: doc.destination_path.unwrap_or_default(),
        }
    }
}

/// Error body attached to non-success responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorDocument {
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}
