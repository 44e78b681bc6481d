//! Builders for tasks and transfer items.

use mcbridge_paths::TransferPathContext;
use mcbridge_transfer_core::{Task, TransferItem};

/// Task completed at `completion_time` (RFC 3339).
#[must_use]
pub fn task(task_id: &str, completion_time: &str) -> Task {
    Task::new(task_id, completion_time)
}

/// Upload whose destination lands under `/<category>/<tenant>/<project>/<relative>`.
#[must_use]
pub fn staged_upload(category: &str, tenant_id: u64, project_id: u64, relative: &str) -> TransferItem {
    let ctx = TransferPathContext::new(category, tenant_id, project_id, "/");
    TransferItem {
        source_path: format!("/home/user/{}", relative.trim_start_matches('/')),
        destination_path: ctx.full_path(relative),
    }
}

/// Upload with a verbatim destination path.
#[must_use]
pub fn upload_to(destination_path: &str) -> TransferItem {
    TransferItem {
        source_path: "/home/user/file".to_string(),
        destination_path: destination_path.to_string(),
    }
}

/// Download out of the staging endpoint; no destination path.
#[must_use]
pub fn download_from(source_path: &str) -> TransferItem {
    TransferItem {
        source_path: source_path.to_string(),
        destination_path: String::new(),
    }
}
