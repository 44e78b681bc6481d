#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Service-agnostic transfer interfaces and DTOs.
//!
//! Layout: `model/` (tasks, transfer items, query filters), `service/`
//! (upstream `TransferService` and downstream `UploadPipeline` traits),
//! `error.rs` (typed failures shared by implementations).

pub mod error;
pub mod model;
pub mod service;

pub use error::{TransferError, TransferResult};
pub use model::{Task, TaskFilter, TaskOrder, TaskStatus, TransferItem};
pub use service::{TransferService, UploadPipeline};
