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

//! Staging path codec.
//!
//! Files staged by the transfer service live under
//! `/<category>/<tenant_id>/<project_id>/<relative_path...>`. This crate maps
//! between that string form and [`TransferPathContext`].
//!
//! Layout: `context.rs` (context type, decode/encode), `join.rs` (separator
//! normalisation shared by both directions).

pub mod context;
pub mod join;

pub use context::TransferPathContext;
pub use join::{join_rooted, normalize_rooted};
