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

//! Globus transfer API adapter.
//!
//! Layout: `client.rs` (authenticated requests and the `TransferService`
//! implementation), `wire.rs` (response documents), `error.rs`.

pub mod client;
pub mod error;
mod wire;

pub use client::GlobusClient;
pub use error::{GlobusError, GlobusResult};
