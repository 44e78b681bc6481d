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

//! Environment-backed configuration for the bridge.
//!
//! Layout: `model.rs` (typed config), `loader.rs` (environment parsing and
//! validation), `defaults.rs` (variable names and defaults).

mod defaults;
pub mod error;
mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::BridgeConfig;
