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

//! In-process event bus for the bridge.
//!
//! The bus assigns sequential identifiers, keeps a bounded replay ring and
//! fans events out over `tokio::broadcast`; when the channel overflows, the
//! oldest events are dropped rather than stalling publishers.
//!
//! Layout: `payloads.rs` (event types), `routing.rs` (bus), `pipeline.rs`
//! (upload hand-off adapter).

pub mod payloads;
pub mod pipeline;
pub mod routing;

pub use payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};
pub use pipeline::EventPipeline;
pub use routing::{EventBus, EventStream};
