//! Recover the routing id of a completed upload from its destination path.

use mcbridge_paths::TransferPathContext;
use mcbridge_transfer_core::TransferItem;

/// Minimum `/`-separated pieces in a staging destination, counting the empty
/// piece before the leading slash.
pub const MIN_DESTINATION_PIECES: usize = 5;
const ROUTING_ID_PIECE: usize = 2;

/// Routing id and decoded scope of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    /// Identifier handed to the ingestion pipeline.
    pub routing_id: String,
    /// Destination path the id was recovered from.
    pub destination_path: String,
    /// Positional decoding of the destination path.
    pub scope: TransferPathContext,
}

/// Why a task could not be correlated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationMiss {
    /// The task moved no files.
    NoItems,
    /// The first item left the staging endpoint.
    Download,
    /// The destination path is shorter than the staging schema.
    MalformedPath {
        /// Raw destination path as reported by the service.
        destination_path: String,
    },
}

/// Correlate a task through the destination of its first transferred item.
///
/// # Errors
///
/// Returns the reason the items carry no usable routing id.
pub fn correlate(items: &[TransferItem]) -> Result<Correlation, CorrelationMiss> {
    let first = items.first().ok_or(CorrelationMiss::NoItems)?;
    if first.is_download() {
        return Err(CorrelationMiss::Download);
    }

    let routing_id =
        routing_id(&first.destination_path).ok_or_else(|| CorrelationMiss::MalformedPath {
            destination_path: first.destination_path.clone(),
        })?;

    Ok(Correlation {
        routing_id: routing_id.to_string(),
        destination_path: first.destination_path.clone(),
        scope: TransferPathContext::decode(&first.destination_path),
    })
}

/// Third `/`-separated piece of `destination_path`, if the path has at least
/// [`MIN_DESTINATION_PIECES`] pieces.
#[must_use]
pub fn routing_id(destination_path: &str) -> Option<&str> {
    let pieces: Vec<&str> = destination_path.split('/').collect();
    if pieces.len() < MIN_DESTINATION_PIECES {
        return None;
    }
    pieces.get(ROUTING_ID_PIECE).copied()
}
