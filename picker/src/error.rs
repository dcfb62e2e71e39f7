//! Error types for the seat picker.

use crate::types::SeatId;
use thiserror::Error;

/// Rejected engine operation
///
/// A rejected operation leaves the selection state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// A toggle referenced a seat id that is not in the catalog
    #[error("Seat {0} is not in the catalog")]
    InvalidSeatReference(SeatId),

    /// A ticket-count update referenced an unrecognised ticket type
    #[error("Unknown ticket type: {0}")]
    InvalidTicketType(String),
}

/// Failure while loading a seat catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Two seats share the same id
    #[error("Duplicate seat id {0} in catalog")]
    DuplicateSeat(SeatId),

    /// The catalog document is not a valid seat list
    #[error("Failed to parse seat catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The catalog file could not be read
    #[error("Failed to read seat catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the external availability feed
///
/// Never reaches the selection state; the reducer records it and tries
/// again later.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The feed could not be reached or timed out
    #[error("Availability feed unreachable: {0}")]
    Unreachable(String),

    /// The feed answered with something that is not an unavailability snapshot
    #[error("Malformed availability payload: {0}")]
    Malformed(String),
}
