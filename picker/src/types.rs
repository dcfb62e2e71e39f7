//! Domain types for the seat picker.
//!
//! Identifiers, the immutable [`Seat`] record, ticket types and the per-type
//! [`TicketSelection`] the user builds before (or while) picking seats.

use crate::error::SelectionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw identifier
            #[must_use]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// The raw identifier
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Stable identifier of a seat, unique within a catalog
    SeatId
);
id_type!(
    /// Identifier of a section (a block of adjacent seats within a row)
    SectionId
);
id_type!(
    /// Identifier of a row
    RowId
);
id_type!(
    /// Identifier of a column
    ColumnId
);

// ============================================================================
// Seat
// ============================================================================

/// A single addressable seat
///
/// Created once when the catalog is loaded and never mutated afterwards.
/// Field names serialise in camelCase (`sectionId`, `rowLabel`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// Unique identifier
    pub id: SeatId,
    /// Section the seat belongs to
    pub section_id: SectionId,
    /// Row the seat belongs to
    pub row_id: RowId,
    /// Column within the auditorium
    pub column_id: ColumnId,
    /// Display label of the row (e.g. `A`)
    pub row_label: String,
    /// Display label of the column (e.g. `4`)
    pub column_label: String,
}

impl Seat {
    /// Human-readable label, row label followed by column label (`A4`)
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}{}", self.row_label, self.column_label)
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Category of admission
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketType {
    /// Regular admission; assumed when a seat is picked before any ticket
    Standard,
    /// Member admission
    Member,
}

impl TicketType {
    /// Every recognised ticket type
    pub const ALL: [Self; 2] = [Self::Standard, Self::Member];

    /// Ticket type assumed when a seat is selected with no tickets requested
    pub const DEFAULT: Self = Self::Standard;

    /// Wire name (`STANDARD`, `MEMBER`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Member => "MEMBER",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketType {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SelectionError::InvalidTicketType(s.to_string()))
    }
}

/// Requested ticket count per ticket type
///
/// Every recognised ticket type always has an entry (zero by default).
/// Deserialising rejects unknown ticket-type names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u32>", into = "BTreeMap<TicketType, u32>")]
pub struct TicketSelection {
    counts: BTreeMap<TicketType, u32>,
}

impl TicketSelection {
    /// All counts zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: TicketType::ALL.into_iter().map(|t| (t, 0)).collect(),
        }
    }

    /// Build from named counts; missing types default to zero
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidTicketType`] for an unrecognised name.
    pub fn from_named<'a>(pairs: impl IntoIterator<Item = (&'a str, u32)>) -> Result<Self, SelectionError> {
        let mut selection = Self::new();
        for (name, count) in pairs {
            selection.set(name.parse()?, count);
        }
        Ok(selection)
    }

    /// Requested count for one ticket type
    #[must_use]
    pub fn get(&self, ticket_type: TicketType) -> u32 {
        self.counts.get(&ticket_type).copied().unwrap_or(0)
    }

    /// Set the requested count for one ticket type
    pub fn set(&mut self, ticket_type: TicketType, count: u32) {
        self.counts.insert(ticket_type, count);
    }

    /// Sum of all requested counts: the selection limit
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.values().fold(0, |sum, count| sum.saturating_add(*count))
    }

    /// Iterate over `(ticket type, count)` in ticket-type order
    pub fn iter(&self) -> impl Iterator<Item = (TicketType, u32)> + '_ {
        self.counts.iter().map(|(t, c)| (*t, *c))
    }
}

impl Default for TicketSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<BTreeMap<String, u32>> for TicketSelection {
    type Error = SelectionError;

    fn try_from(named: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        Self::from_named(named.iter().map(|(name, count)| (name.as_str(), *count)))
    }
}

impl From<TicketSelection> for BTreeMap<TicketType, u32> {
    fn from(selection: TicketSelection) -> Self {
        selection.counts
    }
}

// ============================================================================
// Seat status
// ============================================================================

/// Display status of a seat in the projected seat plan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    /// Free to pick
    Available,
    /// Picked by the user
    Selected,
    /// Marked unavailable by the availability feed
    Unavailable,
    /// Free, but right next to an unavailable seat in the same section
    Distancing,
}

impl SeatStatus {
    /// Whether the engine accepts a toggle on a seat shown with this status
    #[must_use]
    pub const fn is_selectable(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}
