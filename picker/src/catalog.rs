//! Static description of every seat in the auditorium.
//!
//! The catalog is loaded once, validated (ids must be unique) and then shared
//! read-only for the whole session, usually behind an `Arc`.

use crate::error::CatalogError;
use crate::types::{ColumnId, RowId, Seat, SeatId, SectionId};
use std::collections::HashMap;
use std::path::Path;

/// Immutable, ordered list of seats with an id index
#[derive(Clone, Debug, Default)]
pub struct SeatCatalog {
    seats: Vec<Seat>,
    index: HashMap<SeatId, usize>,
}

impl SeatCatalog {
    /// Build a catalog from seats in display order
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateSeat`] if two seats share an id.
    pub fn new(seats: Vec<Seat>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(seats.len());
        for (position, seat) in seats.iter().enumerate() {
            if index.insert(seat.id, position).is_some() {
                return Err(CatalogError::DuplicateSeat(seat.id));
            }
        }
        Ok(Self { seats, index })
    }

    /// Parse a JSON array of seats (`[{"id":0,"sectionId":1,...}, ...]`)
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON and
    /// [`CatalogError::DuplicateSeat`] for repeated ids.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let seats: Vec<Seat> = serde_json::from_str(json)?;
        Self::new(seats)
    }

    /// Read and parse a JSON catalog file
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise the
    /// errors of [`SeatCatalog::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Generate a rectangular auditorium
    ///
    /// Rows are labelled `A`, `B`, ..., `Z`, `AA`, ...; columns are numbered
    /// from 1 across the whole row, so a row of two sections of three seats
    /// reads `1 2 3 | 4 5 6`. Seat ids run from 0 in row-major order and
    /// section ids are unique across the auditorium.
    #[must_use]
    pub fn uniform(rows: u32, sections_per_row: u32, seats_per_section: u32) -> Self {
        let mut seats = Vec::new();
        let mut next_id = 0;

        for row in 0..rows {
            let row_label = row_label(row);
            for section in 0..sections_per_row {
                let section_id = SectionId::new(row * sections_per_row + section + 1);
                for seat in 0..seats_per_section {
                    let column = section * seats_per_section + seat + 1;
                    seats.push(Seat {
                        id: SeatId::new(next_id),
                        section_id,
                        row_id: RowId::new(row + 1),
                        column_id: ColumnId::new(column),
                        row_label: row_label.clone(),
                        column_label: column.to_string(),
                    });
                    next_id += 1;
                }
            }
        }

        Self::from_generated(seats)
    }

    /// The small two-row demo layout
    ///
    /// Row A holds two sections (seats 0-2 and 3-6), row B a single section
    /// of four seats (7-10).
    #[must_use]
    pub fn demo() -> Self {
        let layout: [(u32, u32, u32, u32, &str); 11] = [
            (0, 1, 1, 1, "A"),
            (1, 1, 2, 1, "A"),
            (2, 1, 3, 1, "A"),
            (3, 2, 4, 1, "A"),
            (4, 2, 5, 1, "A"),
            (5, 2, 6, 1, "A"),
            (6, 2, 7, 1, "A"),
            (7, 3, 1, 2, "B"),
            (8, 3, 2, 2, "B"),
            (9, 3, 3, 2, "B"),
            (10, 3, 4, 2, "B"),
        ];

        Self::from_generated(
            layout
                .into_iter()
                .map(|(id, section, column, row, label)| Seat {
                    id: SeatId::new(id),
                    section_id: SectionId::new(section),
                    row_id: RowId::new(row),
                    column_id: ColumnId::new(column),
                    row_label: label.to_string(),
                    column_label: column.to_string(),
                })
                .collect(),
        )
    }

    fn from_generated(seats: Vec<Seat>) -> Self {
        let index = seats.iter().enumerate().map(|(position, seat)| (seat.id, position)).collect();
        Self { seats, index }
    }

    /// Look up a seat by id
    #[must_use]
    pub fn get(&self, id: SeatId) -> Option<&Seat> {
        self.index.get(&id).and_then(|position| self.seats.get(*position))
    }

    /// Whether the catalog contains `id`
    #[must_use]
    pub fn contains(&self, id: SeatId) -> bool {
        self.index.contains_key(&id)
    }

    /// All seats in catalog order
    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Seat ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.seats.iter().map(|seat| seat.id)
    }

    /// Display label (`A4`) of a seat
    #[must_use]
    pub fn label(&self, id: SeatId) -> Option<String> {
        self.get(id).map(Seat::label)
    }

    /// Number of seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether the catalog has no seats
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

/// Spreadsheet-style row label: 0 → `A`, 25 → `Z`, 26 → `AA`
fn row_label(mut index: u32) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}
