//! Display-ready seat plan.
//!
//! [`project`] turns the catalog plus the current availability and selection
//! into rows of sections of `{seatId, status}` entries. It keeps no state and
//! is recomputed from scratch whenever the host wants to re-render.

use crate::availability::AvailabilitySnapshot;
use crate::catalog::SeatCatalog;
use crate::selection::SelectedSeats;
use crate::types::{RowId, SeatId, SeatStatus, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether free seats next to unavailable ones are flagged as `DISTANCING`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistancingPolicy {
    /// Flag neighbours of unavailable seats
    #[default]
    Enabled,
    /// Plain `AVAILABLE` / `SELECTED` / `UNAVAILABLE`
    Disabled,
}

impl From<bool> for DistancingPolicy {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }
}

/// One seat and how to show it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatPlanEntry {
    /// The seat
    pub seat_id: SeatId,
    /// Its display status
    pub status: SeatStatus,
}

/// Seats of one section, in catalog order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPlan {
    /// Section id
    pub section_id: SectionId,
    /// Entries left to right
    pub entries: Vec<SeatPlanEntry>,
}

/// Sections of one row, in catalog order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPlan {
    /// Row id
    pub row_id: RowId,
    /// Row label of the first seat seen in this row
    pub row_label: String,
    /// Sections left to right
    pub sections: Vec<SectionPlan>,
}

/// Seats per status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    /// `AVAILABLE` seats
    pub available: usize,
    /// `SELECTED` seats
    pub selected: usize,
    /// `UNAVAILABLE` seats
    pub unavailable: usize,
    /// `DISTANCING` seats
    pub distancing: usize,
}

/// The grouped seat plan
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatPlan {
    /// Rows in catalog order
    pub rows: Vec<RowPlan>,
}

impl SeatPlan {
    /// Every entry, row by row, section by section
    pub fn entries(&self) -> impl Iterator<Item = &SeatPlanEntry> + '_ {
        self.rows
            .iter()
            .flat_map(|row| row.sections.iter())
            .flat_map(|section| section.entries.iter())
    }

    /// Status of one seat, `None` if it is not in the plan
    #[must_use]
    pub fn status_of(&self, seat_id: SeatId) -> Option<SeatStatus> {
        self.entries()
            .find(|entry| entry.seat_id == seat_id)
            .map(|entry| entry.status)
    }

    /// How many seats are in each status
    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        self.entries().fold(StatusCounts::default(), |mut counts, entry| {
            match entry.status {
                SeatStatus::Available => counts.available += 1,
                SeatStatus::Selected => counts.selected += 1,
                SeatStatus::Unavailable => counts.unavailable += 1,
                SeatStatus::Distancing => counts.distancing += 1,
            }
            counts
        })
    }
}

/// Project catalog, availability and selection into a [`SeatPlan`]
///
/// Rows and sections appear in the order their first seat appears in the
/// catalog. A selected seat shows as `SELECTED` even if it is also in
/// `unavailable` (the engine never lets that happen). With distancing
/// enabled, an `AVAILABLE` seat whose left or right neighbour in the same
/// section is `UNAVAILABLE` becomes `DISTANCING`.
#[must_use]
pub fn project(
    catalog: &SeatCatalog,
    unavailable: &AvailabilitySnapshot,
    selected: &SelectedSeats,
    distancing: DistancingPolicy,
) -> SeatPlan {
    let mut rows: Vec<RowPlan> = Vec::new();
    let mut row_index: HashMap<RowId, usize> = HashMap::new();
    let mut section_index: HashMap<(RowId, SectionId), usize> = HashMap::new();

    for seat in catalog.seats() {
        let row_position = *row_index.entry(seat.row_id).or_insert_with(|| {
            rows.push(RowPlan {
                row_id: seat.row_id,
                row_label: seat.row_label.clone(),
                sections: Vec::new(),
            });
            rows.len() - 1
        });
        let row = &mut rows[row_position];

        let section_position = *section_index
            .entry((seat.row_id, seat.section_id))
            .or_insert_with(|| {
                row.sections.push(SectionPlan {
                    section_id: seat.section_id,
                    entries: Vec::new(),
                });
                row.sections.len() - 1
            });

        row.sections[section_position].entries.push(SeatPlanEntry {
            seat_id: seat.id,
            status: base_status(seat.id, unavailable, selected),
        });
    }

    if distancing == DistancingPolicy::Enabled {
        for section in rows.iter_mut().flat_map(|row| row.sections.iter_mut()) {
            mark_distancing(&mut section.entries);
        }
    }

    SeatPlan { rows }
}

fn base_status(seat_id: SeatId, unavailable: &AvailabilitySnapshot, selected: &SelectedSeats) -> SeatStatus {
    if selected.contains(seat_id) {
        SeatStatus::Selected
    } else if unavailable.contains(seat_id) {
        SeatStatus::Unavailable
    } else {
        SeatStatus::Available
    }
}

/// Upgrade `AVAILABLE` entries next to an `UNAVAILABLE` one
///
/// Decided on base statuses only, so a `DISTANCING` seat never spreads.
fn mark_distancing(entries: &mut [SeatPlanEntry]) {
    let blocked: Vec<bool> = entries
        .iter()
        .map(|entry| entry.status == SeatStatus::Unavailable)
        .collect();

    for (position, entry) in entries.iter_mut().enumerate() {
        if entry.status != SeatStatus::Available {
            continue;
        }
        let left = position.checked_sub(1).is_some_and(|left| blocked[left]);
        let right = blocked.get(position + 1).copied().unwrap_or(false);
        if left || right {
            entry.status = SeatStatus::Distancing;
        }
    }
}
