//! Configuration for the seat picker host.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::catalog::SeatCatalog;
use crate::error::CatalogError;
use crate::feed::PollSchedule;
use crate::plan::DistancingPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Host configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Availability feed configuration
    pub feed: FeedConfig,
    /// Seat catalog configuration
    pub catalog: CatalogConfig,
    /// Flag seats next to unavailable ones
    pub distancing: bool,
    /// How long to wait for pending effects on shutdown, in seconds
    pub shutdown_timeout_secs: u64,
}

/// Availability feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Delay between successful polls in milliseconds (default: 5000)
    pub poll_interval_ms: u64,
    /// Delay after the first failed poll in milliseconds (default: 500)
    pub backoff_initial_ms: u64,
    /// Upper bound for the failure delay in milliseconds (default: 30000)
    pub backoff_max_ms: u64,
    /// Backoff growth per consecutive failure (default: 2.0)
    pub backoff_multiplier: f64,
    /// Share of seats the simulated feed marks unavailable at start (default: 0.25)
    pub unavailable_ratio: f64,
    /// Seed for the simulated feed; random when unset
    pub seed: Option<u64>,
}

/// Seat catalog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog file; a generated auditorium is used when unset
    pub path: Option<PathBuf>,
    /// Rows of the generated auditorium (default: 8)
    pub rows: u32,
    /// Sections per row of the generated auditorium (default: 3)
    pub sections_per_row: u32,
    /// Seats per section of the generated auditorium (default: 6)
    pub seats_per_section: u32,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            feed: FeedConfig {
                poll_interval_ms: env::var("SEAT_PICKER_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
                backoff_initial_ms: env::var("SEAT_PICKER_BACKOFF_INITIAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
                backoff_max_ms: env::var("SEAT_PICKER_BACKOFF_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30_000),
                backoff_multiplier: env::var("SEAT_PICKER_BACKOFF_MULTIPLIER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2.0),
                unavailable_ratio: env::var("SEAT_PICKER_UNAVAILABLE_RATIO")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.25),
                seed: env::var("SEAT_PICKER_FEED_SEED").ok().and_then(|s| s.parse().ok()),
            },
            catalog: CatalogConfig {
                path: env::var("SEAT_PICKER_CATALOG").ok().map(PathBuf::from),
                rows: env::var("SEAT_PICKER_ROWS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8),
                sections_per_row: env::var("SEAT_PICKER_SECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
                seats_per_section: env::var("SEAT_PICKER_SEATS_PER_SECTION")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(6),
            },
            distancing: env::var("SEAT_PICKER_DISTANCING")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            shutdown_timeout_secs: env::var("SEAT_PICKER_SHUTDOWN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }

    /// Poll schedule for the reducer environment
    #[must_use]
    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule {
            interval: Duration::from_millis(self.feed.poll_interval_ms),
            backoff_initial: Duration::from_millis(self.feed.backoff_initial_ms),
            backoff_max: Duration::from_millis(self.feed.backoff_max_ms),
            multiplier: self.feed.backoff_multiplier,
        }
    }

    /// Distancing policy for the seat plan
    #[must_use]
    pub fn distancing_policy(&self) -> DistancingPolicy {
        DistancingPolicy::from(self.distancing)
    }

    /// Shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Load the configured catalog file, or generate the auditorium
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the configured file cannot be loaded.
    pub fn load_catalog(&self) -> Result<SeatCatalog, CatalogError> {
        match &self.catalog.path {
            Some(path) => SeatCatalog::from_path(path),
            None => Ok(SeatCatalog::uniform(
                self.catalog.rows,
                self.catalog.sections_per_row,
                self.catalog.seats_per_section,
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                poll_interval_ms: 5000,
                backoff_initial_ms: 500,
                backoff_max_ms: 30_000,
                backoff_multiplier: 2.0,
                unavailable_ratio: 0.25,
                seed: None,
            },
            catalog: CatalogConfig {
                path: None,
                rows: 8,
                sections_per_row: 3,
                seats_per_section: 6,
            },
            distancing: true,
            shutdown_timeout_secs: 5,
        }
    }
}
