//! Common utilities and shared types for ecowatch.
//!
//! This crate provides foundational components used across all ecowatch crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Geography**: Coordinates, bounding boxes and great-circle distance via [`geo`]
//! - **Severity**: The 1-5 severity scale and its labels via [`Severity`]
//! - **Metrics**: Process-wide counters via [`Metrics`]
//!
//! # Example
//!
//! ```
//! use ecowatch_common::geo::Coordinates;
//!
//! let here = Coordinates::new(40.7128, -74.006);
//! assert_eq!(here.distance_to(&here), 0.0);
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod metrics;
pub mod severity;

pub use config::Config;
pub use error::{AcquisitionKind, AppError, AppResult};
pub use geo::{BoundingBox, Coordinates};
pub use metrics::{Metrics, MetricsSnapshot, get_metrics};
pub use severity::{Severity, SeverityLabel};
