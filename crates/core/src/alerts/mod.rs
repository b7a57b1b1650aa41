//! Compliance alerts, computed on request.

pub mod service;
pub mod types;

pub use service::{AlertService, MAX_HORIZON_DAYS};
pub use types::{Alert, AlertCounts, AlertKind, AlertReport, Severity};
