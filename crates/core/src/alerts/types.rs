//! Alert types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Pending tax past its deposit due date.
    OverdueDeposit,
    /// Pending tax due within the horizon.
    UpcomingDeposit,
    /// Active rate whose validity ends within the horizon.
    ExpiringRate,
    /// Liable vendor without a PAN.
    MissingPan,
    /// Quarterly return due within the horizon.
    ReturnDue,
}

/// Alert severity. Orders most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Needs action now.
    High,
    /// Needs action soon.
    Medium,
    /// Informational.
    Low,
}

/// A computed compliance alert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Category.
    pub kind: AlertKind,
    /// Severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Relevant due date.
    pub due_date: Option<NaiveDate>,
    /// Related record: transaction ID, rate ID or quarter.
    pub reference: Option<String>,
    /// Related vendor.
    pub vendor_id: Option<String>,
    /// Amount at stake.
    pub amount: Option<Decimal>,
}

/// Alert counts by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCounts {
    /// High severity.
    pub high: u64,
    /// Medium severity.
    pub medium: u64,
    /// Low severity.
    pub low: u64,
}

/// Result of an alert run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertReport {
    /// Evaluation date.
    pub as_of: NaiveDate,
    /// Look-ahead in days.
    pub horizon_days: u32,
    /// Alerts, most severe first.
    pub alerts: Vec<Alert>,
    /// Counts by severity.
    pub counts: AlertCounts,
}
