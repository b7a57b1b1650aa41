//! Multi-step workflows.
//!
//! - Invoice processing: record the withholding on an invoice and report the
//!   net payable
//! - Rate change: close the current rate, open its successor and report the
//!   pending transactions that keep the old frozen rate

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{WorkflowService, net_payable};
pub use types::{
    AffectedTransaction, InvoiceInput, InvoiceOutcome, RateChange, RateChangeImpact,
    RateChangeOutcome, StepStatus, WorkflowStep,
};
