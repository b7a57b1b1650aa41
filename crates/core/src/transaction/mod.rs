//! Transaction calculator.
//!
//! - `types` - Transactions, statuses, breakdowns, bulk results
//! - `calculator` - Pure withholding arithmetic
//! - `service` - Resolution, persistence and guarded updates
//! - `bulk` - Parallel preview of a batch

mod bulk;
pub mod calculator;
pub mod service;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use service::{MAX_BULK_ITEMS, TransactionService};
pub use types::{
    BulkItem, BulkItemResult, BulkOutcome, BulkSummary, Calculation, CalculationBreakdown,
    ItemError, NewTransaction, PaymentType, TaxOutcome, TaxTransaction, TransactionFilter,
    TransactionPatch, TransactionStatus,
};

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{NaiveDate, Utc};
    use kosh_shared::types::{CompanyId, TransactionId, UserId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::period::deposit_due_date;
    use crate::rate::tests::applied_rate;
    use crate::section::TaxKind;

    pub(crate) fn new_transaction(vendor_id: &str, amount: Decimal) -> NewTransaction {
        NewTransaction {
            vendor_id: vendor_id.to_string(),
            transaction_type: "contractor_payment".to_string(),
            amount,
            transaction_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            section: None,
            pan_number: None,
            reference: None,
            payment_type: PaymentType::Normal,
            due_date: None,
        }
    }

    /// A Pending 194C transaction of 100,000 at 1% dated 2024-06-15.
    pub(crate) fn stored_transaction(company: CompanyId, vendor_id: &str) -> TaxTransaction {
        let applied = applied_rate(Decimal::ONE, Decimal::new(30_000, 0));
        let amount = Decimal::new(100_000, 0);
        let breakdown = calculator::breakdown(amount, &applied);
        let transaction_date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let now = Utc::now();
        TaxTransaction {
            id: TransactionId::new(),
            company_id: company,
            reference: None,
            vendor_id: vendor_id.to_string(),
            transaction_type: "contractor_payment".to_string(),
            kind: TaxKind::Tds,
            section: "194C".to_string(),
            applied_rate: Some(applied),
            amount,
            tax_amount: breakdown.tax_amount,
            outcome: TaxOutcome::Withheld,
            calculation_breakdown: breakdown,
            pan_number: Some("ABCPE1234F".to_string()),
            transaction_date,
            due_date: deposit_due_date(transaction_date),
            status: TransactionStatus::Pending,
            payment_type: PaymentType::Normal,
            created_by: UserId::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_transitions() {
        use TransactionStatus::{Cancelled, Completed, Pending};
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Pending));
        assert!(Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Completed));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            TransactionStatus::parse("Canceled"),
            Some(TransactionStatus::Cancelled)
        );
        assert_eq!(TransactionStatus::parse("posted"), None);
    }
}
