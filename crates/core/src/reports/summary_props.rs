//! Property-based tests for summaries.
//!
//! - Group totals add up to the overall totals for every grouping
//! - Groups are ordered by key and keys are unique
//! - Compliance score stays within 0 to 100

use chrono::NaiveDate;
use kosh_shared::types::CompanyId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::{compliance_score, summarize, totals};
use super::types::SummaryBy;
use crate::transaction::tests::stored_transaction;
use crate::transaction::{TaxOutcome, TaxTransaction, TransactionStatus};

fn transaction() -> impl Strategy<Value = TaxTransaction> {
    (
        0usize..4,
        0usize..3,
        1u32..=12,
        0i64..10_000_000,
        0usize..3,
        any::<bool>(),
    )
        .prop_map(|(vendor, section, month, paise, status, below)| {
            let mut tx = stored_transaction(CompanyId::new(), &format!("V{vendor:03}"));
            tx.section = ["194C", "194J", "194H"][section].to_string();
            tx.transaction_date = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
            tx.amount = Decimal::new(paise, 2);
            tx.tax_amount = if below {
                Decimal::ZERO
            } else {
                Decimal::new(paise / 100, 2)
            };
            tx.outcome = if below {
                TaxOutcome::BelowThreshold
            } else {
                TaxOutcome::Withheld
            };
            tx.status = [
                TransactionStatus::Pending,
                TransactionStatus::Completed,
                TransactionStatus::Cancelled,
            ][status];
            tx
        })
}

fn grouping() -> impl Strategy<Value = SummaryBy> {
    prop_oneof![
        Just(SummaryBy::Section),
        Just(SummaryBy::Vendor),
        Just(SummaryBy::Month),
        Just(SummaryBy::Status),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_groups_add_up(txs in prop::collection::vec(transaction(), 0..60), by in grouping()) {
        let overall = totals(&txs);
        let groups = summarize(&txs, by);

        prop_assert_eq!(groups.iter().map(|g| g.count).sum::<u64>(), overall.count);
        prop_assert_eq!(
            groups.iter().map(|g| g.total_amount).sum::<Decimal>(),
            overall.total_amount
        );
        prop_assert_eq!(
            groups.iter().map(|g| g.total_tax).sum::<Decimal>(),
            overall.total_tax
        );
        prop_assert_eq!(
            groups.iter().map(|g| g.below_threshold_count).sum::<u64>(),
            overall.below_threshold_count
        );
    }

    #[test]
    fn prop_groups_sorted_unique(txs in prop::collection::vec(transaction(), 0..60), by in grouping()) {
        let groups = summarize(&txs, by);
        for pair in groups.windows(2) {
            prop_assert!(pair[0].key < pair[1].key);
        }
    }

    #[test]
    fn prop_score_in_range(total in 0u64..10_000, overdue in 0u64..10_000) {
        let overdue = overdue.min(total);
        let score = compliance_score(total, overdue);
        prop_assert!(score >= Decimal::ZERO);
        prop_assert!(score <= Decimal::ONE_HUNDRED);
    }
}
