//! Property-based tests for the withholding calculator.
//!
//! - Effective rate equals the surcharge-then-cess formula
//! - Amounts below the threshold never attract tax
//! - Tax is rounded to paise and never negative
//! - Bulk results do not depend on item order

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::bulk;
use super::calculator::{breakdown, effective_rate, round_amount};
use super::types::BulkItem;
use crate::engine::tests::test_config;
use crate::rate::tests::{applied_rate, record};
use crate::section::TaxKind;
use crate::vendor::tests::sample_vendor;

/// Percentages 0.00 to 100.00.
fn percent() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|v| Decimal::new(v, 2))
}

/// Amounts 0.00 to 10,000,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|paise| Decimal::new(paise, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_effective_rate_formula(r in percent(), s in percent(), c in percent()) {
        let hundred = Decimal::ONE_HUNDRED;
        let subtotal = r + r * s / hundred;
        prop_assert_eq!(effective_rate(r, s, c), subtotal + subtotal * c / hundred);
        prop_assert!(effective_rate(r, s, c) >= r);
    }

    #[test]
    fn prop_below_threshold_is_untaxed(r in percent(), threshold in amount(), amount in amount()) {
        prop_assume!(amount < threshold);
        let result = breakdown(amount, &applied_rate(r, threshold));
        prop_assert_eq!(result.tax_amount, Decimal::ZERO);
        prop_assert!(result.is_below_threshold);
    }

    #[test]
    fn prop_tax_rounded_and_non_negative(r in percent(), amount in amount()) {
        let applied = applied_rate(r, Decimal::ZERO);
        let result = breakdown(amount, &applied);
        prop_assert!(result.tax_amount >= Decimal::ZERO);
        prop_assert!(result.tax_amount.scale() <= 2);
        prop_assert_eq!(
            result.tax_amount,
            round_amount(amount * applied.effective_rate / Decimal::ONE_HUNDRED)
        );
        prop_assert!(result.tax_amount <= round_amount(amount));
    }

    #[test]
    fn prop_zero_amount_zero_tax(r in percent(), s in percent(), c in percent()) {
        let mut applied = applied_rate(r, Decimal::ZERO);
        applied.surcharge_rate = s;
        applied.education_cess_rate = c;
        applied.effective_rate = effective_rate(r, s, c);
        prop_assert_eq!(breakdown(Decimal::ZERO, &applied).tax_amount, Decimal::ZERO);
    }

    #[test]
    fn prop_bulk_order_independent(amounts in prop::collection::vec(amount(), 1..40)) {
        let config = test_config();
        let mut vendors = HashMap::new();
        vendors.insert("V001".to_string(), sample_vendor("V001"));
        let mut rate = record(TaxKind::Tds, "194C", Decimal::new(2, 0));
        rate.threshold_limit = Decimal::new(30_000, 0);
        let rates = vec![rate];

        let items: Vec<BulkItem> = amounts
            .iter()
            .map(|&amount| BulkItem {
                vendor_id: "V001".to_string(),
                transaction_type: "contractor_payment".to_string(),
                amount,
                transaction_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                section: None,
                pan_number: None,
            })
            .collect();
        let mut reversed = items.clone();
        reversed.reverse();

        let forward = bulk::run(&config, &vendors, &rates, &items);
        let backward = bulk::run(&config, &vendors, &rates, &reversed);

        prop_assert_eq!(forward.summary.total_tax, backward.summary.total_tax);
        let n = items.len();
        for (i, result) in forward.results.iter().enumerate() {
            prop_assert_eq!(result.index, i);
            prop_assert_eq!(&result.calculation, &backward.results[n - 1 - i].calculation);
        }
    }
}
