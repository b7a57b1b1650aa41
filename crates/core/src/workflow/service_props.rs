//! Property-based tests for workflow arithmetic.
//!
//! - TDS net payable plus tax gives back the gross
//! - TCS net receivable less tax gives back the gross
//! - Net payable never exceeds gross for TDS and never falls below it for TCS

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::net_payable;
use crate::rate::tests::applied_rate;
use crate::section::TaxKind;
use crate::transaction::calculator::breakdown;

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|paise| Decimal::new(paise, 2))
}

fn percent() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|v| Decimal::new(v, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_net_payable_round_trips(gross in amount(), r in percent()) {
        let tax = breakdown(gross, &applied_rate(r, Decimal::ZERO)).tax_amount;

        let tds = net_payable(TaxKind::Tds, gross, tax);
        prop_assert_eq!(tds + tax, gross);
        prop_assert!(tds >= Decimal::ZERO);

        let tcs = net_payable(TaxKind::Tcs, gross, tax);
        prop_assert_eq!(tcs - tax, gross);
        prop_assert!(tcs >= gross);
    }
}
