//! Rate registry.
//!
//! - `types` - Rate records, frozen applied rates, patches and filters
//! - `registry` - Validation, overlap checks and applicable-rate lookup

pub mod registry;
pub mod types;

pub use registry::RateRegistry;
pub(crate) use registry::{check_rate_values, select_applicable};
pub use types::{AppliedRate, NewRate, RateFilter, RateListing, RatePatch, RateRecord};

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{NaiveDate, Utc};
    use kosh_shared::types::{CompanyId, RateId, UserId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::section::TaxKind;
    use crate::transaction::calculator::effective_rate;

    pub(crate) fn new_rate(kind: TaxKind, section: &str, rate: Decimal) -> NewRate {
        NewRate {
            kind,
            section: section.to_string(),
            nature: None,
            rate,
            surcharge_rate: Decimal::ZERO,
            education_cess_rate: Decimal::ZERO,
            valid_from: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
            valid_to: None,
            threshold_limit: Decimal::new(30_000, 0),
            pan_required: false,
            tan_required: false,
            description: None,
        }
    }

    pub(crate) fn record(kind: TaxKind, section: &str, rate: Decimal) -> RateRecord {
        let now = Utc::now();
        RateRecord {
            id: RateId::new(),
            company_id: CompanyId::new(),
            kind,
            section: section.to_string(),
            nature: None,
            rate,
            surcharge_rate: Decimal::ZERO,
            education_cess_rate: Decimal::ZERO,
            effective_rate: rate,
            valid_from: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
            valid_to: None,
            threshold_limit: Decimal::ZERO,
            pan_required: false,
            tan_required: false,
            is_active: true,
            description: None,
            created_by: UserId::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn applied_rate(rate: Decimal, threshold: Decimal) -> AppliedRate {
        AppliedRate {
            rate_id: RateId::new(),
            kind: TaxKind::Tds,
            section: "194C".to_string(),
            nature: None,
            rate,
            surcharge_rate: Decimal::ZERO,
            education_cess_rate: Decimal::ZERO,
            effective_rate: effective_rate(rate, Decimal::ZERO, Decimal::ZERO),
            threshold_limit: threshold,
            pan_required: false,
            tan_required: false,
        }
    }

    #[test]
    fn test_covers_is_inclusive() {
        let mut rate = record(TaxKind::Tds, "194C", Decimal::ONE);
        rate.valid_to = NaiveDate::from_ymd_opt(2024, 3, 31);
        assert!(rate.covers(NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()));
        assert!(rate.covers(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
        assert!(!rate.covers(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
        assert!(!rate.covers(NaiveDate::from_ymd_opt(2023, 3, 31).unwrap()));
    }

    #[test]
    fn test_open_ended_windows_overlap() {
        let rate = record(TaxKind::Tds, "194C", Decimal::ONE);
        assert!(rate.overlaps(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), None));
        assert!(!rate.overlaps(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 31)
        ));
    }

    #[test]
    fn test_filter_matches() {
        let rate = record(TaxKind::Tcs, "206C(1H)", Decimal::ONE);
        let filter = RateFilter {
            kind: Some(TaxKind::Tcs),
            active: Some(true),
            section: Some("206c(1h)".to_string()),
            applicable_on: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        assert!(filter.matches(&rate));
        let wrong_kind = RateFilter {
            kind: Some(TaxKind::Tds),
            ..RateFilter::default()
        };
        assert!(!wrong_kind.matches(&rate));
    }
}
