//! Report generation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use kosh_shared::types::CompanyId;
use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{
    CertificateCompliance, ComplianceStatus, SummaryBy, SummaryGroup, SummaryTotals, TaxSummary,
    TransactionCompliance, UpcomingReturn, VendorCompliance,
};
use crate::certificate::{CertificateFilter, CertificateStatus};
use crate::engine::EngineConfig;
use crate::error::TaxError;
use crate::period::FinancialQuarter;
use crate::repository::Repositories;
use crate::section::TaxKind;
use crate::transaction::{TaxOutcome, TaxTransaction, TransactionFilter, TransactionStatus};
use crate::vendor::VendorFilter;

/// Groups transactions by `by`, ordered by key.
#[must_use]
pub fn summarize(transactions: &[TaxTransaction], by: SummaryBy) -> Vec<SummaryGroup> {
    let mut groups: BTreeMap<String, SummaryGroup> = BTreeMap::new();
    for tx in transactions {
        let key = match by {
            SummaryBy::Section => tx.section.clone(),
            SummaryBy::Vendor => tx.vendor_id.clone(),
            SummaryBy::Month => tx.transaction_date.format("%Y-%m").to_string(),
            SummaryBy::Status => tx.status.as_str().to_string(),
        };
        let group = groups.entry(key.clone()).or_insert_with(|| SummaryGroup {
            key,
            count: 0,
            total_amount: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            below_threshold_count: 0,
        });
        group.count += 1;
        group.total_amount += tx.amount;
        group.total_tax += tx.tax_amount;
        if tx.outcome == TaxOutcome::BelowThreshold {
            group.below_threshold_count += 1;
        }
    }
    groups.into_values().collect()
}

/// Totals over all transactions.
#[must_use]
pub fn totals(transactions: &[TaxTransaction]) -> SummaryTotals {
    transactions
        .iter()
        .fold(SummaryTotals::default(), |mut acc, tx| {
            acc.count += 1;
            acc.total_amount += tx.amount;
            acc.total_tax += tx.tax_amount;
            if tx.outcome == TaxOutcome::BelowThreshold {
                acc.below_threshold_count += 1;
            }
            acc
        })
}

/// Share of non-cancelled transactions that are not overdue, in percent.
///
/// 100 when there is nothing to be late on.
#[must_use]
pub fn compliance_score(non_cancelled: u64, overdue: u64) -> Decimal {
    if non_cancelled == 0 {
        return Decimal::ONE_HUNDRED;
    }
    let on_time = Decimal::from(non_cancelled.saturating_sub(overdue));
    (on_time * Decimal::ONE_HUNDRED / Decimal::from(non_cancelled))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns due on or after `as_of` for the current and previous quarter.
#[must_use]
pub fn upcoming_returns(as_of: NaiveDate) -> Vec<UpcomingReturn> {
    let current = FinancialQuarter::containing(as_of);
    let mut upcoming = Vec::new();
    for quarter in [current.previous(), current] {
        let due_date = quarter.return_due_date();
        if due_date < as_of {
            continue;
        }
        for kind in [TaxKind::Tds, TaxKind::Tcs] {
            upcoming.push(UpcomingReturn {
                kind,
                form: kind.return_form().to_string(),
                quarter,
                due_date,
                days_remaining: (due_date - as_of).num_days(),
            });
        }
    }
    upcoming
}

/// Report operations.
pub struct ReportService<'a> {
    repos: &'a Repositories,
}

impl<'a> ReportService<'a> {
    /// Creates the service view.
    #[must_use]
    pub fn new(repos: &'a Repositories, _config: &'a EngineConfig) -> Self {
        Self { repos }
    }

    /// TDS or TCS summary over a date range. Cancelled transactions are left out.
    pub async fn tax_summary(
        &self,
        company: CompanyId,
        kind: TaxKind,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        group_by: SummaryBy,
    ) -> Result<TaxSummary, TaxError> {
        if let (Some(start), Some(end)) = (from, to)
            && start > end
        {
            return Err(TaxError::InvalidPeriod { start, end });
        }

        let filter = TransactionFilter {
            kind: Some(kind),
            from,
            to,
            ..TransactionFilter::default()
        };
        let transactions: Vec<TaxTransaction> = self
            .repos
            .transactions
            .list(company, &filter)
            .await?
            .into_iter()
            .filter(|t| t.status != TransactionStatus::Cancelled)
            .collect();

        Ok(TaxSummary {
            report_type: format!("{}_summary", kind.as_str()),
            kind: Some(kind),
            from,
            to,
            group_by,
            totals: totals(&transactions),
            groups: summarize(&transactions, group_by),
        })
    }

    /// Compliance snapshot as of `as_of`.
    pub async fn compliance_status(
        &self,
        company: CompanyId,
        as_of: NaiveDate,
    ) -> Result<ComplianceStatus, TaxError> {
        let vendors = self
            .repos
            .vendors
            .list(company, &VendorFilter::default())
            .await?;
        let mut vendor_counts = VendorCompliance::default();
        for vendor in &vendors {
            vendor_counts.total += 1;
            if vendor.is_active {
                vendor_counts.active += 1;
                if vendor.pan_number.is_none() && (vendor.tds_applicable || vendor.tcs_applicable)
                {
                    vendor_counts.missing_pan += 1;
                }
            }
            if vendor.pan_category_mismatch() {
                vendor_counts.pan_category_mismatch += 1;
            }
        }

        let transactions = self
            .repos
            .transactions
            .list(company, &TransactionFilter::default())
            .await?;
        let mut tx_counts = TransactionCompliance::default();
        for tx in &transactions {
            tx_counts.total += 1;
            match tx.status {
                TransactionStatus::Pending => {
                    tx_counts.pending += 1;
                    if tx.due_date < as_of {
                        tx_counts.overdue += 1;
                        tx_counts.overdue_tax += tx.tax_amount;
                    }
                }
                TransactionStatus::Completed => tx_counts.completed += 1,
                TransactionStatus::Cancelled => tx_counts.cancelled += 1,
            }
        }

        let certificates = self
            .repos
            .certificates
            .list(company, &CertificateFilter::default())
            .await?;
        let certificate_counts = CertificateCompliance {
            issued: certificates.len() as u64,
            delivered: certificates.iter().filter(|c| c.delivery_count > 0).count() as u64,
            revoked: certificates
                .iter()
                .filter(|c| c.status == CertificateStatus::Revoked)
                .count() as u64,
        };

        let compliance_score =
            compliance_score(tx_counts.total - tx_counts.cancelled, tx_counts.overdue);

        Ok(ComplianceStatus {
            as_of,
            vendors: vendor_counts,
            transactions: tx_counts,
            certificates: certificate_counts,
            upcoming_returns: upcoming_returns(as_of),
            compliance_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Actor;
    use crate::engine::tests::test_engine;
    use crate::rate::tests::new_rate;
    use crate::transaction::TransactionPatch;
    use crate::transaction::tests::new_transaction;
    use crate::vendor::tests::new_vendor;
    use crate::vendor::{NewVendor, VendorCategory};
    use kosh_shared::types::UserId;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(0, 0, dec!(100))]
    #[case(4, 1, dec!(75))]
    #[case(3, 1, dec!(66.67))]
    #[case(3, 3, dec!(0))]
    fn test_compliance_score(#[case] total: u64, #[case] overdue: u64, #[case] expected: Decimal) {
        assert_eq!(compliance_score(total, overdue), expected);
    }

    #[test]
    fn test_upcoming_returns_includes_previous_quarter() {
        let upcoming = upcoming_returns(date(2024, 7, 10));
        let quarters: Vec<_> = upcoming.iter().map(|u| u.quarter.to_string()).collect();
        assert_eq!(
            quarters,
            ["2024-25/Q1", "2024-25/Q1", "2024-25/Q2", "2024-25/Q2"]
        );
        assert_eq!(upcoming[0].days_remaining, 21);
        assert_eq!(upcoming[1].form, "27EQ");

        let later = upcoming_returns(date(2024, 8, 1));
        assert!(later.iter().all(|u| u.quarter.to_string() == "2024-25/Q2"));
    }

    #[tokio::test]
    async fn test_tds_summary_by_section_skips_cancelled() {
        let engine = test_engine();
        let actor = Actor::new(CompanyId::new(), UserId::new());
        engine
            .rates()
            .add_rate(&actor, new_rate(TaxKind::Tds, "194C", dec!(1)))
            .await
            .unwrap();
        engine.vendors().create(&actor, new_vendor("V001")).await.unwrap();

        let service = engine.transactions();
        service.create(&actor, new_transaction("V001", dec!(150000))).await.unwrap();
        service.create(&actor, new_transaction("V001", dec!(25000))).await.unwrap();
        let cancelled = service
            .create(&actor, new_transaction("V001", dec!(90000)))
            .await
            .unwrap();
        service
            .update(
                &actor,
                cancelled.id,
                TransactionPatch {
                    status: Some(TransactionStatus::Cancelled),
                    ..TransactionPatch::default()
                },
            )
            .await
            .unwrap();

        let summary = engine
            .reports()
            .tax_summary(actor.company_id, TaxKind::Tds, None, None, SummaryBy::Section)
            .await
            .unwrap();

        assert_eq!(summary.report_type, "tds_summary");
        assert_eq!(summary.totals.count, 2);
        assert_eq!(summary.totals.total_tax, dec!(1500));
        assert_eq!(summary.totals.below_threshold_count, 1);
        assert_eq!(summary.groups.len(), 1);
        assert_eq!(summary.groups[0].key, "194C");
    }

    #[tokio::test]
    async fn test_compliance_status_counts_overdue() {
        let engine = test_engine();
        let actor = Actor::new(CompanyId::new(), UserId::new());
        engine
            .rates()
            .add_rate(&actor, new_rate(TaxKind::Tds, "194C", dec!(1)))
            .await
            .unwrap();
        engine.vendors().create(&actor, new_vendor("V001")).await.unwrap();
        engine
            .vendors()
            .create(
                &actor,
                NewVendor {
                    pan_number: None,
                    ..new_vendor("V002")
                },
            )
            .await
            .unwrap();
        engine
            .vendors()
            .create(
                &actor,
                NewVendor {
                    category: VendorCategory::Corporate,
                    ..new_vendor("V003")
                },
            )
            .await
            .unwrap();

        let service = engine.transactions();
        // due 2024-07-07
        service.create(&actor, new_transaction("V001", dec!(100000))).await.unwrap();
        let completed = service
            .create(&actor, new_transaction("V001", dec!(200000)))
            .await
            .unwrap();
        service
            .update(
                &actor,
                completed.id,
                TransactionPatch {
                    status: Some(TransactionStatus::Completed),
                    ..TransactionPatch::default()
                },
            )
            .await
            .unwrap();

        let status = engine
            .reports()
            .compliance_status(actor.company_id, date(2024, 7, 20))
            .await
            .unwrap();

        assert_eq!(status.vendors.total, 3);
        assert_eq!(status.vendors.missing_pan, 1);
        assert_eq!(status.vendors.pan_category_mismatch, 1);
        assert_eq!(status.transactions.overdue, 1);
        assert_eq!(status.transactions.overdue_tax, dec!(1000));
        assert_eq!(status.compliance_score, dec!(50));
    }
}
