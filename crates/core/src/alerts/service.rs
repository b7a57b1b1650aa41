//! On-demand alert generation.

use chrono::{Days, NaiveDate};
use kosh_shared::types::CompanyId;
use rust_decimal::Decimal;
use tracing::debug;

use super::types::{Alert, AlertCounts, AlertKind, AlertReport, Severity};
use crate::engine::EngineConfig;
use crate::error::TaxError;
use crate::rate::RateFilter;
use crate::repository::Repositories;
use crate::reports::upcoming_returns;
use crate::transaction::{TransactionFilter, TransactionStatus};
use crate::vendor::VendorFilter;

/// Longest accepted look-ahead.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Alert operations.
pub struct AlertService<'a> {
    repos: &'a Repositories,
    config: &'a EngineConfig,
}

impl<'a> AlertService<'a> {
    /// Creates the service view.
    #[must_use]
    pub fn new(repos: &'a Repositories, config: &'a EngineConfig) -> Self {
        Self { repos, config }
    }

    /// Computes alerts as of `as_of`, looking `horizon_days` ahead.
    ///
    /// The horizon defaults to the configured one.
    pub async fn generate(
        &self,
        company: CompanyId,
        as_of: NaiveDate,
        horizon_days: Option<u32>,
    ) -> Result<AlertReport, TaxError> {
        let horizon_days = horizon_days.unwrap_or(self.config.alert_horizon_days);
        if horizon_days > MAX_HORIZON_DAYS {
            return Err(TaxError::Validation(format!(
                "horizonDays must be at most {MAX_HORIZON_DAYS}"
            )));
        }
        let horizon_end = as_of
            .checked_add_days(Days::new(u64::from(horizon_days)))
            .unwrap_or(NaiveDate::MAX);

        let mut alerts = Vec::new();

        let pending = self
            .repos
            .transactions
            .list(
                company,
                &TransactionFilter {
                    status: Some(TransactionStatus::Pending),
                    ..TransactionFilter::default()
                },
            )
            .await?;
        for tx in pending.iter().filter(|t| t.tax_amount > Decimal::ZERO) {
            if tx.due_date < as_of {
                alerts.push(Alert {
                    kind: AlertKind::OverdueDeposit,
                    severity: Severity::High,
                    message: format!(
                        "{} of {} under section {} for vendor {} was due on {}",
                        tx.kind.label(),
                        tx.tax_amount,
                        tx.section,
                        tx.vendor_id,
                        tx.due_date
                    ),
                    due_date: Some(tx.due_date),
                    reference: Some(tx.id.to_string()),
                    vendor_id: Some(tx.vendor_id.clone()),
                    amount: Some(tx.tax_amount),
                });
            } else if tx.due_date <= horizon_end {
                alerts.push(Alert {
                    kind: AlertKind::UpcomingDeposit,
                    severity: Severity::Medium,
                    message: format!(
                        "{} of {} for vendor {} is due on {}",
                        tx.kind.label(),
                        tx.tax_amount,
                        tx.vendor_id,
                        tx.due_date
                    ),
                    due_date: Some(tx.due_date),
                    reference: Some(tx.id.to_string()),
                    vendor_id: Some(tx.vendor_id.clone()),
                    amount: Some(tx.tax_amount),
                });
            }
        }

        let rates = self
            .repos
            .rates
            .list(
                company,
                &RateFilter {
                    active: Some(true),
                    ..RateFilter::default()
                },
            )
            .await?;
        for rate in &rates {
            if let Some(valid_to) = rate.valid_to
                && valid_to >= as_of
                && valid_to <= horizon_end
            {
                alerts.push(Alert {
                    kind: AlertKind::ExpiringRate,
                    severity: Severity::Medium,
                    message: format!(
                        "{} rate for section {} expires on {valid_to}",
                        rate.kind.label(),
                        rate.section
                    ),
                    due_date: Some(valid_to),
                    reference: Some(rate.id.to_string()),
                    vendor_id: None,
                    amount: None,
                });
            }
        }

        let vendors = self
            .repos
            .vendors
            .list(
                company,
                &VendorFilter {
                    active: Some(true),
                    ..VendorFilter::default()
                },
            )
            .await?;
        for vendor in vendors
            .iter()
            .filter(|v| v.pan_number.is_none() && (v.tds_applicable || v.tcs_applicable))
        {
            alerts.push(Alert {
                kind: AlertKind::MissingPan,
                severity: Severity::High,
                message: format!(
                    "vendor {} ({}) is liable for withholding but has no PAN",
                    vendor.vendor_id, vendor.name
                ),
                due_date: None,
                reference: None,
                vendor_id: Some(vendor.vendor_id.clone()),
                amount: None,
            });
        }

        for upcoming in upcoming_returns(as_of)
            .into_iter()
            .filter(|u| u.due_date <= horizon_end)
        {
            alerts.push(Alert {
                kind: AlertKind::ReturnDue,
                severity: Severity::Medium,
                message: format!(
                    "Form {} for {} is due on {} ({} days)",
                    upcoming.form, upcoming.quarter, upcoming.due_date, upcoming.days_remaining
                ),
                due_date: Some(upcoming.due_date),
                reference: Some(upcoming.quarter.to_string()),
                vendor_id: None,
                amount: None,
            });
        }

        alerts.sort_by_key(|a| (a.severity, a.due_date.unwrap_or(NaiveDate::MAX)));

        let mut counts = AlertCounts::default();
        for alert in &alerts {
            match alert.severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }

        debug!(
            company_id = %company,
            as_of = %as_of,
            high = counts.high,
            medium = counts.medium,
            "alerts generated"
        );

        Ok(AlertReport {
            as_of,
            horizon_days,
            alerts,
            counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Actor;
    use crate::engine::tests::test_engine;
    use crate::rate::tests::new_rate;
    use crate::rate::NewRate;
    use crate::section::TaxKind;
    use crate::transaction::tests::new_transaction;
    use crate::vendor::NewVendor;
    use crate::vendor::tests::new_vendor;
    use kosh_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_alerts_sorted_by_severity() {
        let engine = test_engine();
        let actor = Actor::new(CompanyId::new(), UserId::new());
        engine
            .rates()
            .add_rate(
                &actor,
                NewRate {
                    valid_to: Some(date(2024, 7, 20)),
                    ..new_rate(TaxKind::Tds, "194C", dec!(1))
                },
            )
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

        // June transaction: deposit due 2024-07-07
        engine
            .transactions()
            .create(&actor, new_transaction("V001", dec!(100000)))
            .await
            .unwrap();
        // July transaction: deposit due 2024-08-07
        let mut july = new_transaction("V001", dec!(80000));
        july.transaction_date = date(2024, 7, 2);
        engine.transactions().create(&actor, july).await.unwrap();

        let report = engine
            .alerts()
            .generate(actor.company_id, date(2024, 7, 10), Some(30))
            .await
            .unwrap();

        let kinds: Vec<_> = report.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            [
                AlertKind::OverdueDeposit,
                AlertKind::MissingPan,
                AlertKind::ExpiringRate,
                AlertKind::ReturnDue,
                AlertKind::ReturnDue,
                AlertKind::UpcomingDeposit,
            ]
        );
        assert_eq!(report.counts.high, 2);
        assert_eq!(report.counts.medium, 4);
        assert_eq!(report.alerts[0].amount, Some(dec!(1000)));
    }

    #[tokio::test]
    async fn test_default_horizon_and_limit() {
        let engine = test_engine();
        let company = CompanyId::new();
        let report = engine
            .alerts()
            .generate(company, date(2024, 9, 1), None)
            .await
            .unwrap();
        assert_eq!(report.horizon_days, 15);
        assert!(report.alerts.is_empty());

        let err = engine
            .alerts()
            .generate(company, date(2024, 9, 1), Some(MAX_HORIZON_DAYS + 1))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }
}
