//! Multi-step workflows over the registries and the calculator.

use chrono::{Days, NaiveDate};
use kosh_shared::types::CompanyId;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::types::{
    AffectedTransaction, InvoiceInput, InvoiceOutcome, RateChange, RateChangeImpact,
    RateChangeOutcome, WorkflowStep,
};
use crate::context::Actor;
use crate::engine::EngineConfig;
use crate::error::TaxError;
use crate::rate::types::same_nature;
use crate::rate::{
    AppliedRate, NewRate, RateFilter, RatePatch, RateRecord, RateRegistry, check_rate_values,
};
use crate::repository::Repositories;
use crate::section::TaxKind;
use crate::transaction::calculator::breakdown;
use crate::transaction::{
    NewTransaction, TransactionFilter, TransactionPatch, TransactionService, TransactionStatus,
};

/// Net amount after withholding: gross less TDS, or gross plus TCS.
#[must_use]
pub fn net_payable(kind: TaxKind, gross: Decimal, tax: Decimal) -> Decimal {
    match kind {
        TaxKind::Tds => gross - tax,
        TaxKind::Tcs => gross + tax,
    }
}

/// Workflow operations.
pub struct WorkflowService<'a> {
    repos: &'a Repositories,
    config: &'a EngineConfig,
}

impl<'a> WorkflowService<'a> {
    /// Creates the service view.
    #[must_use]
    pub fn new(repos: &'a Repositories, config: &'a EngineConfig) -> Self {
        Self { repos, config }
    }

    /// Records the withholding on an invoice and returns the net payable.
    pub async fn process_invoice(
        &self,
        actor: &Actor,
        input: InvoiceInput,
    ) -> Result<InvoiceOutcome, TaxError> {
        let transactions = TransactionService::new(self.repos, self.config);
        let mut steps = Vec::with_capacity(2);

        let mut transaction = transactions
            .create(
                actor,
                NewTransaction {
                    vendor_id: input.vendor_id,
                    transaction_type: input.transaction_type,
                    amount: input.gross_amount,
                    transaction_date: input.invoice_date,
                    section: input.section,
                    pan_number: input.pan_number,
                    reference: input.invoice_number,
                    payment_type: input.payment_type,
                    due_date: None,
                },
            )
            .await?;
        steps.push(WorkflowStep::completed(
            "record_transaction",
            format!(
                "{} {} under section {}",
                transaction.kind.label(),
                transaction.tax_amount,
                transaction.section
            ),
        ));

        if input.mark_completed {
            transaction = transactions
                .update(
                    actor,
                    transaction.id,
                    TransactionPatch {
                        status: Some(TransactionStatus::Completed),
                        ..TransactionPatch::default()
                    },
                )
                .await?;
            steps.push(WorkflowStep::completed(
                "mark_completed",
                "tax marked as deposited",
            ));
        } else {
            steps.push(WorkflowStep::skipped(
                "mark_completed",
                "left pending for deposit",
            ));
        }

        let net = net_payable(transaction.kind, transaction.amount, transaction.tax_amount);
        info!(
            company_id = %actor.company_id,
            transaction_id = %transaction.id,
            gross = %transaction.amount,
            tax_amount = %transaction.tax_amount,
            net_payable = %net,
            "invoice processed"
        );

        Ok(InvoiceOutcome {
            gross_amount: transaction.amount,
            tax_amount: transaction.tax_amount,
            net_payable: net,
            transaction,
            steps,
        })
    }

    /// Replaces the applicable rate from `effective_from` onwards.
    ///
    /// The current record is closed the day before `effective_from` and a new
    /// record is opened with its attributes plus the overrides. When opening
    /// the new record fails the current record is restored.
    pub async fn change_rate(
        &self,
        actor: &Actor,
        change: RateChange,
    ) -> Result<RateChangeOutcome, TaxError> {
        let registry = RateRegistry::new(self.repos, self.config);
        let mut steps = Vec::with_capacity(4);

        let current = registry
            .find_applicable(
                actor.company_id,
                change.kind,
                &change.section,
                change.nature.as_deref(),
                change.effective_from,
            )
            .await?;

        let closing_date = change
            .effective_from
            .checked_sub_days(Days::new(1))
            .filter(|d| *d > current.valid_from)
            .ok_or_else(|| {
                TaxError::Validation(format!(
                    "effectiveFrom must be later than the day after the current rate starts ({})",
                    current.valid_from
                ))
            })?;

        let new_rate = NewRate {
            kind: current.kind,
            section: current.section.clone(),
            nature: current.nature.clone(),
            rate: change.rate.unwrap_or(current.rate),
            surcharge_rate: change.surcharge_rate.unwrap_or(current.surcharge_rate),
            education_cess_rate: change
                .education_cess_rate
                .unwrap_or(current.education_cess_rate),
            valid_from: change.effective_from,
            valid_to: change.valid_to.or(current.valid_to),
            threshold_limit: change.threshold_limit.unwrap_or(current.threshold_limit),
            pan_required: change.pan_required.unwrap_or(current.pan_required),
            tan_required: change.tan_required.unwrap_or(current.tan_required),
            description: change.description.or_else(|| current.description.clone()),
        };
        check_rate_values(
            new_rate.rate,
            new_rate.surcharge_rate,
            new_rate.education_cess_rate,
            new_rate.threshold_limit,
            new_rate.valid_from,
            new_rate.valid_to,
        )?;
        self.ensure_only_current_overlaps(actor.company_id, &current, &new_rate)
            .await?;
        steps.push(WorkflowStep::completed(
            "validate",
            format!("replacing rate {}", current.id),
        ));

        let closed = registry
            .update_rate(
                actor,
                current.kind,
                current.id,
                RatePatch {
                    valid_to: Some(closing_date),
                    ..RatePatch::default()
                },
            )
            .await?;
        steps.push(WorkflowStep::completed(
            "close_current_rate",
            format!("valid until {closing_date}"),
        ));

        let opened = match registry.add_rate(actor, new_rate).await {
            Ok(opened) => opened,
            Err(err) => {
                warn!(
                    company_id = %actor.company_id,
                    rate_id = %current.id,
                    error = %err,
                    "rate change failed, restoring current rate"
                );
                self.repos.rates.update(current).await?;
                return Err(err);
            }
        };
        steps.push(WorkflowStep::completed(
            "open_new_rate",
            format!("effective rate {} from {}", opened.effective_rate, opened.valid_from),
        ));

        let impact = self
            .impact(actor.company_id, &closed, &opened, change.effective_from)
            .await?;
        steps.push(WorkflowStep::completed(
            "impact_analysis",
            format!(
                "{} pending transactions keep the previous rate",
                impact.affected_transactions.len()
            ),
        ));

        info!(
            company_id = %actor.company_id,
            section = %opened.section,
            previous_rate_id = %closed.id,
            new_rate_id = %opened.id,
            effective_from = %change.effective_from,
            affected = impact.affected_transactions.len(),
            "rate changed"
        );

        Ok(RateChangeOutcome {
            previous_rate: closed,
            new_rate: opened,
            impact,
            steps,
        })
    }

    /// Rejects the change when an active record other than `current` would
    /// overlap the new window.
    async fn ensure_only_current_overlaps(
        &self,
        company: CompanyId,
        current: &RateRecord,
        new_rate: &NewRate,
    ) -> Result<(), TaxError> {
        let filter = RateFilter {
            kind: Some(current.kind),
            active: Some(true),
            section: Some(current.section.clone()),
            applicable_on: None,
        };
        let clash = self
            .repos
            .rates
            .list(company, &filter)
            .await?
            .into_iter()
            .any(|r| {
                r.id != current.id
                    && same_nature(r.nature.as_deref(), new_rate.nature.as_deref())
                    && r.overlaps(new_rate.valid_from, new_rate.valid_to)
            });
        if clash {
            return Err(TaxError::DuplicateRate {
                section: current.section.clone(),
            });
        }
        Ok(())
    }

    async fn impact(
        &self,
        company: CompanyId,
        previous: &RateRecord,
        opened: &RateRecord,
        effective_from: NaiveDate,
    ) -> Result<RateChangeImpact, TaxError> {
        let pending = self
            .repos
            .transactions
            .list(
                company,
                &TransactionFilter {
                    kind: Some(previous.kind),
                    section: Some(previous.section.clone()),
                    status: Some(TransactionStatus::Pending),
                    from: Some(effective_from),
                    ..TransactionFilter::default()
                },
            )
            .await?;

        let new_applied = AppliedRate::from(opened);
        let affected: Vec<AffectedTransaction> = pending
            .into_iter()
            .filter(|t| {
                t.applied_rate
                    .as_ref()
                    .is_some_and(|a| a.rate_id == previous.id)
            })
            .map(|t| AffectedTransaction {
                id: t.id,
                tax_at_new_rate: breakdown(t.amount, &new_applied).tax_amount,
                vendor_id: t.vendor_id,
                transaction_date: t.transaction_date,
                amount: t.amount,
                current_tax: t.tax_amount,
            })
            .collect();

        Ok(RateChangeImpact {
            current_tax_total: affected.iter().map(|a| a.current_tax).sum(),
            new_tax_total: affected.iter().map(|a| a.tax_at_new_rate).sum(),
            affected_transactions: affected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TaxEngine;
    use crate::workflow::types::StepStatus;
    use crate::engine::tests::test_engine;
    use crate::rate::tests::new_rate;
    use crate::transaction::PaymentType;
    use crate::transaction::tests::new_transaction;
    use crate::vendor::NewVendor;
    use crate::vendor::tests::new_vendor;
    use kosh_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded() -> (TaxEngine, Actor, RateRecord) {
        let engine = test_engine();
        let actor = Actor::new(CompanyId::new(), UserId::new());
        let rate = engine
            .rates()
            .add_rate(&actor, new_rate(TaxKind::Tds, "194C", dec!(1)))
            .await
            .unwrap();
        engine.vendors().create(&actor, new_vendor("V001")).await.unwrap();
        (engine, actor, rate)
    }

    fn invoice(amount: Decimal, mark_completed: bool) -> InvoiceInput {
        InvoiceInput {
            vendor_id: "V001".to_string(),
            transaction_type: "contractor_payment".to_string(),
            gross_amount: amount,
            invoice_date: date(2024, 6, 15),
            invoice_number: Some("INV-1001".to_string()),
            section: None,
            pan_number: None,
            payment_type: PaymentType::Normal,
            mark_completed,
        }
    }

    fn change(effective_from: NaiveDate, rate: Decimal) -> RateChange {
        RateChange {
            kind: TaxKind::Tds,
            section: "194C".to_string(),
            nature: None,
            effective_from,
            rate: Some(rate),
            surcharge_rate: None,
            education_cess_rate: None,
            threshold_limit: None,
            pan_required: None,
            tan_required: None,
            valid_to: None,
            description: None,
        }
    }

    #[test]
    fn test_net_payable_direction() {
        assert_eq!(net_payable(TaxKind::Tds, dec!(100000), dec!(1000)), dec!(99000));
        assert_eq!(net_payable(TaxKind::Tcs, dec!(100000), dec!(100)), dec!(100100));
    }

    #[tokio::test]
    async fn test_invoice_processing_completes() {
        let (engine, actor, _) = seeded().await;
        let outcome = engine
            .workflows()
            .process_invoice(&actor, invoice(dec!(150000), true))
            .await
            .unwrap();

        assert_eq!(outcome.tax_amount, dec!(1500));
        assert_eq!(outcome.net_payable, dec!(148500));
        assert_eq!(outcome.transaction.status, TransactionStatus::Completed);
        assert_eq!(outcome.transaction.reference.as_deref(), Some("INV-1001"));
        assert_eq!(outcome.steps.len(), 2);
        assert!(outcome.steps.iter().all(|s| s.status == StepStatus::Completed));
    }

    #[tokio::test]
    async fn test_invoice_processing_left_pending() {
        let (engine, actor, _) = seeded().await;
        let outcome = engine
            .workflows()
            .process_invoice(&actor, invoice(dec!(25000), false))
            .await
            .unwrap();

        assert_eq!(outcome.tax_amount, Decimal::ZERO);
        assert_eq!(outcome.net_payable, dec!(25000));
        assert_eq!(outcome.transaction.status, TransactionStatus::Pending);
        assert_eq!(outcome.steps[1].status, StepStatus::Skipped);
    }

    #[tokio::test]
    async fn test_invoice_unknown_vendor() {
        let (engine, actor, _) = seeded().await;
        let mut input = invoice(dec!(1000), false);
        input.vendor_id = "V404".to_string();
        let err = engine
            .workflows()
            .process_invoice(&actor, input)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("vendor not found"));
    }

    #[tokio::test]
    async fn test_rate_change_closes_and_opens() {
        let (engine, actor, current) = seeded().await;
        let mut later = new_transaction("V001", dec!(100000));
        later.transaction_date = date(2024, 10, 5);
        engine.transactions().create(&actor, later).await.unwrap();
        engine
            .transactions()
            .create(&actor, new_transaction("V001", dec!(100000)))
            .await
            .unwrap();

        let outcome = engine
            .workflows()
            .change_rate(&actor, change(date(2024, 10, 1), dec!(2)))
            .await
            .unwrap();

        assert_eq!(outcome.previous_rate.id, current.id);
        assert_eq!(outcome.previous_rate.valid_to, Some(date(2024, 9, 30)));
        assert_eq!(outcome.new_rate.valid_from, date(2024, 10, 1));
        assert_eq!(outcome.new_rate.rate, dec!(2));
        assert_eq!(outcome.new_rate.threshold_limit, current.threshold_limit);

        assert_eq!(outcome.impact.affected_transactions.len(), 1);
        assert_eq!(outcome.impact.current_tax_total, dec!(1000));
        assert_eq!(outcome.impact.new_tax_total, dec!(2000));

        let applicable = engine
            .rates()
            .find_applicable(actor.company_id, TaxKind::Tds, "194C", None, date(2024, 11, 1))
            .await
            .unwrap();
        assert_eq!(applicable.id, outcome.new_rate.id);
    }

    #[tokio::test]
    async fn test_rate_change_validates_before_closing() {
        let (engine, actor, current) = seeded().await;
        let err = engine
            .workflows()
            .change_rate(&actor, change(date(2024, 10, 1), dec!(101)))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 400);

        let untouched = engine
            .rates()
            .get(actor.company_id, TaxKind::Tds, current.id)
            .await
            .unwrap();
        assert_eq!(untouched.valid_to, None);
    }

    #[tokio::test]
    async fn test_rate_change_rejects_clash_with_other_record() {
        let (engine, actor, current) = seeded().await;
        engine
            .rates()
            .update_rate(
                &actor,
                TaxKind::Tds,
                current.id,
                RatePatch {
                    valid_to: Some(date(2025, 3, 31)),
                    ..RatePatch::default()
                },
            )
            .await
            .unwrap();
        engine
            .rates()
            .add_rate(
                &actor,
                NewRate {
                    valid_from: date(2025, 4, 1),
                    ..new_rate(TaxKind::Tds, "194C", dec!(1.5))
                },
            )
            .await
            .unwrap();

        let mut request = change(date(2024, 10, 1), dec!(2));
        request.valid_to = Some(date(2025, 12, 31));
        let err = engine
            .workflows()
            .change_rate(&actor, request)
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 409);

        let untouched = engine
            .rates()
            .get(actor.company_id, TaxKind::Tds, current.id)
            .await
            .unwrap();
        assert_eq!(untouched.valid_to, Some(date(2025, 3, 31)));
    }

    #[tokio::test]
    async fn test_rate_change_too_early() {
        let (engine, actor, _) = seeded().await;
        let err = engine
            .workflows()
            .change_rate(&actor, change(date(2023, 4, 2), dec!(2)))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[tokio::test]
    async fn test_tcs_invoice_adds_tax() {
        let engine = test_engine();
        let actor = Actor::new(CompanyId::new(), UserId::new());
        engine
            .rates()
            .add_rate(
                &actor,
                NewRate {
                    threshold_limit: dec!(5000000),
                    ..new_rate(TaxKind::Tcs, "206C(1H)", dec!(0.1))
                },
            )
            .await
            .unwrap();
        engine
            .vendors()
            .create(
                &actor,
                NewVendor {
                    tds_applicable: false,
                    tcs_applicable: true,
                    ..new_vendor("B001")
                },
            )
            .await
            .unwrap();

        let mut input = invoice(dec!(6000000), false);
        input.vendor_id = "B001".to_string();
        input.transaction_type = "sale_of_goods".to_string();
        let outcome = engine
            .workflows()
            .process_invoice(&actor, input)
            .await
            .unwrap();

        assert_eq!(outcome.tax_amount, dec!(6000));
        assert_eq!(outcome.net_payable, dec!(6006000));
    }
}
