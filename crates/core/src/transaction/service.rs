//! Transaction calculator service.

use std::collections::HashMap;

use chrono::Utc;
use kosh_shared::types::{CompanyId, TransactionId};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::bulk;
use super::calculator;
use super::types::{
    BulkItem, BulkOutcome, Calculation, NewTransaction, TaxOutcome, TaxTransaction,
    TransactionFilter, TransactionPatch, TransactionStatus,
};
use crate::context::Actor;
use crate::engine::EngineConfig;
use crate::error::TaxError;
use crate::period::deposit_due_date;
use crate::rate::{AppliedRate, RateFilter, RateRecord, select_applicable};
use crate::repository::{RepositoryError, Repositories};
use crate::section::normalize_code;
use crate::vendor::VendorProfile;

/// Largest batch accepted by bulk calculation.
pub const MAX_BULK_ITEMS: usize = 1000;

/// Computes one item against prefetched data. No storage access.
///
/// `rates` are the company's active records; the ones of the resolved kind
/// and section covering the date are considered.
pub(crate) fn compute_item(
    config: &EngineConfig,
    vendor: Option<&VendorProfile>,
    rates: &[RateRecord],
    item: &BulkItem,
) -> Result<Calculation, TaxError> {
    if item.amount < Decimal::ZERO {
        return Err(TaxError::NegativeAmount);
    }

    let vendor = vendor.ok_or_else(|| TaxError::VendorNotFound(item.vendor_id.clone()))?;
    if !vendor.is_active {
        return Err(TaxError::VendorInactive(vendor.vendor_id.clone()));
    }

    let resolved = config
        .catalog
        .resolve(&item.transaction_type, item.section.as_deref())?;
    let pan_override = config
        .identity
        .validate_optional_pan(item.pan_number.as_deref())?;

    if !vendor.is_liable(resolved.kind) {
        let breakdown = calculator::not_applicable(item.amount);
        return Ok(Calculation {
            vendor_id: vendor.vendor_id.clone(),
            kind: resolved.kind,
            section: resolved.section,
            nature: resolved.nature,
            applied_rate: None,
            outcome: TaxOutcome::NotApplicable,
            tax_amount: breakdown.tax_amount,
            calculation_breakdown: breakdown,
            pan_number: pan_override.or_else(|| vendor.pan_number.clone()),
        });
    }

    let candidates = rates.iter().filter(|r| {
        r.is_active
            && r.kind == resolved.kind
            && r.section == resolved.section
            && r.covers(item.transaction_date)
    });
    let record = select_applicable(
        candidates,
        &resolved.section,
        resolved.nature.as_deref(),
        item.transaction_date,
    )?;
    let applied = AppliedRate::from(record);
    let assessment = calculator::assess(vendor, &applied, item.amount, pan_override.as_deref())?;

    Ok(Calculation {
        vendor_id: vendor.vendor_id.clone(),
        kind: resolved.kind,
        section: resolved.section,
        nature: resolved.nature,
        applied_rate: Some(applied),
        outcome: assessment.outcome,
        tax_amount: assessment.breakdown.tax_amount,
        calculation_breakdown: assessment.breakdown,
        pan_number: assessment.pan_number,
    })
}

/// Transaction calculator operations.
pub struct TransactionService<'a> {
    repos: &'a Repositories,
    config: &'a EngineConfig,
}

impl<'a> TransactionService<'a> {
    /// Creates the service view.
    #[must_use]
    pub fn new(repos: &'a Repositories, config: &'a EngineConfig) -> Self {
        Self { repos, config }
    }

    /// Computes withholding for one item without persisting it.
    pub async fn calculate(
        &self,
        company: CompanyId,
        item: &BulkItem,
    ) -> Result<Calculation, TaxError> {
        let vendor = self.repos.vendors.get(company, item.vendor_id.trim()).await?;
        let filter = RateFilter {
            active: Some(true),
            applicable_on: Some(item.transaction_date),
            ..RateFilter::default()
        };
        let rates = self.repos.rates.list(company, &filter).await?;
        compute_item(self.config, vendor.as_ref(), &rates, item)
    }

    /// Computes and records a transaction in Pending status.
    pub async fn create(
        &self,
        actor: &Actor,
        input: NewTransaction,
    ) -> Result<TaxTransaction, TaxError> {
        let item = BulkItem {
            vendor_id: input.vendor_id.trim().to_string(),
            transaction_type: input.transaction_type.clone(),
            amount: input.amount,
            transaction_date: input.transaction_date,
            section: input.section.clone(),
            pan_number: input.pan_number.clone(),
        };
        let calculation = self.calculate(actor.company_id, &item).await?;

        let now = Utc::now();
        let transaction = TaxTransaction {
            id: TransactionId::new(),
            company_id: actor.company_id,
            reference: self
                .config
                .identity
                .sanitize_optional(input.reference.as_deref()),
            vendor_id: calculation.vendor_id,
            transaction_type: input.transaction_type.trim().to_string(),
            kind: calculation.kind,
            section: calculation.section,
            applied_rate: calculation.applied_rate,
            amount: input.amount,
            tax_amount: calculation.tax_amount,
            outcome: calculation.outcome,
            calculation_breakdown: calculation.calculation_breakdown,
            pan_number: calculation.pan_number,
            transaction_date: input.transaction_date,
            due_date: input
                .due_date
                .unwrap_or_else(|| deposit_due_date(input.transaction_date)),
            status: TransactionStatus::Pending,
            payment_type: input.payment_type,
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .repos
            .transactions
            .insert(transaction)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(key) => TaxError::DuplicateTransaction(key),
                RepositoryError::NotFound(vendor_id) => TaxError::VendorNotFound(vendor_id),
                other => other.into(),
            })?;

        info!(
            company_id = %actor.company_id,
            transaction_id = %saved.id,
            vendor_id = %saved.vendor_id,
            section = %saved.section,
            amount = %saved.amount,
            tax_amount = %saved.tax_amount,
            outcome = saved.outcome.as_str(),
            "tax transaction recorded"
        );
        Ok(saved)
    }

    /// Fetches a transaction.
    pub async fn get(
        &self,
        company: CompanyId,
        id: TransactionId,
    ) -> Result<TaxTransaction, TaxError> {
        self.repos
            .transactions
            .get(company, id)
            .await?
            .ok_or_else(|| TaxError::TransactionNotFound(id.to_string()))
    }

    /// Applies a patch.
    ///
    /// Vendor and section never change. An amount change is only accepted
    /// while Pending and is recomputed with the frozen rate.
    pub async fn update(
        &self,
        actor: &Actor,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<TaxTransaction, TaxError> {
        let mut tx = self.get(actor.company_id, id).await?;

        if let Some(vendor_id) = patch.vendor_id.as_deref()
            && vendor_id.trim() != tx.vendor_id
        {
            return Err(TaxError::ImmutableField("vendorId"));
        }
        if let Some(section) = patch.section.as_deref()
            && normalize_code(section) != tx.section
        {
            return Err(TaxError::ImmutableField("section"));
        }

        if let Some(amount) = patch.amount
            && amount != tx.amount
        {
            if tx.status != TransactionStatus::Pending {
                return Err(TaxError::TransactionLocked(tx.status.as_str()));
            }
            self.recompute(actor.company_id, &mut tx, amount).await?;
        }

        if let Some(status) = patch.status
            && status != tx.status
        {
            if !tx.status.can_transition_to(status) {
                return Err(TaxError::InvalidStatusTransition {
                    from: tx.status.as_str(),
                    to: status.as_str(),
                });
            }
            debug!(from = tx.status.as_str(), to = status.as_str(), "status change");
            tx.status = status;
        }

        if let Some(reference) = patch.reference.as_deref() {
            tx.reference = self.config.identity.sanitize_optional(Some(reference));
        }
        tx.due_date = patch.due_date.unwrap_or(tx.due_date);
        tx.payment_type = patch.payment_type.unwrap_or(tx.payment_type);
        tx.updated_at = Utc::now();

        let saved = self.repos.transactions.update(tx).await?;
        info!(
            company_id = %actor.company_id,
            transaction_id = %saved.id,
            status = saved.status.as_str(),
            tax_amount = %saved.tax_amount,
            "tax transaction updated"
        );
        Ok(saved)
    }

    async fn recompute(
        &self,
        company: CompanyId,
        tx: &mut TaxTransaction,
        amount: Decimal,
    ) -> Result<(), TaxError> {
        let breakdown = match &tx.applied_rate {
            Some(applied) => {
                let vendor = self
                    .repos
                    .vendors
                    .get(company, &tx.vendor_id)
                    .await?
                    .ok_or_else(|| TaxError::VendorNotFound(tx.vendor_id.clone()))?;
                let assessment =
                    calculator::assess(&vendor, applied, amount, tx.pan_number.as_deref())?;
                tx.outcome = assessment.outcome;
                tx.pan_number = assessment.pan_number;
                assessment.breakdown
            }
            None => {
                if amount < Decimal::ZERO {
                    return Err(TaxError::NegativeAmount);
                }
                calculator::not_applicable(amount)
            }
        };
        tx.amount = amount;
        tx.tax_amount = breakdown.tax_amount;
        tx.calculation_breakdown = breakdown;
        Ok(())
    }

    /// Lists transactions matching the filter.
    pub async fn list(
        &self,
        company: CompanyId,
        filter: &TransactionFilter,
    ) -> Result<Vec<TaxTransaction>, TaxError> {
        Ok(self.repos.transactions.list(company, filter).await?)
    }

    /// Previews a batch in parallel without persisting.
    ///
    /// Vendors and active rates are fetched once; each item then succeeds or
    /// fails independently and results keep input order.
    pub async fn bulk_calculate(
        &self,
        company: CompanyId,
        items: Vec<BulkItem>,
    ) -> Result<BulkOutcome, TaxError> {
        if items.is_empty() {
            return Err(TaxError::Validation("items must not be empty".to_string()));
        }
        if items.len() > MAX_BULK_ITEMS {
            return Err(TaxError::Validation(format!(
                "at most {MAX_BULK_ITEMS} items per bulk calculation, got {}",
                items.len()
            )));
        }

        let mut vendor_ids: Vec<String> =
            items.iter().map(|i| i.vendor_id.trim().to_string()).collect();
        vendor_ids.sort();
        vendor_ids.dedup();

        let vendors: HashMap<String, VendorProfile> = self
            .repos
            .vendors
            .get_many(company, &vendor_ids)
            .await?
            .into_iter()
            .map(|v| (v.vendor_id.clone(), v))
            .collect();
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

        let outcome = bulk::run(self.config, &vendors, &rates, &items);
        info!(
            company_id = %company,
            total = outcome.summary.total_items,
            failed = outcome.summary.failed,
            total_tax = %outcome.summary.total_tax,
            "bulk calculation finished"
        );
        Ok(outcome)
    }
}
