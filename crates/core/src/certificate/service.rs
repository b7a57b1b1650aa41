//! Certificate issuance and status changes.

use std::collections::BTreeMap;

use chrono::Utc;
use kosh_shared::types::{CertificateId, CompanyId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::types::{
    Certificate, CertificateFilter, CertificateKey, CertificateLine, CertificateStatus,
    CertificateType, GenerateCertificate, StatusChange,
};
use crate::context::Actor;
use crate::engine::EngineConfig;
use crate::error::TaxError;
use crate::period::FinancialQuarter;
use crate::repository::{RepositoryError, Repositories};
use crate::section::TaxKind;
use crate::transaction::{TaxTransaction, TransactionFilter, TransactionStatus};
use crate::vendor::VendorRegistry;

/// Totals of completed transactions for one certificate.
#[derive(Debug, Default)]
struct Totals {
    total_tds: Decimal,
    total_tcs: Decimal,
    total_amount_paid: Decimal,
    transaction_count: u64,
    lines: BTreeMap<(TaxKind, String), CertificateLine>,
}

impl Totals {
    fn add(&mut self, tx: &TaxTransaction) {
        match tx.kind {
            TaxKind::Tds => self.total_tds += tx.tax_amount,
            TaxKind::Tcs => self.total_tcs += tx.tax_amount,
        }
        self.total_amount_paid += tx.amount;
        self.transaction_count += 1;

        let line = self
            .lines
            .entry((tx.kind, tx.section.clone()))
            .or_insert_with(|| CertificateLine {
                kind: tx.kind,
                section: tx.section.clone(),
                transaction_count: 0,
                amount_paid: Decimal::ZERO,
                tax_amount: Decimal::ZERO,
            });
        line.transaction_count += 1;
        line.amount_paid += tx.amount;
        line.tax_amount += tx.tax_amount;
    }
}

/// Certificate operations.
pub struct CertificateService<'a> {
    repos: &'a Repositories,
    config: &'a EngineConfig,
}

impl<'a> CertificateService<'a> {
    /// Creates the service view.
    #[must_use]
    pub fn new(repos: &'a Repositories, config: &'a EngineConfig) -> Self {
        Self { repos, config }
    }

    /// Issues a certificate from Completed transactions in the period.
    ///
    /// At most once per key: the store rejects a second insert of the same
    /// certificate number, including under concurrent requests.
    pub async fn generate(
        &self,
        actor: &Actor,
        input: GenerateCertificate,
    ) -> Result<Certificate, TaxError> {
        if input.period_start >= input.period_end {
            return Err(TaxError::InvalidPeriod {
                start: input.period_start,
                end: input.period_end,
            });
        }

        let vendor_id = input
            .vendor_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let vendor = match (vendor_id, input.certificate_type) {
            (Some(id), _) => Some(
                VendorRegistry::new(self.repos, self.config)
                    .get(actor.company_id, id)
                    .await?,
            ),
            (None, CertificateType::Consolidated) => None,
            (None, _) => {
                return Err(TaxError::Validation(
                    "vendorId is required for TDS and TCS certificates".to_string(),
                ));
            }
        };

        let quarter = input
            .quarter
            .unwrap_or_else(|| FinancialQuarter::containing(input.period_start));
        if !quarter.contains(input.period_start) || !quarter.contains(input.period_end) {
            return Err(TaxError::PeriodOutsideQuarter {
                start: input.period_start,
                end: input.period_end,
                quarter: quarter.to_string(),
            });
        }
        let key = CertificateKey {
            certificate_type: input.certificate_type,
            quarter,
            vendor_id: vendor.as_ref().map(|v| v.vendor_id.clone()),
        };
        let certificate_number = key.number();

        let filter = TransactionFilter {
            vendor_id: key.vendor_id.clone(),
            kind: input.certificate_type.kind(),
            status: Some(TransactionStatus::Completed),
            from: Some(input.period_start),
            to: Some(input.period_end),
            ..TransactionFilter::default()
        };
        let mut totals = Totals::default();
        for tx in self
            .repos
            .transactions
            .list(actor.company_id, &filter)
            .await?
        {
            totals.add(&tx);
        }

        let now = Utc::now();
        let certificate = Certificate {
            id: CertificateId::new(),
            company_id: actor.company_id,
            certificate_number: certificate_number.clone(),
            vendor_id: key.vendor_id,
            vendor_name: vendor.as_ref().map(|v| v.name.clone()),
            vendor_pan: vendor.as_ref().and_then(|v| v.pan_number.clone()),
            certificate_type: input.certificate_type,
            quarter,
            period_start: input.period_start,
            period_end: input.period_end,
            total_tds: totals.total_tds,
            total_tcs: totals.total_tcs,
            total_amount_paid: totals.total_amount_paid,
            transaction_count: totals.transaction_count,
            lines: totals.lines.into_values().collect(),
            status: CertificateStatus::Generated,
            is_active: true,
            delivered_to: None,
            delivery_method: None,
            delivered_at: None,
            delivery_count: 0,
            revocation_reason: None,
            revoked_at: None,
            issued_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .repos
            .certificates
            .insert(certificate)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => {
                    warn!(
                        company_id = %actor.company_id,
                        certificate_number = %certificate_number,
                        "duplicate certificate generation rejected"
                    );
                    TaxError::DuplicateCertificate(certificate_number.clone())
                }
                other => other.into(),
            })?;

        info!(
            company_id = %actor.company_id,
            certificate_number = %saved.certificate_number,
            transaction_count = saved.transaction_count,
            total_tds = %saved.total_tds,
            total_tcs = %saved.total_tcs,
            "certificate generated"
        );
        Ok(saved)
    }

    /// Fetches a certificate.
    pub async fn get(&self, company: CompanyId, id: CertificateId) -> Result<Certificate, TaxError> {
        self.repos
            .certificates
            .get(company, id)
            .await?
            .ok_or_else(|| TaxError::CertificateNotFound(id.to_string()))
    }

    /// Lists certificates matching the filter.
    pub async fn list(
        &self,
        company: CompanyId,
        filter: &CertificateFilter,
    ) -> Result<Vec<Certificate>, TaxError> {
        Ok(self.repos.certificates.list(company, filter).await?)
    }

    /// Delivers or revokes a certificate.
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: CertificateId,
        change: StatusChange,
    ) -> Result<Certificate, TaxError> {
        let mut certificate = self.get(actor.company_id, id).await?;
        let identity = &self.config.identity;
        let now = Utc::now();

        match (certificate.status, change.status) {
            (
                CertificateStatus::Generated | CertificateStatus::Delivered,
                CertificateStatus::Delivered,
            ) => {
                let recipient = identity
                    .sanitize_optional(change.delivered_to.as_deref())
                    .ok_or_else(|| {
                        TaxError::Validation(
                            "deliveredTo is required to mark a certificate delivered".to_string(),
                        )
                    })?;
                certificate.delivered_to = Some(recipient);
                certificate.delivery_method =
                    identity.sanitize_optional(change.delivery_method.as_deref());
                certificate.delivered_at = Some(now);
                certificate.delivery_count += 1;
            }
            (CertificateStatus::Generated, CertificateStatus::Revoked) => {
                let reason = identity
                    .sanitize_optional(change.reason.as_deref())
                    .ok_or_else(|| {
                        TaxError::Validation(
                            "reason is required to revoke a certificate".to_string(),
                        )
                    })?;
                certificate.revocation_reason = Some(reason);
                certificate.revoked_at = Some(now);
                certificate.is_active = false;
            }
            (from, to) => {
                return Err(TaxError::InvalidStatusTransition {
                    from: from.as_str(),
                    to: to.as_str(),
                });
            }
        }

        certificate.status = change.status;
        certificate.updated_at = now;
        let saved = self.repos.certificates.update(certificate).await?;
        info!(
            company_id = %actor.company_id,
            certificate_number = %saved.certificate_number,
            status = saved.status.as_str(),
            "certificate status changed"
        );
        Ok(saved)
    }
}
