//! Certificate repository.
//!
//! Uniqueness of `(company_id, certificate_number)` is enforced by
//! `uq_certificates_company_number`; a losing concurrent insert surfaces as
//! `RepositoryError::Duplicate`.

use async_trait::async_trait;
use kosh_core::certificate::{Certificate, CertificateFilter, CertificateStatus, CertificateType};
use kosh_core::repository::{CertificateRepository, RepoResult};
use kosh_core::{FinancialQuarter, RepositoryError};
use kosh_shared::types::{CertificateId, CompanyId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{corrupt, from_json, storage, to_json, utc, write_error};
use crate::entities::certificates;

/// Certificates in `certificates`.
#[derive(Debug, Clone)]
pub struct PgCertificateRepository {
    db: DatabaseConnection,
}

impl PgCertificateRepository {
    /// Creates a new certificate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(
        &self,
        company: CompanyId,
        id: CertificateId,
    ) -> RepoResult<Option<certificates::Model>> {
        certificates::Entity::find_by_id(id.into_inner())
            .filter(certificates::Column::CompanyId.eq(company.into_inner()))
            .one(&self.db)
            .await
            .map_err(storage)
    }
}

fn to_active(certificate: &Certificate) -> RepoResult<certificates::ActiveModel> {
    let transaction_count = i64::try_from(certificate.transaction_count)
        .map_err(|_| RepositoryError::Storage("transaction count out of range".to_string()))?;
    let delivery_count = i32::try_from(certificate.delivery_count)
        .map_err(|_| RepositoryError::Storage("delivery count out of range".to_string()))?;

    Ok(certificates::ActiveModel {
        id: Set(certificate.id.into_inner()),
        company_id: Set(certificate.company_id.into_inner()),
        certificate_number: Set(certificate.certificate_number.clone()),
        vendor_id: Set(certificate.vendor_id.clone()),
        vendor_name: Set(certificate.vendor_name.clone()),
        vendor_pan: Set(certificate.vendor_pan.clone()),
        certificate_type: Set(certificate.certificate_type.as_str().to_string()),
        quarter: Set(certificate.quarter.to_string()),
        period_start: Set(certificate.period_start),
        period_end: Set(certificate.period_end),
        total_tds: Set(certificate.total_tds),
        total_tcs: Set(certificate.total_tcs),
        total_amount_paid: Set(certificate.total_amount_paid),
        transaction_count: Set(transaction_count),
        lines: Set(to_json(&certificate.lines)?),
        status: Set(certificate.status.as_str().to_string()),
        is_active: Set(certificate.is_active),
        delivered_to: Set(certificate.delivered_to.clone()),
        delivery_method: Set(certificate.delivery_method.clone()),
        delivered_at: Set(certificate.delivered_at.map(Into::into)),
        delivery_count: Set(delivery_count),
        revocation_reason: Set(certificate.revocation_reason.clone()),
        revoked_at: Set(certificate.revoked_at.map(Into::into)),
        issued_by: Set(certificate.issued_by.into_inner()),
        created_at: Set(certificate.created_at.into()),
        updated_at: Set(certificate.updated_at.into()),
    })
}

fn to_certificate(model: certificates::Model) -> RepoResult<Certificate> {
    let certificate_type = CertificateType::parse(&model.certificate_type)
        .ok_or_else(|| corrupt("certificates.certificate_type", &model.certificate_type))?;
    let status = CertificateStatus::parse(&model.status)
        .ok_or_else(|| corrupt("certificates.status", &model.status))?;
    let quarter: FinancialQuarter = model
        .quarter
        .parse()
        .map_err(|_| corrupt("certificates.quarter", &model.quarter))?;
    let transaction_count = u64::try_from(model.transaction_count)
        .map_err(|_| corrupt("certificates.transaction_count", &model.transaction_count.to_string()))?;
    let delivery_count = u32::try_from(model.delivery_count)
        .map_err(|_| corrupt("certificates.delivery_count", &model.delivery_count.to_string()))?;

    Ok(Certificate {
        id: CertificateId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        certificate_number: model.certificate_number,
        vendor_id: model.vendor_id,
        vendor_name: model.vendor_name,
        vendor_pan: model.vendor_pan,
        certificate_type,
        quarter,
        period_start: model.period_start,
        period_end: model.period_end,
        total_tds: model.total_tds,
        total_tcs: model.total_tcs,
        total_amount_paid: model.total_amount_paid,
        transaction_count,
        lines: from_json("certificates.lines", model.lines)?,
        status,
        is_active: model.is_active,
        delivered_to: model.delivered_to,
        delivery_method: model.delivery_method,
        delivered_at: model.delivered_at.map(utc),
        delivery_count,
        revocation_reason: model.revocation_reason,
        revoked_at: model.revoked_at.map(utc),
        issued_by: UserId::from_uuid(model.issued_by),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

#[async_trait]
impl CertificateRepository for PgCertificateRepository {
    async fn insert(&self, certificate: Certificate) -> RepoResult<Certificate> {
        let model = to_active(&certificate)?
            .insert(&self.db)
            .await
            .map_err(|e| write_error(e, &certificate.certificate_number))?;
        to_certificate(model)
    }

    async fn update(&self, certificate: Certificate) -> RepoResult<Certificate> {
        let key = certificate.certificate_number.clone();
        if self
            .find(certificate.company_id, certificate.id)
            .await?
            .is_none()
        {
            return Err(RepositoryError::NotFound(key));
        }
        let model = to_active(&certificate)?
            .update(&self.db)
            .await
            .map_err(|e| write_error(e, &key))?;
        to_certificate(model)
    }

    async fn get(&self, company: CompanyId, id: CertificateId) -> RepoResult<Option<Certificate>> {
        self.find(company, id).await?.map(to_certificate).transpose()
    }

    async fn list(
        &self,
        company: CompanyId,
        filter: &CertificateFilter,
    ) -> RepoResult<Vec<Certificate>> {
        let mut query = certificates::Entity::find()
            .filter(certificates::Column::CompanyId.eq(company.into_inner()));
        if let Some(vendor_id) = filter.vendor_id.as_deref() {
            query = query.filter(certificates::Column::VendorId.eq(vendor_id));
        }
        if let Some(certificate_type) = filter.certificate_type {
            query = query.filter(certificates::Column::CertificateType.eq(certificate_type.as_str()));
        }
        if let Some(quarter) = filter.quarter {
            query = query.filter(certificates::Column::Quarter.eq(quarter.to_string()));
        }
        if let Some(status) = filter.status {
            query = query.filter(certificates::Column::Status.eq(status.as_str()));
        }

        query
            .order_by_asc(certificates::Column::CertificateNumber)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(to_certificate)
            .collect()
    }
}
