//! Rate record repository.

use async_trait::async_trait;
use kosh_core::rate::{RateFilter, RateRecord};
use kosh_core::repository::{RateRepository, RepoResult};
use kosh_core::{RepositoryError, TaxKind};
use kosh_shared::types::{CompanyId, RateId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{corrupt, storage, utc, write_error};
use crate::entities::tax_rates;

/// Rate records in `tax_rates`.
#[derive(Debug, Clone)]
pub struct PgRateRepository {
    db: DatabaseConnection,
}

impl PgRateRepository {
    /// Creates a new rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, company: CompanyId, id: RateId) -> RepoResult<Option<tax_rates::Model>> {
        tax_rates::Entity::find_by_id(id.into_inner())
            .filter(tax_rates::Column::CompanyId.eq(company.into_inner()))
            .one(&self.db)
            .await
            .map_err(storage)
    }
}

fn to_active(rate: &RateRecord) -> tax_rates::ActiveModel {
    tax_rates::ActiveModel {
        id: Set(rate.id.into_inner()),
        company_id: Set(rate.company_id.into_inner()),
        kind: Set(rate.kind.as_str().to_string()),
        section: Set(rate.section.clone()),
        nature: Set(rate.nature.clone()),
        rate: Set(rate.rate),
        surcharge_rate: Set(rate.surcharge_rate),
        education_cess_rate: Set(rate.education_cess_rate),
        effective_rate: Set(rate.effective_rate),
        valid_from: Set(rate.valid_from),
        valid_to: Set(rate.valid_to),
        threshold_limit: Set(rate.threshold_limit),
        pan_required: Set(rate.pan_required),
        tan_required: Set(rate.tan_required),
        is_active: Set(rate.is_active),
        description: Set(rate.description.clone()),
        created_by: Set(rate.created_by.into_inner()),
        created_at: Set(rate.created_at.into()),
        updated_at: Set(rate.updated_at.into()),
    }
}

fn to_record(model: tax_rates::Model) -> RepoResult<RateRecord> {
    let kind: TaxKind = model
        .kind
        .parse()
        .map_err(|_| corrupt("tax_rates.kind", &model.kind))?;

    Ok(RateRecord {
        id: RateId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        kind,
        section: model.section,
        nature: model.nature,
        rate: model.rate,
        surcharge_rate: model.surcharge_rate,
        education_cess_rate: model.education_cess_rate,
        effective_rate: model.effective_rate,
        valid_from: model.valid_from,
        valid_to: model.valid_to,
        threshold_limit: model.threshold_limit,
        pan_required: model.pan_required,
        tan_required: model.tan_required,
        is_active: model.is_active,
        description: model.description,
        created_by: UserId::from_uuid(model.created_by),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

#[async_trait]
impl RateRepository for PgRateRepository {
    async fn insert(&self, rate: RateRecord) -> RepoResult<RateRecord> {
        let key = rate.id.to_string();
        let model = to_active(&rate)
            .insert(&self.db)
            .await
            .map_err(|e| write_error(e, &key))?;
        to_record(model)
    }

    async fn update(&self, rate: RateRecord) -> RepoResult<RateRecord> {
        let key = rate.id.to_string();
        if self.find(rate.company_id, rate.id).await?.is_none() {
            return Err(RepositoryError::NotFound(key));
        }
        let model = to_active(&rate)
            .update(&self.db)
            .await
            .map_err(|e| write_error(e, &key))?;
        to_record(model)
    }

    async fn get(&self, company: CompanyId, id: RateId) -> RepoResult<Option<RateRecord>> {
        self.find(company, id).await?.map(to_record).transpose()
    }

    async fn list(&self, company: CompanyId, filter: &RateFilter) -> RepoResult<Vec<RateRecord>> {
        let mut query =
            tax_rates::Entity::find().filter(tax_rates::Column::CompanyId.eq(company.into_inner()));
        if let Some(kind) = filter.kind {
            query = query.filter(tax_rates::Column::Kind.eq(kind.as_str()));
        }
        if let Some(active) = filter.active {
            query = query.filter(tax_rates::Column::IsActive.eq(active));
        }
        if let Some(date) = filter.applicable_on {
            query = query.filter(tax_rates::Column::ValidFrom.lte(date)).filter(
                tax_rates::Column::ValidTo
                    .is_null()
                    .or(tax_rates::Column::ValidTo.gte(date)),
            );
        }

        let models = query
            .order_by_asc(tax_rates::Column::ValidFrom)
            .all(&self.db)
            .await
            .map_err(storage)?;

        let mut rates = models
            .into_iter()
            .map(to_record)
            .collect::<RepoResult<Vec<_>>>()?;
        rates.retain(|r| filter.matches(r));
        rates.sort_by(|a, b| {
            (a.kind, &a.section, a.valid_from).cmp(&(b.kind, &b.section, b.valid_from))
        });
        Ok(rates)
    }
}
