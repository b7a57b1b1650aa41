//! Vendor profile repository.

use async_trait::async_trait;
use kosh_core::repository::{RepoResult, VendorRepository};
use kosh_core::vendor::{VendorCategory, VendorFilter, VendorProfile};
use kosh_shared::types::{CompanyId, VendorRecordId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{corrupt, storage, utc, write_error};
use crate::entities::vendors;

/// Vendor profiles in `vendors`, keyed by `(company_id, vendor_id)`.
#[derive(Debug, Clone)]
pub struct PgVendorRepository {
    db: DatabaseConnection,
}

impl PgVendorRepository {
    /// Creates a new vendor repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, company: CompanyId, vendor_id: &str) -> RepoResult<Option<vendors::Model>> {
        vendors::Entity::find()
            .filter(vendors::Column::CompanyId.eq(company.into_inner()))
            .filter(vendors::Column::VendorId.eq(vendor_id))
            .one(&self.db)
            .await
            .map_err(storage)
    }
}

fn to_active(vendor: &VendorProfile) -> vendors::ActiveModel {
    vendors::ActiveModel {
        id: Set(vendor.id.into_inner()),
        company_id: Set(vendor.company_id.into_inner()),
        vendor_id: Set(vendor.vendor_id.clone()),
        name: Set(vendor.name.clone()),
        pan_number: Set(vendor.pan_number.clone()),
        tan_number: Set(vendor.tan_number.clone()),
        category: Set(vendor.category.as_str().to_string()),
        tds_applicable: Set(vendor.tds_applicable),
        tcs_applicable: Set(vendor.tcs_applicable),
        email: Set(vendor.email.clone()),
        address: Set(vendor.address.clone()),
        is_active: Set(vendor.is_active),
        created_at: Set(vendor.created_at.into()),
        updated_at: Set(vendor.updated_at.into()),
    }
}

fn to_profile(model: vendors::Model) -> RepoResult<VendorProfile> {
    let category: VendorCategory = model
        .category
        .parse()
        .map_err(|_| corrupt("vendors.category", &model.category))?;

    Ok(VendorProfile {
        id: VendorRecordId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        vendor_id: model.vendor_id,
        name: model.name,
        pan_number: model.pan_number,
        tan_number: model.tan_number,
        category,
        tds_applicable: model.tds_applicable,
        tcs_applicable: model.tcs_applicable,
        email: model.email,
        address: model.address,
        is_active: model.is_active,
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

#[async_trait]
impl VendorRepository for PgVendorRepository {
    async fn insert(&self, vendor: VendorProfile) -> RepoResult<VendorProfile> {
        let model = to_active(&vendor)
            .insert(&self.db)
            .await
            .map_err(|e| write_error(e, &vendor.vendor_id))?;
        to_profile(model)
    }

    async fn update(&self, vendor: VendorProfile) -> RepoResult<VendorProfile> {
        let Some(existing) = self.find(vendor.company_id, &vendor.vendor_id).await? else {
            return Err(kosh_core::RepositoryError::NotFound(vendor.vendor_id));
        };

        let mut active = to_active(&vendor);
        active.id = Set(existing.id);
        let model = active
            .update(&self.db)
            .await
            .map_err(|e| write_error(e, &vendor.vendor_id))?;
        to_profile(model)
    }

    async fn get(&self, company: CompanyId, vendor_id: &str) -> RepoResult<Option<VendorProfile>> {
        self.find(company, vendor_id).await?.map(to_profile).transpose()
    }

    async fn get_many(
        &self,
        company: CompanyId,
        vendor_ids: &[String],
    ) -> RepoResult<Vec<VendorProfile>> {
        if vendor_ids.is_empty() {
            return Ok(Vec::new());
        }
        vendors::Entity::find()
            .filter(vendors::Column::CompanyId.eq(company.into_inner()))
            .filter(vendors::Column::VendorId.is_in(vendor_ids.iter().cloned()))
            .order_by_asc(vendors::Column::VendorId)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(to_profile)
            .collect()
    }

    async fn delete(&self, company: CompanyId, vendor_id: &str) -> RepoResult<bool> {
        let result = vendors::Entity::delete_many()
            .filter(vendors::Column::CompanyId.eq(company.into_inner()))
            .filter(vendors::Column::VendorId.eq(vendor_id))
            .exec(&self.db)
            .await
            .map_err(|e| write_error(e, vendor_id))?;
        Ok(result.rows_affected > 0)
    }

    async fn list(
        &self,
        company: CompanyId,
        filter: &VendorFilter,
    ) -> RepoResult<Vec<VendorProfile>> {
        let mut query =
            vendors::Entity::find().filter(vendors::Column::CompanyId.eq(company.into_inner()));
        if let Some(tds) = filter.tds_applicable {
            query = query.filter(vendors::Column::TdsApplicable.eq(tds));
        }
        if let Some(tcs) = filter.tcs_applicable {
            query = query.filter(vendors::Column::TcsApplicable.eq(tcs));
        }
        if let Some(category) = filter.category {
            query = query.filter(vendors::Column::Category.eq(category.as_str()));
        }
        if let Some(active) = filter.active {
            query = query.filter(vendors::Column::IsActive.eq(active));
        }

        query
            .order_by_asc(vendors::Column::VendorId)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(to_profile)
            .collect()
    }
}
