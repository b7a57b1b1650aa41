//! Tax transaction repository.
//!
//! The frozen rate and the calculation breakdown are stored as JSONB; the
//! source rate ID is duplicated into `applied_rate_id` so rate changes can
//! find affected rows without reading the JSON.

use async_trait::async_trait;
use kosh_core::repository::{RepoResult, TransactionRepository};
use kosh_core::transaction::{
    PaymentType, TaxOutcome, TaxTransaction, TransactionFilter, TransactionStatus,
};
use kosh_core::{RepositoryError, TaxKind};
use kosh_shared::types::{CompanyId, RateId, TransactionId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use super::{VENDOR_FK, corrupt, from_json, storage, to_json, utc, write_error};
use crate::entities::tax_transactions;

/// Tax transactions in `tax_transactions`.
#[derive(Debug, Clone)]
pub struct PgTransactionRepository {
    db: DatabaseConnection,
}

impl PgTransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(
        &self,
        company: CompanyId,
        id: TransactionId,
    ) -> RepoResult<Option<tax_transactions::Model>> {
        tax_transactions::Entity::find_by_id(id.into_inner())
            .filter(tax_transactions::Column::CompanyId.eq(company.into_inner()))
            .one(&self.db)
            .await
            .map_err(storage)
    }
}

fn to_active(tx: &TaxTransaction) -> RepoResult<tax_transactions::ActiveModel> {
    let applied_rate = tx.applied_rate.as_ref().map(to_json).transpose()?;

    Ok(tax_transactions::ActiveModel {
        id: Set(tx.id.into_inner()),
        company_id: Set(tx.company_id.into_inner()),
        reference: Set(tx.reference.clone()),
        vendor_id: Set(tx.vendor_id.clone()),
        transaction_type: Set(tx.transaction_type.clone()),
        kind: Set(tx.kind.as_str().to_string()),
        section: Set(tx.section.clone()),
        applied_rate_id: Set(tx.applied_rate.as_ref().map(|r| r.rate_id.into_inner())),
        applied_rate: Set(applied_rate),
        amount: Set(tx.amount),
        tax_amount: Set(tx.tax_amount),
        outcome: Set(tx.outcome.as_str().to_string()),
        calculation_breakdown: Set(to_json(&tx.calculation_breakdown)?),
        pan_number: Set(tx.pan_number.clone()),
        transaction_date: Set(tx.transaction_date),
        due_date: Set(tx.due_date),
        status: Set(tx.status.as_str().to_string()),
        payment_type: Set(tx.payment_type.as_str().to_string()),
        created_by: Set(tx.created_by.into_inner()),
        created_at: Set(tx.created_at.into()),
        updated_at: Set(tx.updated_at.into()),
    })
}

fn to_transaction(model: tax_transactions::Model) -> RepoResult<TaxTransaction> {
    let kind: TaxKind = model
        .kind
        .parse()
        .map_err(|_| corrupt("tax_transactions.kind", &model.kind))?;
    let status = TransactionStatus::parse(&model.status)
        .ok_or_else(|| corrupt("tax_transactions.status", &model.status))?;
    let outcome = TaxOutcome::parse(&model.outcome)
        .ok_or_else(|| corrupt("tax_transactions.outcome", &model.outcome))?;
    let payment_type = PaymentType::parse(&model.payment_type)
        .ok_or_else(|| corrupt("tax_transactions.payment_type", &model.payment_type))?;
    let applied_rate = model
        .applied_rate
        .map(|v| from_json("tax_transactions.applied_rate", v))
        .transpose()?;

    Ok(TaxTransaction {
        id: TransactionId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        reference: model.reference,
        vendor_id: model.vendor_id,
        transaction_type: model.transaction_type,
        kind,
        section: model.section,
        applied_rate,
        amount: model.amount,
        tax_amount: model.tax_amount,
        outcome,
        calculation_breakdown: from_json(
            "tax_transactions.calculation_breakdown",
            model.calculation_breakdown,
        )?,
        pan_number: model.pan_number,
        transaction_date: model.transaction_date,
        due_date: model.due_date,
        status,
        payment_type,
        created_by: UserId::from_uuid(model.created_by),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn insert(&self, transaction: TaxTransaction) -> RepoResult<TaxTransaction> {
        let key = transaction.id.to_string();
        let model = to_active(&transaction)?
            .insert(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(msg)) if msg.contains(VENDOR_FK) => {
                    RepositoryError::NotFound(transaction.vendor_id.clone())
                }
                _ => write_error(e, &key),
            })?;
        to_transaction(model)
    }

    async fn update(&self, transaction: TaxTransaction) -> RepoResult<TaxTransaction> {
        let key = transaction.id.to_string();
        if self
            .find(transaction.company_id, transaction.id)
            .await?
            .is_none()
        {
            return Err(RepositoryError::NotFound(key));
        }
        let model = to_active(&transaction)?
            .update(&self.db)
            .await
            .map_err(|e| write_error(e, &key))?;
        to_transaction(model)
    }

    async fn get(
        &self,
        company: CompanyId,
        id: TransactionId,
    ) -> RepoResult<Option<TaxTransaction>> {
        self.find(company, id).await?.map(to_transaction).transpose()
    }

    async fn list(
        &self,
        company: CompanyId,
        filter: &TransactionFilter,
    ) -> RepoResult<Vec<TaxTransaction>> {
        let mut query = tax_transactions::Entity::find()
            .filter(tax_transactions::Column::CompanyId.eq(company.into_inner()));
        if let Some(vendor_id) = filter.vendor_id.as_deref() {
            query = query.filter(tax_transactions::Column::VendorId.eq(vendor_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(tax_transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(tax_transactions::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(tax_transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(tax_transactions::Column::TransactionDate.lte(to));
        }

        let models = query
            .order_by_asc(tax_transactions::Column::TransactionDate)
            .order_by_asc(tax_transactions::Column::CreatedAt)
            .order_by_asc(tax_transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        let mut transactions = models
            .into_iter()
            .map(to_transaction)
            .collect::<RepoResult<Vec<_>>>()?;
        // Section matching ignores case.
        transactions.retain(|tx| filter.matches(tx));
        Ok(transactions)
    }

    async fn count_by_rate(&self, company: CompanyId, rate: RateId) -> RepoResult<u64> {
        tax_transactions::Entity::find()
            .filter(tax_transactions::Column::CompanyId.eq(company.into_inner()))
            .filter(tax_transactions::Column::AppliedRateId.eq(rate.into_inner()))
            .count(&self.db)
            .await
            .map_err(storage)
    }
}
