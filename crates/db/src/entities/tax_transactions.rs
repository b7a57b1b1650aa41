//! `SeaORM` Entity for tax_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tax_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub reference: Option<String>,
    pub vendor_id: String,
    pub transaction_type: String,
    pub kind: String,
    pub section: String,
    pub applied_rate_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub applied_rate: Option<Json>,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub tax_amount: Decimal,
    pub outcome: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub calculation_breakdown: Json,
    pub pan_number: Option<String>,
    pub transaction_date: Date,
    pub due_date: Date,
    pub status: String,
    pub payment_type: String,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tax_rates::Entity",
        from = "Column::AppliedRateId",
        to = "super::tax_rates::Column::Id"
    )]
    TaxRates,
}

impl Related<super::tax_rates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaxRates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
