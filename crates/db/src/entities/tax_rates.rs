//! `SeaORM` Entity for tax_rates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tax_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub kind: String,
    pub section: String,
    pub nature: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((9, 4)))")]
    pub rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((9, 4)))")]
    pub surcharge_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((9, 4)))")]
    pub education_cess_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 8)))")]
    pub effective_rate: Decimal,
    pub valid_from: Date,
    pub valid_to: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub threshold_limit: Decimal,
    pub pan_required: bool,
    pub tan_required: bool,
    pub is_active: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tax_transactions::Entity")]
    TaxTransactions,
}

impl Related<super::tax_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaxTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
