//! `SeaORM` Entity for certificates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub certificate_number: String,
    pub vendor_id: Option<String>,
    pub vendor_name: Option<String>,
    pub vendor_pan: Option<String>,
    pub certificate_type: String,
    pub quarter: String,
    pub period_start: Date,
    pub period_end: Date,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub total_tds: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub total_tcs: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub total_amount_paid: Decimal,
    pub transaction_count: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub lines: Json,
    pub status: String,
    pub is_active: bool,
    pub delivered_to: Option<String>,
    pub delivery_method: Option<String>,
    pub delivered_at: Option<DateTimeWithTimeZone>,
    pub delivery_count: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub revocation_reason: Option<String>,
    pub revoked_at: Option<DateTimeWithTimeZone>,
    pub issued_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
