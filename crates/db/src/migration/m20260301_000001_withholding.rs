//! Withholding schema.
//!
//! Creates the rate, vendor, transaction and certificate tables. Every table
//! carries `company_id`; uniqueness is enforced per company.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(TAX_RATES_SQL).await?;
        db.execute_unprepared(VENDORS_SQL).await?;
        db.execute_unprepared(TAX_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(CERTIFICATES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS certificates CASCADE;
DROP TABLE IF EXISTS tax_transactions CASCADE;
DROP TABLE IF EXISTS vendors CASCADE;
DROP TABLE IF EXISTS tax_rates CASCADE;
",
        )
        .await?;
        Ok(())
    }
}

const TAX_RATES_SQL: &str = r"
CREATE TABLE tax_rates (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    kind VARCHAR(8) NOT NULL CHECK (kind IN ('tds', 'tcs')),
    section VARCHAR(32) NOT NULL,
    nature VARCHAR(255),
    rate NUMERIC(9, 4) NOT NULL CHECK (rate >= 0 AND rate <= 100),
    surcharge_rate NUMERIC(9, 4) NOT NULL DEFAULT 0 CHECK (surcharge_rate >= 0 AND surcharge_rate <= 100),
    education_cess_rate NUMERIC(9, 4) NOT NULL DEFAULT 0 CHECK (education_cess_rate >= 0 AND education_cess_rate <= 100),
    effective_rate NUMERIC(18, 8) NOT NULL,
    valid_from DATE NOT NULL,
    valid_to DATE,
    threshold_limit NUMERIC(18, 2) NOT NULL DEFAULT 0 CHECK (threshold_limit >= 0),
    pan_required BOOLEAN NOT NULL DEFAULT FALSE,
    tan_required BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    description TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_rate_window CHECK (valid_to IS NULL OR valid_from < valid_to)
);

CREATE INDEX idx_tax_rates_lookup ON tax_rates(company_id, kind, section, valid_from) WHERE is_active;
";

const VENDORS_SQL: &str = r"
CREATE TABLE vendors (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    vendor_id VARCHAR(64) NOT NULL,
    name VARCHAR(255) NOT NULL,
    pan_number VARCHAR(10),
    tan_number VARCHAR(10),
    category VARCHAR(32) NOT NULL,
    tds_applicable BOOLEAN NOT NULL DEFAULT TRUE,
    tcs_applicable BOOLEAN NOT NULL DEFAULT FALSE,
    email VARCHAR(255),
    address TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX uq_vendors_company_vendor ON vendors(company_id, vendor_id);
";

const TAX_TRANSACTIONS_SQL: &str = r"
CREATE TABLE tax_transactions (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    reference VARCHAR(128),
    vendor_id VARCHAR(64) NOT NULL,
    transaction_type VARCHAR(64) NOT NULL,
    kind VARCHAR(8) NOT NULL CHECK (kind IN ('tds', 'tcs')),
    section VARCHAR(32) NOT NULL,
    applied_rate_id UUID REFERENCES tax_rates(id),
    applied_rate JSONB,
    amount NUMERIC(18, 2) NOT NULL CHECK (amount >= 0),
    tax_amount NUMERIC(18, 2) NOT NULL CHECK (tax_amount >= 0),
    outcome VARCHAR(32) NOT NULL,
    calculation_breakdown JSONB NOT NULL,
    pan_number VARCHAR(10),
    transaction_date DATE NOT NULL,
    due_date DATE NOT NULL,
    status VARCHAR(16) NOT NULL CHECK (status IN ('pending', 'completed', 'cancelled')),
    payment_type VARCHAR(16) NOT NULL DEFAULT 'normal',
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT fk_tax_transactions_vendor FOREIGN KEY (company_id, vendor_id)
        REFERENCES vendors(company_id, vendor_id) ON DELETE RESTRICT
);

CREATE INDEX idx_tax_transactions_period ON tax_transactions(company_id, kind, transaction_date);
CREATE INDEX idx_tax_transactions_vendor ON tax_transactions(company_id, vendor_id);
CREATE INDEX idx_tax_transactions_rate ON tax_transactions(applied_rate_id) WHERE applied_rate_id IS NOT NULL;
";

const CERTIFICATES_SQL: &str = r"
CREATE TABLE certificates (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    certificate_number VARCHAR(128) NOT NULL,
    vendor_id VARCHAR(64),
    vendor_name VARCHAR(255),
    vendor_pan VARCHAR(10),
    certificate_type VARCHAR(16) NOT NULL CHECK (certificate_type IN ('tds', 'tcs', 'consolidated')),
    quarter VARCHAR(16) NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    total_tds NUMERIC(18, 2) NOT NULL DEFAULT 0,
    total_tcs NUMERIC(18, 2) NOT NULL DEFAULT 0,
    total_amount_paid NUMERIC(18, 2) NOT NULL DEFAULT 0,
    transaction_count BIGINT NOT NULL DEFAULT 0,
    lines JSONB NOT NULL DEFAULT '[]'::jsonb,
    status VARCHAR(16) NOT NULL CHECK (status IN ('generated', 'delivered', 'revoked')),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    delivered_to VARCHAR(255),
    delivery_method VARCHAR(32),
    delivered_at TIMESTAMPTZ,
    delivery_count INTEGER NOT NULL DEFAULT 0,
    revocation_reason TEXT,
    revoked_at TIMESTAMPTZ,
    issued_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_certificate_period CHECK (period_start < period_end)
);

-- At most one certificate per key; concurrent generators race on this index.
CREATE UNIQUE INDEX uq_certificates_company_number ON certificates(company_id, certificate_number);
CREATE INDEX idx_certificates_quarter ON certificates(company_id, quarter);
";
