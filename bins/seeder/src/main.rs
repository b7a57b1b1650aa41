//! Database seeder for Kosh development and testing.
//!
//! Seeds TDS/TCS rates for FY 2024-25 and a few vendors for a fixed development
//! company, then prints a bearer token for that company. Records go through the
//! engine, so every seed passes the same validation as API traffic.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::NaiveDate;
use kosh_core::rate::NewRate;
use kosh_core::vendor::{NewVendor, VendorCategory};
use kosh_core::{Actor, EngineConfig, TaxEngine, TaxError, TaxKind};
use kosh_shared::types::{CompanyId, UserId};
use kosh_shared::{AppConfig, JwtService, Role};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Development company ID (consistent for all seeds)
const DEV_COMPANY_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Development user ID (consistent for all seeds)
const DEV_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

/// (kind, section, rate mantissa, rate scale, threshold)
const RATES: [(TaxKind, &str, i64, u32, i64); 5] = [
    (TaxKind::Tds, "194C", 1, 0, 30_000),
    (TaxKind::Tds, "194J", 10, 0, 30_000),
    (TaxKind::Tds, "194H", 5, 0, 15_000),
    (TaxKind::Tds, "194I", 10, 0, 240_000),
    (TaxKind::Tcs, "206C(1H)", 1, 1, 5_000_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let database_url = config
        .database
        .url
        .as_deref()
        .context("KOSH__DATABASE__URL must be set")?;

    println!("Connecting to database...");
    let db = kosh_db::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    let engine_config = EngineConfig::from_config(&config.tax)?;
    let engine = TaxEngine::new(kosh_db::repositories(&db), engine_config);

    let company = Uuid::parse_str(DEV_COMPANY_ID)?;
    let user = Uuid::parse_str(DEV_USER_ID)?;
    let actor = Actor::new(CompanyId::from_uuid(company), UserId::from_uuid(user));

    println!("Seeding rates...");
    seed_rates(&engine, &actor).await?;

    println!("Seeding vendors...");
    seed_vendors(&engine, &actor).await?;

    let token = JwtService::new(&config.jwt).generate_access_token(user, company, Role::Admin)?;
    println!("Seeding complete!");
    println!();
    println!("Admin token for company {DEV_COMPANY_ID}:");
    println!("{token}");

    Ok(())
}

fn fy_start() -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 4, 1).context("invalid seed date")
}

/// Seeds one rate per configured section; sections absent from `[tax]` are skipped.
async fn seed_rates(engine: &TaxEngine, actor: &Actor) -> anyhow::Result<()> {
    let mut inserted = 0;
    for (kind, section, rate, scale, threshold) in RATES {
        let input = NewRate {
            kind,
            section: section.to_string(),
            nature: None,
            rate: Decimal::new(rate, scale),
            surcharge_rate: Decimal::ZERO,
            education_cess_rate: Decimal::ZERO,
            valid_from: fy_start()?,
            valid_to: None,
            threshold_limit: Decimal::new(threshold, 0),
            pan_required: true,
            tan_required: false,
            description: Some(format!("Seeded {section} rate")),
        };

        match engine.rates().add_rate(actor, input).await {
            Ok(_) => inserted += 1,
            Err(TaxError::DuplicateRate { .. }) => {
                println!("  Rate for {section} already exists, skipping...");
            }
            Err(TaxError::InvalidSection { .. }) => {
                println!("  Section {section} is not configured, skipping...");
            }
            Err(e) => eprintln!("Failed to insert rate {section}: {e}"),
        }
    }
    println!("  Inserted {inserted} rates");
    Ok(())
}

async fn seed_vendors(engine: &TaxEngine, actor: &Actor) -> anyhow::Result<()> {
    let vendors = [
        (
            "V001",
            "Sharma Construction",
            "ABCPE1234F",
            VendorCategory::Individual,
            true,
            false,
        ),
        (
            "V002",
            "Kapoor & Associates",
            "AAFFK5678L",
            VendorCategory::Partnership,
            true,
            false,
        ),
        (
            "B001",
            "Bharat Retail Pvt Ltd",
            "AABCB4321M",
            VendorCategory::Corporate,
            false,
            true,
        ),
    ];

    let mut inserted = 0;
    for (vendor_id, name, pan, category, tds, tcs) in vendors {
        let input = NewVendor {
            vendor_id: vendor_id.to_string(),
            name: name.to_string(),
            pan_number: Some(pan.to_string()),
            tan_number: None,
            category,
            tds_applicable: tds,
            tcs_applicable: tcs,
            email: Some(format!("accounts+{}@kosh.dev", vendor_id.to_lowercase())),
            address: None,
        };

        match engine.vendors().create(actor, input).await {
            Ok(_) => inserted += 1,
            Err(TaxError::DuplicateVendor(_)) => {
                println!("  Vendor {vendor_id} already exists, skipping...");
            }
            Err(e) => eprintln!("Failed to insert vendor {vendor_id}: {e}"),
        }
    }
    println!("  Inserted {inserted} vendors");
    Ok(())
}
