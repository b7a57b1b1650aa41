//! Concurrent certificate issuance against the unique index.
//!
//! Many tasks insert a certificate with the same number at once; exactly one
//! insert must win and every other one must report a duplicate.

mod common;

use std::sync::Arc;

use chrono::Utc;
use common::{date, setup};
use futures::future::join_all;
use kosh_core::certificate::{
    Certificate, CertificateFilter, CertificateKey, CertificateStatus, CertificateType,
};
use kosh_core::repository::CertificateRepository;
use kosh_core::{FinancialQuarter, RepositoryError};
use kosh_db::PgCertificateRepository;
use kosh_shared::types::{CertificateId, CompanyId, UserId};
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

const CONTENDERS: usize = 12;

fn certificate(company: CompanyId, quarter: FinancialQuarter) -> Certificate {
    let key = CertificateKey {
        certificate_type: CertificateType::Tds,
        quarter,
        vendor_id: Some("V001".to_string()),
    };
    let now = Utc::now();
    Certificate {
        id: CertificateId::new(),
        company_id: company,
        certificate_number: key.number(),
        vendor_id: key.vendor_id,
        vendor_name: Some("Vendor V001".to_string()),
        vendor_pan: Some("ABCPE1234F".to_string()),
        certificate_type: CertificateType::Tds,
        quarter,
        period_start: date(2024, 4, 1),
        period_end: date(2024, 6, 30),
        total_tds: dec!(1040.00),
        total_tcs: dec!(0),
        total_amount_paid: dec!(100000),
        transaction_count: 1,
        lines: Vec::new(),
        status: CertificateStatus::Generated,
        is_active: true,
        delivered_to: None,
        delivery_method: None,
        delivered_at: None,
        delivery_count: 0,
        revocation_reason: None,
        revoked_at: None,
        issued_by: UserId::new(),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_inserts_single_winner() {
    let db = setup().await;
    let repo = Arc::new(PgCertificateRepository::new(db.clone()));
    let company = CompanyId::new();
    let quarter: FinancialQuarter = "2024-25/Q1".parse().unwrap();
    let barrier = Arc::new(Barrier::new(CONTENDERS));

    let handles = (0..CONTENDERS).map(|_| {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            repo.insert(certificate(company, quarter)).await
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(RepositoryError::Duplicate(n)) if n == "TDS/2024-25/Q1/V001"))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(duplicates, CONTENDERS - 1);

    let stored = repo
        .list(company, &CertificateFilter::default())
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].quarter, quarter);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_delivery_update_persists() {
    let db = setup().await;
    let repo = PgCertificateRepository::new(db.clone());
    let company = CompanyId::new();
    let quarter: FinancialQuarter = "2024-25/Q2".parse().unwrap();

    let mut issued = repo.insert(certificate(company, quarter)).await.unwrap();
    issued.status = CertificateStatus::Delivered;
    issued.delivered_to = Some("accounts@example.com".to_string());
    issued.delivery_method = Some("email".to_string());
    issued.delivered_at = Some(Utc::now());
    issued.delivery_count = 1;
    repo.update(issued.clone()).await.unwrap();

    let fetched = repo.get(company, issued.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, CertificateStatus::Delivered);
    assert_eq!(fetched.delivery_count, 1);

    let delivered = CertificateFilter {
        status: Some(CertificateStatus::Delivered),
        ..CertificateFilter::default()
    };
    assert_eq!(repo.list(company, &delivered).await.unwrap().len(), 1);
}
