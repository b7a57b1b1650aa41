//! Quarterly return aggregation.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use kosh_shared::config::DeductorConfig;
use kosh_shared::types::CompanyId;
use rust_decimal::Decimal;
use tracing::info;

use super::types::{
    ChallanRow, DeducteeRow, DeductorBlock, FilingHeader, FilingReturn, FilingTotals,
    FilingValidation, SectionSummary, VendorSummary,
};
use crate::certificate::{Certificate, CertificateFilter};
use crate::engine::EngineConfig;
use crate::error::TaxError;
use crate::identity::IdentityRules;
use crate::period::{FinancialQuarter, deposit_due_date};
use crate::repository::Repositories;
use crate::section::TaxKind;
use crate::transaction::{TaxTransaction, TransactionFilter, TransactionStatus};
use crate::vendor::VendorProfile;

/// Everything a return is assembled from.
#[derive(Debug)]
pub struct FilingInputs<'a> {
    /// Quarter covered.
    pub quarter: FinancialQuarter,
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Preparation date.
    pub as_of: NaiveDate,
    /// Deductor profile.
    pub deductor: &'a DeductorConfig,
    /// Identifier rules for TAN checks.
    pub identity: &'a IdentityRules,
    /// Transactions of the kind in the quarter, any status.
    pub transactions: &'a [TaxTransaction],
    /// Vendor profiles by vendor ID.
    pub vendors: &'a HashMap<String, VendorProfile>,
    /// Certificates of the quarter covering the kind.
    pub certificates: Vec<Certificate>,
}

#[derive(Default)]
struct Bucket {
    count: u64,
    amount: Decimal,
    tax: Decimal,
}

impl Bucket {
    fn add(&mut self, tx: &TaxTransaction) {
        self.count += 1;
        self.amount += tx.amount;
        self.tax += tx.tax_amount;
    }
}

/// Quarterly filing operations.
pub struct FilingService<'a> {
    repos: &'a Repositories,
    config: &'a EngineConfig,
}

impl<'a> FilingService<'a> {
    /// Creates the service view.
    #[must_use]
    pub fn new(repos: &'a Repositories, config: &'a EngineConfig) -> Self {
        Self { repos, config }
    }

    /// Builds the quarterly return for `kind` as prepared on `as_of`.
    pub async fn generate(
        &self,
        company: CompanyId,
        quarter: FinancialQuarter,
        kind: TaxKind,
        as_of: NaiveDate,
    ) -> Result<FilingReturn, TaxError> {
        let filter = TransactionFilter {
            kind: Some(kind),
            from: Some(quarter.start_date()),
            to: Some(quarter.end_date()),
            ..TransactionFilter::default()
        };
        let transactions = self.repos.transactions.list(company, &filter).await?;

        let mut vendor_ids: Vec<String> = transactions.iter().map(|t| t.vendor_id.clone()).collect();
        vendor_ids.sort();
        vendor_ids.dedup();
        let vendors: HashMap<String, VendorProfile> = self
            .repos
            .vendors
            .get_many(company, &vendor_ids)
            .await?
            .into_iter()
            .map(|v| (v.vendor_id.clone(), v))
            .collect();

        let certificates: Vec<Certificate> = self
            .repos
            .certificates
            .list(
                company,
                &CertificateFilter {
                    quarter: Some(quarter),
                    ..CertificateFilter::default()
                },
            )
            .await?
            .into_iter()
            .filter(|c| c.certificate_type.kind().is_none_or(|k| k == kind))
            .collect();

        let filing = assemble(FilingInputs {
            quarter,
            kind,
            as_of,
            deductor: &self.config.deductor,
            identity: &self.config.identity,
            transactions: &transactions,
            vendors: &vendors,
            certificates,
        });

        info!(
            company_id = %company,
            quarter = %quarter,
            form = %filing.header.form,
            deductees = filing.deductees.len(),
            total_tax = %filing.totals.total_tax,
            errors = filing.validation.errors.len(),
            warnings = filing.validation.warnings.len(),
            "quarterly filing generated"
        );
        Ok(filing)
    }
}

/// Assembles a return from already-fetched data.
#[must_use]
pub fn assemble(inputs: FilingInputs<'_>) -> FilingReturn {
    let FilingInputs {
        quarter,
        kind,
        as_of,
        deductor,
        identity,
        transactions,
        vendors,
        certificates,
    } = inputs;

    let completed: Vec<&TaxTransaction> = transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Completed && t.kind == kind)
        .collect();
    let pending_count = transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Pending && t.kind == kind)
        .count() as u64;

    let mut challans: BTreeMap<(String, String), (NaiveDate, Bucket)> = BTreeMap::new();
    let mut sections: BTreeMap<String, Bucket> = BTreeMap::new();
    let mut by_vendor: BTreeMap<String, (Option<String>, Bucket)> = BTreeMap::new();
    let mut totals = Bucket::default();
    let mut deductees = Vec::with_capacity(completed.len());

    for tx in &completed {
        let month = tx.transaction_date.format("%Y-%m").to_string();
        challans
            .entry((tx.section.clone(), month))
            .or_insert_with(|| (deposit_due_date(tx.transaction_date), Bucket::default()))
            .1
            .add(tx);
        sections.entry(tx.section.clone()).or_default().add(tx);
        let vendor_entry = by_vendor
            .entry(tx.vendor_id.clone())
            .or_insert_with(|| (None, Bucket::default()));
        if tx.pan_number.is_some() {
            vendor_entry.0.clone_from(&tx.pan_number);
        }
        vendor_entry.1.add(tx);
        totals.add(tx);

        deductees.push(DeducteeRow {
            transaction_id: tx.id,
            vendor_id: tx.vendor_id.clone(),
            vendor_name: vendors.get(&tx.vendor_id).map(|v| v.name.clone()),
            pan_number: tx.pan_number.clone(),
            section: tx.section.clone(),
            transaction_date: tx.transaction_date,
            amount: tx.amount,
            rate: tx.applied_rate.as_ref().map(|r| r.effective_rate),
            tax_amount: tx.tax_amount,
        });
    }

    let mut validation = FilingValidation::default();
    let tan = deductor.tan.trim();
    if tan.is_empty() {
        validation
            .errors
            .push("deductor TAN is missing".to_string());
    } else if identity.validate_tan(tan).is_err() {
        validation
            .errors
            .push(format!("deductor TAN has an invalid format: {tan}"));
    }

    let mut reported_missing_pan = HashSet::new();
    for row in &deductees {
        if row.tax_amount > Decimal::ZERO
            && row.pan_number.is_none()
            && reported_missing_pan.insert(row.vendor_id.clone())
        {
            validation.errors.push(format!(
                "deductee {} has tax of {} {} without a PAN",
                row.vendor_id,
                kind.label(),
                row.tax_amount
            ));
        }
    }

    if pending_count > 0 {
        validation.warnings.push(format!(
            "{pending_count} pending transactions in {quarter} are not included"
        ));
    }

    let vendor_summary: Vec<VendorSummary> = by_vendor
        .into_iter()
        .map(|(vendor_id, (pan, bucket))| {
            let certificate_number = certificates
                .iter()
                .find(|c| c.covers(&vendor_id, kind))
                .map(|c| c.certificate_number.clone());
            if bucket.tax > Decimal::ZERO && certificate_number.is_none() {
                validation
                    .warnings
                    .push(format!("no certificate issued to vendor {vendor_id} for {quarter}"));
            }
            let profile = vendors.get(&vendor_id);
            VendorSummary {
                vendor_name: profile.map(|v| v.name.clone()),
                pan_number: pan.or_else(|| profile.and_then(|v| v.pan_number.clone())),
                vendor_id,
                transaction_count: bucket.count,
                total_amount: bucket.amount,
                total_tax: bucket.tax,
                certificate_number,
            }
        })
        .collect();

    let due_date = quarter.return_due_date();
    if as_of > due_date {
        validation.warnings.push(format!(
            "return for {quarter} was due on {due_date} and is being filed late"
        ));
    }
    validation.is_valid = validation.errors.is_empty();

    FilingReturn {
        header: FilingHeader {
            form: kind.return_form().to_string(),
            kind,
            quarter,
            financial_year: quarter.financial_year(),
            period_start: quarter.start_date(),
            period_end: quarter.end_date(),
            due_date,
            prepared_on: as_of,
        },
        deductor: DeductorBlock {
            name: deductor.name.clone(),
            tan: tan.to_string(),
            pan: deductor.pan.clone(),
            address: deductor.address.clone(),
            responsible_person: deductor.responsible_person.clone(),
        },
        challans: challans
            .into_iter()
            .map(|((section, month), (deposit_due_date, bucket))| ChallanRow {
                section,
                month,
                deposit_due_date,
                transaction_count: bucket.count,
                total_amount: bucket.amount,
                total_tax: bucket.tax,
            })
            .collect(),
        deductees,
        section_summary: sections
            .into_iter()
            .map(|(section, bucket)| SectionSummary {
                section,
                transaction_count: bucket.count,
                total_amount: bucket.amount,
                total_tax: bucket.tax,
            })
            .collect(),
        vendor_summary,
        certificates,
        totals: FilingTotals {
            transaction_count: totals.count,
            total_amount: totals.amount,
            total_tax: totals.tax,
            pending_count,
        },
        validation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::{CertificateType, GenerateCertificate};
    use crate::context::Actor;
    use crate::engine::TaxEngine;
    use crate::engine::tests::test_engine;
    use crate::rate::tests::new_rate;
    use crate::transaction::tests::new_transaction;
    use crate::transaction::{NewTransaction, TransactionPatch};
    use crate::vendor::tests::new_vendor;
    use chrono::Datelike;
    use kosh_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month_of(row: &ChallanRow) -> u32 {
        NaiveDate::parse_from_str(&format!("{}-01", row.month), "%Y-%m-%d")
            .unwrap()
            .month()
    }

    fn q1() -> FinancialQuarter {
        "2024-25/Q1".parse().unwrap()
    }

    async fn record(
        engine: &TaxEngine,
        actor: &Actor,
        input: NewTransaction,
        complete: bool,
    ) -> TaxTransaction {
        let tx = engine.transactions().create(actor, input).await.unwrap();
        if !complete {
            return tx;
        }
        engine
            .transactions()
            .update(
                actor,
                tx.id,
                TransactionPatch {
                    status: Some(TransactionStatus::Completed),
                    ..TransactionPatch::default()
                },
            )
            .await
            .unwrap()
    }

    async fn seeded() -> (TaxEngine, Actor) {
        let engine = test_engine();
        let actor = Actor::new(CompanyId::new(), UserId::new());
        engine
            .rates()
            .add_rate(&actor, new_rate(TaxKind::Tds, "194C", dec!(1)))
            .await
            .unwrap();
        engine
            .rates()
            .add_rate(&actor, new_rate(TaxKind::Tds, "194J", dec!(10)))
            .await
            .unwrap();
        engine.vendors().create(&actor, new_vendor("V001")).await.unwrap();
        engine.vendors().create(&actor, new_vendor("V002")).await.unwrap();

        let mut may = new_transaction("V001", dec!(100000));
        may.transaction_date = date(2024, 5, 10);
        record(&engine, &actor, may, true).await;
        record(&engine, &actor, new_transaction("V001", dec!(50000)), true).await;

        let mut fees = new_transaction("V002", dec!(40000));
        fees.transaction_type = "professional_fees".to_string();
        record(&engine, &actor, fees, true).await;

        record(&engine, &actor, new_transaction("V002", dec!(35000)), false).await;
        (engine, actor)
    }

    #[tokio::test]
    async fn test_filing_groups_challans_and_sections() {
        let (engine, actor) = seeded().await;
        let filing = engine
            .filings()
            .generate(actor.company_id, q1(), TaxKind::Tds, date(2024, 7, 15))
            .await
            .unwrap();

        assert_eq!(filing.header.form, "26Q");
        assert_eq!(filing.header.due_date, date(2024, 7, 31));
        assert_eq!(filing.deductees.len(), 3);
        assert_eq!(filing.totals.total_tax, dec!(5500));
        assert_eq!(filing.totals.pending_count, 1);

        let keys: Vec<_> = filing
            .challans
            .iter()
            .map(|c| (c.section.as_str(), month_of(c)))
            .collect();
        assert_eq!(keys, [("194C", 5), ("194C", 6), ("194J", 6)]);
        assert_eq!(filing.challans[0].deposit_due_date, date(2024, 6, 7));

        let sections: Vec<_> = filing
            .section_summary
            .iter()
            .map(|s| (s.section.as_str(), s.total_tax))
            .collect();
        assert_eq!(sections, [("194C", dec!(1500)), ("194J", dec!(4000))]);
    }

    #[tokio::test]
    async fn test_filing_warnings_for_pending_and_missing_certificates() {
        let (engine, actor) = seeded().await;
        engine
            .certificates()
            .generate(
                &actor,
                GenerateCertificate {
                    vendor_id: Some("V001".to_string()),
                    certificate_type: CertificateType::Tds,
                    period_start: date(2024, 4, 1),
                    period_end: date(2024, 6, 30),
                    quarter: None,
                },
            )
            .await
            .unwrap();

        let filing = engine
            .filings()
            .generate(actor.company_id, q1(), TaxKind::Tds, date(2024, 7, 15))
            .await
            .unwrap();

        assert!(filing.validation.is_valid);
        assert_eq!(filing.certificates.len(), 1);
        assert!(filing.validation.warnings.iter().any(|w| w.contains("pending")));
        assert!(
            filing
                .validation
                .warnings
                .iter()
                .any(|w| w.contains("vendor V002"))
        );
        assert!(
            !filing
                .validation
                .warnings
                .iter()
                .any(|w| w.contains("vendor V001"))
        );
        let v001 = filing
            .vendor_summary
            .iter()
            .find(|v| v.vendor_id == "V001")
            .unwrap();
        assert_eq!(
            v001.certificate_number.as_deref(),
            Some("TDS/2024-25/Q1/V001")
        );
    }

    #[tokio::test]
    async fn test_late_filing_is_warned() {
        let (engine, actor) = seeded().await;
        let filing = engine
            .filings()
            .generate(actor.company_id, q1(), TaxKind::Tds, date(2024, 8, 1))
            .await
            .unwrap();
        assert!(filing.validation.warnings.iter().any(|w| w.contains("late")));
    }

    #[tokio::test]
    async fn test_tcs_filing_uses_27eq_and_excludes_tds() {
        let (engine, actor) = seeded().await;
        let filing = engine
            .filings()
            .generate(actor.company_id, q1(), TaxKind::Tcs, date(2024, 7, 1))
            .await
            .unwrap();
        assert_eq!(filing.header.form, "27EQ");
        assert!(filing.deductees.is_empty());
        assert_eq!(filing.totals.total_tax, Decimal::ZERO);
    }

    #[test]
    fn test_bad_deductor_tan_and_missing_pan_are_errors() {
        let mut config = crate::engine::tests::test_config();
        config.deductor.tan = "BAD".to_string();

        let mut tx = crate::transaction::tests::stored_transaction(CompanyId::new(), "V009");
        tx.status = TransactionStatus::Completed;
        tx.pan_number = None;
        tx.tax_amount = dec!(100);

        let vendors = HashMap::new();
        let filing = assemble(FilingInputs {
            quarter: q1(),
            kind: TaxKind::Tds,
            as_of: date(2024, 7, 1),
            deductor: &config.deductor,
            identity: &config.identity,
            transactions: std::slice::from_ref(&tx),
            vendors: &vendors,
            certificates: Vec::new(),
        });

        assert!(!filing.validation.is_valid);
        assert!(filing.validation.errors.iter().any(|e| e.contains("TAN")));
        assert!(filing.validation.errors.iter().any(|e| e.contains("without a PAN")));
    }
}
