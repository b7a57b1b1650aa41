//! In-memory storage backend using `DashMap`.
//!
//! Used by tests and by the server when `database.backend = "memory"`.
//! Uniqueness checks go through the map entry API so that concurrent inserts
//! of the same key resolve to a single winner.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use kosh_shared::types::{CertificateId, CompanyId, RateId, TransactionId};

use crate::certificate::{Certificate, CertificateFilter};
use crate::rate::{RateFilter, RateRecord};
use crate::repository::{
    CertificateRepository, RateRepository, RepoResult, Repositories, RepositoryError,
    TransactionRepository, VendorRepository,
};
use crate::transaction::{TaxTransaction, TransactionFilter};
use crate::vendor::{VendorFilter, VendorProfile};

type VendorKey = (CompanyId, String);

/// Builds a fresh, empty set of in-memory repositories.
#[must_use]
pub fn repositories() -> Repositories {
    let vendors = MemoryVendors::default();
    let transactions = MemoryTransactions::linked_to(&vendors);
    Repositories {
        rates: Arc::new(MemoryRates::default()),
        vendors: Arc::new(vendors),
        transactions: Arc::new(transactions),
        certificates: Arc::new(MemoryCertificates::default()),
    }
}

/// Rate records keyed by ID.
#[derive(Debug, Default)]
pub struct MemoryRates {
    records: DashMap<RateId, RateRecord>,
}

#[async_trait]
impl RateRepository for MemoryRates {
    async fn insert(&self, rate: RateRecord) -> RepoResult<RateRecord> {
        match self.records.entry(rate.id) {
            Entry::Occupied(_) => Err(RepositoryError::Duplicate(rate.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(rate.clone());
                Ok(rate)
            }
        }
    }

    async fn update(&self, rate: RateRecord) -> RepoResult<RateRecord> {
        match self.records.get_mut(&rate.id) {
            Some(mut existing) if existing.company_id == rate.company_id => {
                *existing = rate.clone();
                Ok(rate)
            }
            _ => Err(RepositoryError::NotFound(rate.id.to_string())),
        }
    }

    async fn get(&self, company: CompanyId, id: RateId) -> RepoResult<Option<RateRecord>> {
        Ok(self
            .records
            .get(&id)
            .filter(|r| r.company_id == company)
            .map(|r| r.value().clone()))
    }

    async fn list(&self, company: CompanyId, filter: &RateFilter) -> RepoResult<Vec<RateRecord>> {
        let mut rates: Vec<RateRecord> = self
            .records
            .iter()
            .filter(|r| r.company_id == company && filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        rates.sort_by(|a, b| {
            (a.kind, &a.section, a.valid_from).cmp(&(b.kind, &b.section, b.valid_from))
        });
        Ok(rates)
    }
}

/// Vendor profiles keyed by company and vendor ID.
///
/// `references` counts transactions per vendor. It is shared with the linked
/// [`MemoryTransactions`] and only touched while the vendor's map shard is
/// locked, so a delete never races a transaction insert.
#[derive(Debug, Default)]
pub struct MemoryVendors {
    profiles: Arc<DashMap<VendorKey, VendorProfile>>,
    references: Arc<DashMap<VendorKey, u64>>,
}

#[async_trait]
impl VendorRepository for MemoryVendors {
    async fn insert(&self, vendor: VendorProfile) -> RepoResult<VendorProfile> {
        match self
            .profiles
            .entry((vendor.company_id, vendor.vendor_id.clone()))
        {
            Entry::Occupied(_) => Err(RepositoryError::Duplicate(vendor.vendor_id)),
            Entry::Vacant(slot) => {
                slot.insert(vendor.clone());
                Ok(vendor)
            }
        }
    }

    async fn update(&self, vendor: VendorProfile) -> RepoResult<VendorProfile> {
        let key = (vendor.company_id, vendor.vendor_id.clone());
        match self.profiles.get_mut(&key) {
            Some(mut existing) => {
                *existing = vendor.clone();
                Ok(vendor)
            }
            None => Err(RepositoryError::NotFound(vendor.vendor_id)),
        }
    }

    async fn get(&self, company: CompanyId, vendor_id: &str) -> RepoResult<Option<VendorProfile>> {
        Ok(self
            .profiles
            .get(&(company, vendor_id.to_string()))
            .map(|v| v.value().clone()))
    }

    async fn get_many(
        &self,
        company: CompanyId,
        vendor_ids: &[String],
    ) -> RepoResult<Vec<VendorProfile>> {
        Ok(vendor_ids
            .iter()
            .filter_map(|id| self.profiles.get(&(company, id.clone())))
            .map(|v| v.value().clone())
            .collect())
    }

    async fn delete(&self, company: CompanyId, vendor_id: &str) -> RepoResult<bool> {
        match self.profiles.entry((company, vendor_id.to_string())) {
            Entry::Vacant(_) => Ok(false),
            Entry::Occupied(slot) => {
                if self.references.get(slot.key()).is_some_and(|n| *n > 0) {
                    return Err(RepositoryError::Referenced(vendor_id.to_string()));
                }
                slot.remove();
                Ok(true)
            }
        }
    }

    async fn list(
        &self,
        company: CompanyId,
        filter: &VendorFilter,
    ) -> RepoResult<Vec<VendorProfile>> {
        let mut vendors: Vec<VendorProfile> = self
            .profiles
            .iter()
            .filter(|v| v.key().0 == company && filter.matches(v.value()))
            .map(|v| v.value().clone())
            .collect();
        vendors.sort_by(|a, b| a.vendor_id.cmp(&b.vendor_id));
        Ok(vendors)
    }
}

/// Tax transactions keyed by ID.
#[derive(Debug)]
pub struct MemoryTransactions {
    records: DashMap<TransactionId, TaxTransaction>,
    profiles: Arc<DashMap<VendorKey, VendorProfile>>,
    references: Arc<DashMap<VendorKey, u64>>,
}

impl MemoryTransactions {
    /// Transactions that reference profiles held by `vendors`.
    #[must_use]
    pub fn linked_to(vendors: &MemoryVendors) -> Self {
        Self {
            records: DashMap::new(),
            profiles: Arc::clone(&vendors.profiles),
            references: Arc::clone(&vendors.references),
        }
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransactions {
    async fn insert(&self, transaction: TaxTransaction) -> RepoResult<TaxTransaction> {
        let key = (transaction.company_id, transaction.vendor_id.clone());
        // Held until the reference is counted; a vendor delete waits on it.
        let Some(_profile) = self.profiles.get(&key) else {
            return Err(RepositoryError::NotFound(transaction.vendor_id));
        };
        match self.records.entry(transaction.id) {
            Entry::Occupied(_) => Err(RepositoryError::Duplicate(transaction.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(transaction.clone());
                *self.references.entry(key).or_insert(0) += 1;
                Ok(transaction)
            }
        }
    }

    async fn update(&self, transaction: TaxTransaction) -> RepoResult<TaxTransaction> {
        match self.records.get_mut(&transaction.id) {
            Some(mut existing) if existing.company_id == transaction.company_id => {
                *existing = transaction.clone();
                Ok(transaction)
            }
            _ => Err(RepositoryError::NotFound(transaction.id.to_string())),
        }
    }

    async fn get(
        &self,
        company: CompanyId,
        id: TransactionId,
    ) -> RepoResult<Option<TaxTransaction>> {
        Ok(self
            .records
            .get(&id)
            .filter(|t| t.company_id == company)
            .map(|t| t.value().clone()))
    }

    async fn list(
        &self,
        company: CompanyId,
        filter: &TransactionFilter,
    ) -> RepoResult<Vec<TaxTransaction>> {
        let mut transactions: Vec<TaxTransaction> = self
            .records
            .iter()
            .filter(|t| t.company_id == company && filter.matches(t.value()))
            .map(|t| t.value().clone())
            .collect();
        transactions.sort_by(|a, b| {
            (a.transaction_date, a.created_at, a.id).cmp(&(b.transaction_date, b.created_at, b.id))
        });
        Ok(transactions)
    }

    async fn count_by_rate(&self, company: CompanyId, rate: RateId) -> RepoResult<u64> {
        let count = self
            .records
            .iter()
            .filter(|t| {
                t.company_id == company
                    && t.applied_rate.as_ref().is_some_and(|a| a.rate_id == rate)
            })
            .count();
        Ok(count as u64)
    }
}

/// Certificates keyed by ID, with a number index for uniqueness.
#[derive(Debug, Default)]
pub struct MemoryCertificates {
    records: DashMap<CertificateId, Certificate>,
    numbers: DashMap<(CompanyId, String), CertificateId>,
}

#[async_trait]
impl CertificateRepository for MemoryCertificates {
    async fn insert(&self, certificate: Certificate) -> RepoResult<Certificate> {
        let key = (certificate.company_id, certificate.certificate_number.clone());
        match self.numbers.entry(key) {
            Entry::Occupied(_) => Err(RepositoryError::Duplicate(
                certificate.certificate_number,
            )),
            Entry::Vacant(slot) => {
                slot.insert(certificate.id);
                self.records.insert(certificate.id, certificate.clone());
                Ok(certificate)
            }
        }
    }

    async fn update(&self, certificate: Certificate) -> RepoResult<Certificate> {
        match self.records.get_mut(&certificate.id) {
            Some(mut existing)
                if existing.company_id == certificate.company_id
                    && existing.certificate_number == certificate.certificate_number =>
            {
                *existing = certificate.clone();
                Ok(certificate)
            }
            _ => Err(RepositoryError::NotFound(certificate.id.to_string())),
        }
    }

    async fn get(&self, company: CompanyId, id: CertificateId) -> RepoResult<Option<Certificate>> {
        Ok(self
            .records
            .get(&id)
            .filter(|c| c.company_id == company)
            .map(|c| c.value().clone()))
    }

    async fn list(
        &self,
        company: CompanyId,
        filter: &CertificateFilter,
    ) -> RepoResult<Vec<Certificate>> {
        let mut certificates: Vec<Certificate> = self
            .records
            .iter()
            .filter(|c| c.company_id == company && filter.matches(c.value()))
            .map(|c| c.value().clone())
            .collect();
        certificates.sort_by(|a, b| a.certificate_number.cmp(&b.certificate_number));
        Ok(certificates)
    }
}
