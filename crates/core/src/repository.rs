//! Storage seams.
//!
//! Services depend only on these traits. The in-memory implementation lives in
//! [`crate::memory`]; the PostgreSQL one lives in the `kosh-db` crate. Every
//! method is scoped by company.

use std::sync::Arc;

use async_trait::async_trait;
use kosh_shared::types::{CertificateId, CompanyId, RateId, TransactionId};
use thiserror::Error;

use crate::certificate::{Certificate, CertificateFilter};
use crate::rate::{RateFilter, RateRecord};
use crate::transaction::{TaxTransaction, TransactionFilter};
use crate::vendor::{VendorFilter, VendorProfile};

/// Storage contract errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique key is already taken.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// The record to update does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The record is still referenced by other records.
    #[error("record still referenced: {0}")]
    Referenced(String),

    /// Backend failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Result type for repository calls.
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Rate record storage.
#[async_trait]
pub trait RateRepository: Send + Sync {
    /// Inserts a new record.
    async fn insert(&self, rate: RateRecord) -> RepoResult<RateRecord>;
    /// Replaces an existing record.
    async fn update(&self, rate: RateRecord) -> RepoResult<RateRecord>;
    /// Fetches a record by ID.
    async fn get(&self, company: CompanyId, id: RateId) -> RepoResult<Option<RateRecord>>;
    /// Lists records matching the filter, ordered by kind, section, then `valid_from`.
    async fn list(&self, company: CompanyId, filter: &RateFilter) -> RepoResult<Vec<RateRecord>>;
}

/// Vendor profile storage. Vendors are keyed by their business `vendor_id`.
#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// Inserts a new profile; `Duplicate` when the vendor ID is taken.
    async fn insert(&self, vendor: VendorProfile) -> RepoResult<VendorProfile>;
    /// Replaces an existing profile.
    async fn update(&self, vendor: VendorProfile) -> RepoResult<VendorProfile>;
    /// Fetches a profile by vendor ID.
    async fn get(&self, company: CompanyId, vendor_id: &str) -> RepoResult<Option<VendorProfile>>;
    /// Fetches several profiles at once. Unknown IDs are skipped.
    async fn get_many(
        &self,
        company: CompanyId,
        vendor_ids: &[String],
    ) -> RepoResult<Vec<VendorProfile>>;
    /// Removes a profile. Returns false when it did not exist and
    /// `Referenced` when a transaction points at it. The reference check and
    /// the removal are one atomic step.
    async fn delete(&self, company: CompanyId, vendor_id: &str) -> RepoResult<bool>;
    /// Lists profiles matching the filter, ordered by vendor ID.
    async fn list(&self, company: CompanyId, filter: &VendorFilter)
    -> RepoResult<Vec<VendorProfile>>;
}

/// Tax transaction storage.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Inserts a new transaction; `NotFound(vendor_id)` when the vendor
    /// profile no longer exists.
    async fn insert(&self, transaction: TaxTransaction) -> RepoResult<TaxTransaction>;
    /// Replaces an existing transaction.
    async fn update(&self, transaction: TaxTransaction) -> RepoResult<TaxTransaction>;
    /// Fetches a transaction by ID.
    async fn get(
        &self,
        company: CompanyId,
        id: TransactionId,
    ) -> RepoResult<Option<TaxTransaction>>;
    /// Lists transactions matching the filter, ordered by date then creation.
    async fn list(
        &self,
        company: CompanyId,
        filter: &TransactionFilter,
    ) -> RepoResult<Vec<TaxTransaction>>;
    /// Number of transactions whose frozen rate came from `rate`.
    async fn count_by_rate(&self, company: CompanyId, rate: RateId) -> RepoResult<u64>;
}

/// Certificate storage.
///
/// `insert` must be atomic on `(company, certificate_number)`: of several
/// concurrent inserts with the same number exactly one succeeds and the rest
/// get `Duplicate`.
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Inserts a new certificate.
    async fn insert(&self, certificate: Certificate) -> RepoResult<Certificate>;
    /// Replaces an existing certificate.
    async fn update(&self, certificate: Certificate) -> RepoResult<Certificate>;
    /// Fetches a certificate by ID.
    async fn get(&self, company: CompanyId, id: CertificateId) -> RepoResult<Option<Certificate>>;
    /// Lists certificates matching the filter, ordered by certificate number.
    async fn list(
        &self,
        company: CompanyId,
        filter: &CertificateFilter,
    ) -> RepoResult<Vec<Certificate>>;
}

/// The set of repositories the engine runs against.
#[derive(Clone)]
pub struct Repositories {
    /// Rate records.
    pub rates: Arc<dyn RateRepository>,
    /// Vendor profiles.
    pub vendors: Arc<dyn VendorRepository>,
    /// Tax transactions.
    pub transactions: Arc<dyn TransactionRepository>,
    /// Certificates.
    pub certificates: Arc<dyn CertificateRepository>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
