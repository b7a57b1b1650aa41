//! The withholding engine: repositories plus compiled configuration.

use kosh_shared::config::{DeductorConfig, TaxConfig};

use crate::alerts::AlertService;
use crate::certificate::CertificateService;
use crate::error::TaxError;
use crate::filing::FilingService;
use crate::identity::IdentityRules;
use crate::memory;
use crate::rate::RateRegistry;
use crate::reports::ReportService;
use crate::repository::Repositories;
use crate::section::SectionCatalog;
use crate::transaction::TransactionService;
use crate::vendor::VendorRegistry;
use crate::workflow::WorkflowService;

/// Configuration compiled from `[tax]`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// PAN/TAN patterns and sanitizer.
    pub identity: IdentityRules,
    /// Sections and transaction-type mapping.
    pub catalog: SectionCatalog,
    /// Deductor profile printed on filings.
    pub deductor: DeductorConfig,
    /// Default alert look-ahead in days.
    pub alert_horizon_days: u32,
}

impl EngineConfig {
    /// Compiles the tax configuration.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::Configuration` on invalid patterns or catalog entries.
    pub fn from_config(tax: &TaxConfig) -> Result<Self, TaxError> {
        Ok(Self {
            identity: IdentityRules::new(&tax.pan_pattern, &tax.tan_pattern)?,
            catalog: SectionCatalog::from_config(&tax.sections, &tax.transaction_types)?,
            deductor: tax.deductor.clone(),
            alert_horizon_days: tax.alert_horizon_days,
        })
    }
}

/// Entry point for all withholding operations.
///
/// Each accessor returns a short-lived service borrowing the engine.
#[derive(Debug, Clone)]
pub struct TaxEngine {
    repos: Repositories,
    config: EngineConfig,
}

impl TaxEngine {
    /// Creates an engine over the given repositories.
    #[must_use]
    pub fn new(repos: Repositories, config: EngineConfig) -> Self {
        Self { repos, config }
    }

    /// Creates an engine backed by process-local storage.
    #[must_use]
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(memory::repositories(), config)
    }

    /// Compiled configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying repositories.
    #[must_use]
    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Rate registry.
    #[must_use]
    pub fn rates(&self) -> RateRegistry<'_> {
        RateRegistry::new(&self.repos, &self.config)
    }

    /// Vendor registry.
    #[must_use]
    pub fn vendors(&self) -> VendorRegistry<'_> {
        VendorRegistry::new(&self.repos, &self.config)
    }

    /// Transaction calculator.
    #[must_use]
    pub fn transactions(&self) -> TransactionService<'_> {
        TransactionService::new(&self.repos, &self.config)
    }

    /// Certificate issuance.
    #[must_use]
    pub fn certificates(&self) -> CertificateService<'_> {
        CertificateService::new(&self.repos, &self.config)
    }

    /// Quarterly filing aggregation.
    #[must_use]
    pub fn filings(&self) -> FilingService<'_> {
        FilingService::new(&self.repos, &self.config)
    }

    /// Summaries and compliance status.
    #[must_use]
    pub fn reports(&self) -> ReportService<'_> {
        ReportService::new(&self.repos, &self.config)
    }

    /// Compliance alerts.
    #[must_use]
    pub fn alerts(&self) -> AlertService<'_> {
        AlertService::new(&self.repos, &self.config)
    }

    /// Multi-step workflows.
    #[must_use]
    pub fn workflows(&self) -> WorkflowService<'_> {
        WorkflowService::new(&self.repos, &self.config)
    }
}
