//! Section catalog and transaction-type mapping.
//!
//! Which sections exist and which transaction types map to which section is
//! regulatory data loaded from configuration.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use kosh_shared::config::{SectionConfig, TransactionTypeConfig};
use serde::{Deserialize, Serialize};

use crate::error::TaxError;

/// Withholding kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxKind {
    /// Tax deducted at source (company pays a vendor).
    Tds,
    /// Tax collected at source (company sells to a buyer).
    Tcs,
}

impl TaxKind {
    /// Lowercase storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tds => "tds",
            Self::Tcs => "tcs",
        }
    }

    /// Upper-case display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tds => "TDS",
            Self::Tcs => "TCS",
        }
    }

    /// Quarterly return form number.
    #[must_use]
    pub const fn return_form(self) -> &'static str {
        match self {
            Self::Tds => "26Q",
            Self::Tcs => "27EQ",
        }
    }
}

impl fmt::Display for TaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaxKind {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tds" => Ok(Self::Tds),
            "tcs" => Ok(Self::Tcs),
            other => Err(TaxError::Validation(format!("unknown tax kind: {other}"))),
        }
    }
}

/// A section known to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Section code, e.g. "194C".
    pub code: String,
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Description.
    pub description: String,
}

/// Result of resolving a transaction to a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSection {
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code.
    pub section: String,
    /// Nature of payment/sale label, when the mapping names one.
    pub nature: Option<String>,
}

#[derive(Debug, Clone)]
struct TypeRule {
    section: String,
    nature: Option<String>,
}

/// Known sections plus the transaction-type mapping.
#[derive(Debug, Clone, Default)]
pub struct SectionCatalog {
    sections: HashMap<String, Section>,
    types: HashMap<String, TypeRule>,
}

/// Canonical form of a section code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn normalize_type(name: &str) -> String {
    name.trim().to_lowercase()
}

impl SectionCatalog {
    /// Builds the catalog from configuration.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::Configuration` on an unknown kind, a duplicate
    /// section code, or a transaction type pointing at an unknown section.
    pub fn from_config(
        sections: &[SectionConfig],
        transaction_types: &[TransactionTypeConfig],
    ) -> Result<Self, TaxError> {
        let mut catalog = Self::default();

        for entry in sections {
            let kind = entry.kind.parse::<TaxKind>().map_err(|_| {
                TaxError::Configuration(format!(
                    "section {} has unknown kind {}",
                    entry.code, entry.kind
                ))
            })?;
            let code = normalize_code(&entry.code);
            let section = Section {
                code: code.clone(),
                kind,
                description: entry.description.clone(),
            };
            if catalog.sections.insert(code.clone(), section).is_some() {
                return Err(TaxError::Configuration(format!(
                    "section {code} is listed twice"
                )));
            }
        }

        for entry in transaction_types {
            let section = normalize_code(&entry.section);
            if !catalog.sections.contains_key(&section) {
                return Err(TaxError::Configuration(format!(
                    "transaction type {} maps to unknown section {section}",
                    entry.name
                )));
            }
            catalog.types.insert(
                normalize_type(&entry.name),
                TypeRule {
                    section,
                    nature: entry.nature.clone(),
                },
            );
        }

        Ok(catalog)
    }

    /// Looks up a section by code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Section> {
        self.sections.get(&normalize_code(code))
    }

    /// All sections of a kind, sorted by code.
    #[must_use]
    pub fn sections_of(&self, kind: TaxKind) -> Vec<&Section> {
        let mut sections: Vec<&Section> =
            self.sections.values().filter(|s| s.kind == kind).collect();
        sections.sort_by(|a, b| a.code.cmp(&b.code));
        sections
    }

    /// Requires `code` to be a section of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::InvalidSection` when it is unknown or of the other kind.
    pub fn require(&self, kind: TaxKind, code: &str) -> Result<&Section, TaxError> {
        self.get(code)
            .filter(|s| s.kind == kind)
            .ok_or_else(|| TaxError::InvalidSection {
                kind: Some(kind),
                code: code.trim().to_string(),
            })
    }

    /// Resolves the section for a transaction.
    ///
    /// An explicit section wins over the type mapping; the mapping's nature
    /// label is kept only when it points at the same section.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::InvalidSection` for an unknown explicit section and
    /// `TaxError::UnknownTransactionType` when neither source resolves.
    pub fn resolve(
        &self,
        transaction_type: &str,
        explicit_section: Option<&str>,
    ) -> Result<ResolvedSection, TaxError> {
        let rule = self.types.get(&normalize_type(transaction_type));

        if let Some(code) = explicit_section.map(str::trim).filter(|c| !c.is_empty()) {
            let Some(section) = self.get(code) else {
                let kind = rule
                    .and_then(|r| self.sections.get(&r.section))
                    .map(|s| s.kind);
                return Err(TaxError::InvalidSection {
                    kind,
                    code: code.to_string(),
                });
            };
            let nature = rule
                .filter(|r| r.section == section.code)
                .and_then(|r| r.nature.clone());
            return Ok(ResolvedSection {
                kind: section.kind,
                section: section.code.clone(),
                nature,
            });
        }

        let rule =
            rule.ok_or_else(|| TaxError::UnknownTransactionType(transaction_type.to_string()))?;
        let section = self
            .sections
            .get(&rule.section)
            .ok_or_else(|| TaxError::Configuration(format!("unmapped section {}", rule.section)))?;

        Ok(ResolvedSection {
            kind: section.kind,
            section: section.code.clone(),
            nature: rule.nature.clone(),
        })
    }
}
