//! Rate registry: creation, guarded updates and applicable-rate lookup.

use chrono::{NaiveDate, Utc};
use kosh_shared::types::{CompanyId, RateId};
use rust_decimal::Decimal;
use tracing::info;

use super::types::{NewRate, RateFilter, RateListing, RatePatch, RateRecord, same_nature};
use crate::context::Actor;
use crate::engine::EngineConfig;
use crate::error::TaxError;
use crate::repository::{RepositoryError, Repositories};
use crate::section::{TaxKind, normalize_code};
use crate::transaction::calculator;

/// Validates a percentage field.
pub(crate) fn check_percent(field: &'static str, value: Decimal) -> Result<(), TaxError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(TaxError::PercentOutOfRange { field, value });
    }
    Ok(())
}

/// Validates the numeric fields and the window of a rate.
pub(crate) fn check_rate_values(
    rate: Decimal,
    surcharge_rate: Decimal,
    education_cess_rate: Decimal,
    threshold_limit: Decimal,
    valid_from: NaiveDate,
    valid_to: Option<NaiveDate>,
) -> Result<(), TaxError> {
    check_percent("rate", rate)?;
    check_percent("surchargeRate", surcharge_rate)?;
    check_percent("educationCessRate", education_cess_rate)?;
    if threshold_limit < Decimal::ZERO {
        return Err(TaxError::NegativeThreshold);
    }
    if let Some(to) = valid_to
        && valid_from >= to
    {
        return Err(TaxError::InvalidValidityWindow {
            from: valid_from,
            to,
        });
    }
    Ok(())
}

/// Picks the single applicable record from candidates already known to be
/// active, of the right kind and section, and covering the date.
///
/// Preference: exact nature match, then records without a nature. Records of
/// any nature are considered only when no nature is requested.
pub(crate) fn select_applicable<'r>(
    candidates: impl IntoIterator<Item = &'r RateRecord>,
    section: &str,
    nature: Option<&str>,
    on: NaiveDate,
) -> Result<&'r RateRecord, TaxError> {
    let candidates: Vec<&RateRecord> = candidates.into_iter().collect();

    let exact: Vec<&RateRecord> = match nature {
        Some(n) => candidates
            .iter()
            .copied()
            .filter(|r| same_nature(r.nature.as_deref(), Some(n)))
            .collect(),
        None => Vec::new(),
    };
    let pool = if exact.is_empty() {
        let generic: Vec<&RateRecord> = candidates
            .iter()
            .copied()
            .filter(|r| r.nature.is_none())
            .collect();
        if generic.is_empty() && nature.is_none() {
            candidates
        } else {
            generic
        }
    } else {
        exact
    };

    match pool.as_slice() {
        [] => Err(TaxError::NoApplicableRate {
            section: section.to_string(),
            date: on,
        }),
        [only] => Ok(*only),
        _ => Err(TaxError::AmbiguousRate {
            section: section.to_string(),
            date: on,
        }),
    }
}

/// Rate registry operations.
pub struct RateRegistry<'a> {
    repos: &'a Repositories,
    config: &'a EngineConfig,
}

impl<'a> RateRegistry<'a> {
    /// Creates the registry view.
    #[must_use]
    pub fn new(repos: &'a Repositories, config: &'a EngineConfig) -> Self {
        Self { repos, config }
    }

    /// Adds a rate record after validating ranges, window, section and overlap.
    pub async fn add_rate(&self, actor: &Actor, input: NewRate) -> Result<RateRecord, TaxError> {
        check_rate_values(
            input.rate,
            input.surcharge_rate,
            input.education_cess_rate,
            input.threshold_limit,
            input.valid_from,
            input.valid_to,
        )?;
        let section = self
            .config
            .catalog
            .require(input.kind, &input.section)?
            .code
            .clone();
        let identity = &self.config.identity;
        let nature = identity.sanitize_optional(input.nature.as_deref());

        self.ensure_no_overlap(
            actor.company_id,
            input.kind,
            &section,
            nature.as_deref(),
            input.valid_from,
            input.valid_to,
            None,
        )
        .await?;

        let now = Utc::now();
        let record = RateRecord {
            id: RateId::new(),
            company_id: actor.company_id,
            kind: input.kind,
            section: section.clone(),
            nature,
            rate: input.rate,
            surcharge_rate: input.surcharge_rate,
            education_cess_rate: input.education_cess_rate,
            effective_rate: calculator::effective_rate(
                input.rate,
                input.surcharge_rate,
                input.education_cess_rate,
            ),
            valid_from: input.valid_from,
            valid_to: input.valid_to,
            threshold_limit: input.threshold_limit,
            pan_required: input.pan_required,
            tan_required: input.tan_required,
            is_active: true,
            description: identity.sanitize_optional(input.description.as_deref()),
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .repos
            .rates
            .insert(record)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => TaxError::DuplicateRate {
                    section: section.clone(),
                },
                other => other.into(),
            })?;

        info!(
            company_id = %actor.company_id,
            rate_id = %saved.id,
            kind = saved.kind.as_str(),
            section = %saved.section,
            rate = %saved.rate,
            effective_rate = %saved.effective_rate,
            "rate record created"
        );
        Ok(saved)
    }

    /// Applies a patch to a rate record.
    ///
    /// Section and nature are immutable. Rate, surcharge, cess and threshold
    /// are frozen once any transaction references the record.
    pub async fn update_rate(
        &self,
        actor: &Actor,
        kind: TaxKind,
        id: RateId,
        patch: RatePatch,
    ) -> Result<RateRecord, TaxError> {
        let mut record = self.get(actor.company_id, kind, id).await?;

        if let Some(section) = patch.section.as_deref()
            && normalize_code(section) != record.section
        {
            return Err(TaxError::ImmutableField("section"));
        }
        if let Some(nature) = patch.nature.as_deref()
            && !record.nature_matches(Some(nature))
        {
            return Err(TaxError::ImmutableField(match kind {
                TaxKind::Tds => "natureOfPayment",
                TaxKind::Tcs => "natureOfSale",
            }));
        }

        if patch.changes_values(&record) {
            let referenced = self
                .repos
                .transactions
                .count_by_rate(actor.company_id, id)
                .await?;
            if referenced > 0 {
                return Err(TaxError::RateInUse(referenced));
            }
        }

        let window_changed = patch.valid_from.is_some_and(|d| d != record.valid_from)
            || patch.valid_to.is_some_and(|d| Some(d) != record.valid_to)
            || (patch.is_active == Some(true) && !record.is_active);

        record.rate = patch.rate.unwrap_or(record.rate);
        record.surcharge_rate = patch.surcharge_rate.unwrap_or(record.surcharge_rate);
        record.education_cess_rate = patch
            .education_cess_rate
            .unwrap_or(record.education_cess_rate);
        record.threshold_limit = patch.threshold_limit.unwrap_or(record.threshold_limit);
        record.valid_from = patch.valid_from.unwrap_or(record.valid_from);
        if patch.valid_to.is_some() {
            record.valid_to = patch.valid_to;
        }
        record.pan_required = patch.pan_required.unwrap_or(record.pan_required);
        record.tan_required = patch.tan_required.unwrap_or(record.tan_required);
        record.is_active = patch.is_active.unwrap_or(record.is_active);
        if let Some(description) = patch.description.as_deref() {
            record.description = self.config.identity.sanitize_optional(Some(description));
        }

        check_rate_values(
            record.rate,
            record.surcharge_rate,
            record.education_cess_rate,
            record.threshold_limit,
            record.valid_from,
            record.valid_to,
        )?;

        if window_changed && record.is_active {
            self.ensure_no_overlap(
                actor.company_id,
                record.kind,
                &record.section,
                record.nature.as_deref(),
                record.valid_from,
                record.valid_to,
                Some(record.id),
            )
            .await?;
        }

        record.effective_rate = calculator::effective_rate(
            record.rate,
            record.surcharge_rate,
            record.education_cess_rate,
        );
        record.updated_at = Utc::now();

        let saved = self.repos.rates.update(record).await?;
        info!(
            company_id = %actor.company_id,
            rate_id = %saved.id,
            is_active = saved.is_active,
            "rate record updated"
        );
        Ok(saved)
    }

    /// Fetches a rate of the given kind.
    pub async fn get(
        &self,
        company: CompanyId,
        kind: TaxKind,
        id: RateId,
    ) -> Result<RateRecord, TaxError> {
        self.repos
            .rates
            .get(company, id)
            .await?
            .filter(|r| r.kind == kind)
            .ok_or_else(|| TaxError::RateNotFound(id.to_string()))
    }

    /// The unique active record for (kind, section, nature) covering `on`.
    pub async fn find_applicable(
        &self,
        company: CompanyId,
        kind: TaxKind,
        section: &str,
        nature: Option<&str>,
        on: NaiveDate,
    ) -> Result<RateRecord, TaxError> {
        let section = self.config.catalog.require(kind, section)?.code.clone();
        let filter = RateFilter {
            kind: Some(kind),
            active: Some(true),
            section: Some(section.clone()),
            applicable_on: Some(on),
        };
        let candidates = self.repos.rates.list(company, &filter).await?;
        select_applicable(&candidates, &section, nature, on).cloned()
    }

    /// Lists records, optionally with a worked example for `sample_amount`.
    pub async fn list(
        &self,
        company: CompanyId,
        filter: &RateFilter,
        sample_amount: Option<Decimal>,
    ) -> Result<Vec<RateListing>, TaxError> {
        if sample_amount.is_some_and(|a| a < Decimal::ZERO) {
            return Err(TaxError::NegativeAmount);
        }
        let records = self.repos.rates.list(company, filter).await?;
        Ok(records
            .into_iter()
            .map(|rate| {
                let calculation_example = sample_amount
                    .map(|amount| calculator::breakdown(amount, &(&rate).into()));
                RateListing {
                    rate,
                    calculation_example,
                }
            })
            .collect())
    }

    #[allow(clippy::too_many_arguments)]
    async fn ensure_no_overlap(
        &self,
        company: CompanyId,
        kind: TaxKind,
        section: &str,
        nature: Option<&str>,
        from: NaiveDate,
        to: Option<NaiveDate>,
        exclude: Option<RateId>,
    ) -> Result<(), TaxError> {
        let filter = RateFilter {
            kind: Some(kind),
            active: Some(true),
            section: Some(section.to_string()),
            applicable_on: None,
        };
        let clash = self
            .repos
            .rates
            .list(company, &filter)
            .await?
            .into_iter()
            .filter(|r| Some(r.id) != exclude)
            .any(|r| r.nature_matches(nature) && r.overlaps(from, to));

        if clash {
            return Err(TaxError::DuplicateRate {
                section: section.to_string(),
            });
        }
        Ok(())
    }
}
