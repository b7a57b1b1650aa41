//! Parallel bulk calculation over prefetched vendors and rates.

use std::collections::HashMap;

use rayon::prelude::*;
use rust_decimal::Decimal;

use super::service::compute_item;
use super::types::{BulkItem, BulkItemResult, BulkOutcome, BulkSummary, ItemError};
use crate::engine::EngineConfig;
use crate::rate::RateRecord;
use crate::vendor::VendorProfile;

/// Computes every item in parallel. Each result depends only on its own
/// vendor, the rates and the item, so output order equals input order.
pub(crate) fn run(
    config: &EngineConfig,
    vendors: &HashMap<String, VendorProfile>,
    rates: &[RateRecord],
    items: &[BulkItem],
) -> BulkOutcome {
    let results: Vec<BulkItemResult> = items
        .par_iter()
        .enumerate()
        .map(|(index, item)| {
            let vendor = vendors.get(item.vendor_id.trim());
            match compute_item(config, vendor, rates, item) {
                Ok(calculation) => BulkItemResult {
                    index,
                    success: true,
                    calculation: Some(calculation),
                    error: None,
                },
                Err(err) => BulkItemResult {
                    index,
                    success: false,
                    calculation: None,
                    error: Some(ItemError {
                        code: err.error_code().to_string(),
                        message: err.to_string(),
                    }),
                },
            }
        })
        .collect();

    let summary = summarize(items, &results);
    BulkOutcome { results, summary }
}

fn summarize(items: &[BulkItem], results: &[BulkItemResult]) -> BulkSummary {
    let mut summary = BulkSummary {
        total_items: results.len(),
        succeeded: 0,
        failed: 0,
        total_amount: Decimal::ZERO,
        total_tax: Decimal::ZERO,
    };
    for (item, result) in items.iter().zip(results) {
        match &result.calculation {
            Some(calculation) => {
                summary.succeeded += 1;
                summary.total_amount += item.amount;
                summary.total_tax += calculation.tax_amount;
            }
            None => summary.failed += 1,
        }
    }
    summary
}
