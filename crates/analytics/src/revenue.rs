//! Revenue extraction from the `product_list` column of purchase hits.
//!
//! A product list is a comma separated list of entries, each entry a
//! semicolon separated tuple `category;name;quantity;revenue;...`.

use keyword_core::config::{MalformedProductPolicy, PipelineConfig};
use keyword_core::error::{KeywordError, KeywordResult};
use tracing::warn;

/// Zero-based position of the revenue field inside a product entry.
const REVENUE_FIELD: usize = 3;

#[derive(Debug, Clone)]
pub struct RevenueExtractor {
    purchase_event_code: f64,
    policy: MalformedProductPolicy,
}

impl Default for RevenueExtractor {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl RevenueExtractor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            purchase_event_code: config.purchase_event_code,
            policy: config.malformed_products,
        }
    }

    pub fn is_purchase(&self, event_code: Option<f64>) -> bool {
        event_code == Some(self.purchase_event_code)
    }

    /// Revenue of a single hit. Non-purchase hits and empty product lists
    /// are worth 0.0; purchases sum the revenue field of every entry.
    pub fn extract(&self, event_code: Option<f64>, product_list: &str) -> KeywordResult<f64> {
        if !self.is_purchase(event_code) || product_list.trim().is_empty() {
            return Ok(0.0);
        }

        product_list
            .split(',')
            .map(|entry| self.entry_revenue(entry))
            .sum()
    }

    fn entry_revenue(&self, entry: &str) -> KeywordResult<f64> {
        let parsed = match entry.split(';').nth(REVENUE_FIELD).map(str::trim) {
            None => Err(format!(
                "expected at least {} ';' separated fields",
                REVENUE_FIELD + 1
            )),
            Some("") => Ok(0.0),
            Some(field) => field
                .parse::<f64>()
                .map_err(|e| format!("revenue field {field:?}: {e}")),
        };

        match parsed {
            Ok(revenue) => Ok(revenue),
            Err(reason) => match self.policy {
                MalformedProductPolicy::Zero => {
                    metrics::counter!("pipeline.malformed_products").increment(1);
                    warn!(entry = %entry, reason = %reason, "Malformed product entry counted as zero revenue");
                    Ok(0.0)
                }
                MalformedProductPolicy::Reject => Err(KeywordError::MalformedProduct {
                    entry: entry.to_string(),
                    reason,
                }),
            },
        }
    }
}
