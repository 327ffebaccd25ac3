//! Search keyword performance aggregation.
//!
//! Pipeline: classify every hit's referrer, gap-fill the derived columns per
//! visitor, lower-case keywords, extract revenue per hit, then sum revenue by
//! (search engine, keyword).

use crate::classifier::{classify_domain, extract_keyword};
use crate::gap_fill::VisitorGroups;
use crate::revenue::RevenueExtractor;
use keyword_core::config::PipelineConfig;
use keyword_core::error::{KeywordError, KeywordResult};
use keyword_core::types::{AggregationKey, ClickRecord, EnrichedRecord, ResultRow};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct Aggregator {
    revenue: RevenueExtractor,
    sort_by_revenue: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl Aggregator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            revenue: RevenueExtractor::new(config),
            sort_by_revenue: config.sort_by_revenue,
        }
    }

    /// Derive search engine, keyword and revenue for every hit.
    pub fn enrich<'a>(&self, records: &'a [ClickRecord]) -> KeywordResult<Vec<EnrichedRecord<'a>>> {
        let mut engines: Vec<_> = records
            .iter()
            .map(|r| classify_domain(r.referrer.as_deref()))
            .collect();
        let mut keywords: Vec<_> = records
            .iter()
            .map(|r| extract_keyword(r.referrer.as_deref()))
            .collect();

        let groups = VisitorGroups::from_records(records);
        groups.fill(&mut engines);
        groups.fill(&mut keywords);
        debug!(rows = records.len(), visitors = groups.len(), "Gap-filled referrer attributes");

        let mut purchases = 0u64;
        let mut enriched = Vec::with_capacity(records.len());
        for ((record, search_engine), search_keyword) in records.iter().zip(engines).zip(keywords) {
            if self.revenue.is_purchase(record.event_code) {
                purchases += 1;
            }
            enriched.push(EnrichedRecord {
                record,
                search_engine,
                search_keyword: search_keyword.map(|k| k.to_lowercase()),
                revenue: self.revenue.extract(record.event_code, &record.product_list)?,
            });
        }

        metrics::counter!("pipeline.rows_enriched").increment(records.len() as u64);
        metrics::counter!("pipeline.purchases").increment(purchases);
        Ok(enriched)
    }

    /// Sum revenue per (search engine, keyword). Rows come out in key order,
    /// then stably sorted by ascending revenue when sorting is enabled.
    pub fn aggregate(&self, enriched: &[EnrichedRecord<'_>]) -> Vec<ResultRow> {
        let mut totals: BTreeMap<AggregationKey, f64> = BTreeMap::new();
        for row in enriched {
            *totals.entry(row.aggregation_key()).or_insert(0.0) += row.revenue;
        }

        let mut rows: Vec<ResultRow> = totals
            .into_iter()
            .map(|(key, revenue)| ResultRow::new(key, revenue))
            .collect();

        if self.sort_by_revenue {
            rows.sort_by(|a, b| a.revenue.total_cmp(&b.revenue));
        }
        rows
    }

    /// Run the whole pipeline. `None` means no table was read at all and is
    /// an error; an empty table yields an empty result.
    pub fn process(&self, records: Option<&[ClickRecord]>) -> KeywordResult<Vec<ResultRow>> {
        let records = records.ok_or_else(|| {
            KeywordError::InputMissing("raw hit data is absent, nothing to aggregate".to_string())
        })?;

        let enriched = self.enrich(records)?;
        let rows = self.aggregate(&enriched);

        metrics::counter!("pipeline.result_rows").increment(rows.len() as u64);
        info!(
            input_rows = records.len(),
            result_rows = rows.len(),
            "Completed generating aggregated results"
        );
        Ok(rows)
    }
}
