//! Clickstream enrichment and search keyword revenue aggregation:
//! referrer classification, per-visitor gap filling, revenue extraction
//! and grouped summation.

pub mod aggregator;
pub mod classifier;
pub mod gap_fill;
pub mod revenue;

pub use aggregator::Aggregator;
pub use classifier::{classify_domain, extract_keyword};
pub use revenue::RevenueExtractor;
