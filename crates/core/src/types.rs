use serde::Serialize;
use std::fmt;

/// Output column names, in emission order.
pub const RESULT_COLUMNS: [&str; 3] = ["Search Engine Domain", "Search Keyword", "Revenue"];

/// One hit from the clickstream export. Immutable once decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickRecord {
    pub ip: String,
    pub user_agent: String,
    pub geo_city: String,
    pub geo_region: String,
    pub geo_country: String,
    /// Referring URL; `None` when the column was blank.
    pub referrer: Option<String>,
    /// Numeric event code; `None` when blank or not a single number.
    pub event_code: Option<f64>,
    pub product_list: String,
}

impl ClickRecord {
    pub fn visitor_key(&self) -> VisitorKey<'_> {
        VisitorKey {
            ip: &self.ip,
            user_agent: &self.user_agent,
            geo_city: &self.geo_city,
            geo_region: &self.geo_region,
            geo_country: &self.geo_country,
        }
    }
}

/// Composite key approximating a single visitor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisitorKey<'a> {
    pub ip: &'a str,
    pub user_agent: &'a str,
    pub geo_city: &'a str,
    pub geo_region: &'a str,
    pub geo_country: &'a str,
}

/// Search engines recognised from referrer hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SearchEngine {
    #[serde(rename = "google.com")]
    Google,
    #[serde(rename = "msn.com")]
    Msn,
    #[serde(rename = "yahoo.com")]
    Yahoo,
}

impl SearchEngine {
    pub fn domain(&self) -> &'static str {
        match self {
            SearchEngine::Google => "google.com",
            SearchEngine::Msn => "msn.com",
            SearchEngine::Yahoo => "yahoo.com",
        }
    }

    /// Name of the query parameter carrying the search phrase.
    pub fn keyword_param(&self) -> &'static str {
        match self {
            SearchEngine::Google | SearchEngine::Msn => "q",
            SearchEngine::Yahoo => "p",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.domain())
    }
}

/// A hit plus the attributes derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord<'a> {
    pub record: &'a ClickRecord,
    pub search_engine: Option<SearchEngine>,
    pub search_keyword: Option<String>,
    pub revenue: f64,
}

impl EnrichedRecord<'_> {
    pub fn aggregation_key(&self) -> AggregationKey {
        AggregationKey {
            search_engine: self.search_engine,
            search_keyword: self.search_keyword.clone(),
        }
    }
}

/// Grouping key of the result table. Absent/absent is a valid key.
/// Ordering puts absent values first, then domain, then keyword.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregationKey {
    pub search_engine: Option<SearchEngine>,
    pub search_keyword: Option<String>,
}

/// One line of the `SearchKeywordPerformance` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    #[serde(rename = "Search Engine Domain")]
    pub search_engine: Option<SearchEngine>,
    #[serde(rename = "Search Keyword")]
    pub search_keyword: Option<String>,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
}

impl ResultRow {
    pub fn new(key: AggregationKey, revenue: f64) -> Self {
        Self {
            search_engine: key.search_engine,
            search_keyword: key.search_keyword,
            revenue,
        }
    }
}
