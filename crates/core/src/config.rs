use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `KEYWORD_PERFORMANCE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per bucket.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
    #[serde(default = "default_result_prefix")]
    pub result_prefix: String,
    #[serde(default = "default_result_suffix")]
    pub result_suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_purchase_event_code")]
    pub purchase_event_code: f64,
    #[serde(default)]
    pub malformed_products: MalformedProductPolicy,
    #[serde(default = "default_sort_by_revenue")]
    pub sort_by_revenue: bool,
    #[serde(default)]
    pub skip_empty_result: bool,
}

/// What to do with a product entry whose revenue field cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedProductPolicy {
    /// The entry contributes 0.0 and a warning is logged.
    #[default]
    Zero,
    /// The whole run fails.
    Reject,
}

// Default functions
fn default_root_dir() -> String {
    "./buckets".to_string()
}
fn default_result_prefix() -> String {
    "result/".to_string()
}
fn default_result_suffix() -> String {
    "_SearchKeywordPerformance.tab".to_string()
}
fn default_purchase_event_code() -> f64 {
    1.0
}
fn default_sort_by_revenue() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            result_prefix: default_result_prefix(),
            result_suffix: default_result_suffix(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            purchase_event_code: default_purchase_event_code(),
            malformed_products: MalformedProductPolicy::default(),
            sort_by_revenue: default_sort_by_revenue(),
            skip_empty_result: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Object key of the result file for the given date stamp.
    pub fn result_key(&self, date: chrono::NaiveDate) -> String {
        format!(
            "{}{}{}",
            self.result_prefix,
            date.format("%Y-%m-%d"),
            self.result_suffix
        )
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("KEYWORD_PERFORMANCE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
