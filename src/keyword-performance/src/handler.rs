//! One invocation of the job: locate the uploaded hit export, aggregate
//! revenue per search keyword and upload the result next to it.

use chrono::NaiveDate;
use keyword_analytics::Aggregator;
use keyword_core::config::AppConfig;
use keyword_core::error::{KeywordError, KeywordResult};
use keyword_storage::tsv::read_click_table;
use keyword_storage::{ObjectLocation, ObjectStore, ObjectStoreSink, ResultSink, SinkOutcome, TriggerEvent};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Status reported for an invocation that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStatus {
    Success,
    Failure,
}

impl InvocationStatus {
    pub fn code(&self) -> i32 {
        match self {
            InvocationStatus::Success => 0,
            InvocationStatus::Failure => -1,
        }
    }
}

pub struct KeywordPerformanceJob {
    store: Arc<dyn ObjectStore>,
    sink: Arc<dyn ResultSink>,
    aggregator: Aggregator,
    skip_empty_result: bool,
}

impl KeywordPerformanceJob {
    /// Read from and write results to the same store.
    pub fn new(config: &AppConfig, store: Arc<dyn ObjectStore>) -> Self {
        let sink = Arc::new(ObjectStoreSink::new(store.clone(), config.storage.clone()));
        Self::with_sink(config, store, sink)
    }

    pub fn with_sink(config: &AppConfig, store: Arc<dyn ObjectStore>, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            store,
            sink,
            aggregator: Aggregator::new(&config.pipeline),
            skip_empty_result: config.pipeline.skip_empty_result,
        }
    }

    pub async fn handle_event(&self, event: &TriggerEvent, date: NaiveDate) -> KeywordResult<InvocationStatus> {
        let location = event.location()?;
        self.run(&location, date).await
    }

    /// Errors are logged with the object location and handed back to the
    /// caller so the host marks the invocation failed.
    pub async fn run(&self, location: &ObjectLocation, date: NaiveDate) -> KeywordResult<InvocationStatus> {
        info!(bucket = %location.bucket, key = %location.key, "Processing object");

        match self.process_object(location, date).await {
            Ok(status) => Ok(status),
            Err(e) => {
                error!(
                    error = %e,
                    bucket = %location.bucket,
                    key = %location.key,
                    "Error getting object {} from bucket {}. Make sure they exist and are readable.",
                    location.key,
                    location.bucket
                );
                Err(e)
            }
        }
    }

    async fn process_object(&self, location: &ObjectLocation, date: NaiveDate) -> KeywordResult<InvocationStatus> {
        let body = self.store.get_object(&location.bucket, &location.key).await?;
        let table = read_click_table(&body)?;

        let rows = match self.aggregator.process(table.as_deref()) {
            Ok(rows) => rows,
            Err(KeywordError::InputMissing(reason)) => {
                warn!(reason = %reason, "Raw data is absent, nothing written");
                return Ok(InvocationStatus::Failure);
            }
            Err(e) => return Err(e),
        };

        let rows = if rows.is_empty() && self.skip_empty_result {
            None
        } else {
            Some(rows)
        };

        match self.sink.write(&location.bucket, rows.as_deref(), date).await? {
            SinkOutcome::Written { .. } => Ok(InvocationStatus::Success),
            SinkOutcome::Skipped => Ok(InvocationStatus::Failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use keyword_core::config::MalformedProductPolicy;
    use keyword_core::types::ResultRow;
    use keyword_storage::MemoryObjectStore;

    const BUCKET: &str = "hit-data";
    const INPUT_KEY: &str = "data.tsv";
    const RESULT_KEY: &str = "result/2026-10-19_SearchKeywordPerformance.tab";
    const HEADER: &str = "hit_time_gmt\tdate_time\tuser_agent\tip\tevent_list\tgeo_city\tgeo_region\tgeo_country\tpagename\tpage_url\tproduct_list\treferrer";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn location() -> ObjectLocation {
        ObjectLocation {
            bucket: BUCKET.into(),
            key: INPUT_KEY.into(),
        }
    }

    fn row(ua: &str, ip: &str, events: &str, city: &str, products: &str, referrer: &str) -> String {
        format!("1254033280\t2009-09-27 06:34:40\t{ua}\t{ip}\t{events}\t{city}\tOR\tUS\tPage\thttp://www.esshopzilla.com\t{products}\t{referrer}")
    }

    fn export(rows: &[String]) -> String {
        let mut body = String::from(HEADER);
        for r in rows {
            body.push('\r');
            body.push_str(r);
        }
        body.push('\r');
        body
    }

    fn job_with(config: &AppConfig, body: &str) -> (KeywordPerformanceJob, Arc<MemoryObjectStore>) {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert(BUCKET, INPUT_KEY, Bytes::from(body.to_string()));
        (KeywordPerformanceJob::new(config, store.clone()), store)
    }

    fn result_body(store: &MemoryObjectStore) -> String {
        let body = store.get(BUCKET, RESULT_KEY).expect("result written");
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_single_session() {
        let body = export(&[
            row("Mozilla/5.0", "10.0.0.1", "", "Salem", "", "https://www.google.com/search?q=shoes"),
            row("Mozilla/5.0", "10.0.0.1", "1", "Salem", "Shoes;Runner;1;20.0;", ""),
        ]);
        let (job, store) = job_with(&AppConfig::default(), &body);

        let status = job.run(&location(), date()).await.unwrap();
        assert_eq!(status, InvocationStatus::Success);
        assert_eq!(status.code(), 0);
        assert_eq!(
            result_body(&store),
            "Search Engine Domain\tSearch Keyword\tRevenue\ngoogle.com\tshoes\t20.0\n"
        );
    }

    #[tokio::test]
    async fn test_end_to_end_multiple_visitors() {
        let body = export(&[
            row("UA-1", "67.98.123.1", "", "Salem", "", "http://www.google.com/search?hl=en&q=Ipod&aq=f"),
            row("UA-2", "23.8.61.21", "2", "Rochester", "Electronics;Zune - 32GB;1;;", "http://www.bing.com/search?q=Zune&go=&form=QBLH"),
            row("UA-3", "112.33.98.231", "", "Salt Lake City", "", "http://search.yahoo.com/search?p=cd+player&toggle=1"),
            row("UA-2", "23.8.61.21", "1", "Rochester", "Electronics;Zune - 32GB;1;250;", "https://www.esshopzilla.com/checkout/?a=confirm"),
            row("UA-1", "67.98.123.1", "1", "Salem", "Electronics;Ipod - Touch;1;290;", "https://www.esshopzilla.com/checkout/?a=confirm"),
            row("UA-3", "112.33.98.231", "1", "Salt Lake City", "Electronics;Ipod - Nano;1;190;", "https://www.esshopzilla.com/checkout/?a=confirm"),
            row("UA-4", "44.12.96.2", "1", "Duncan", "Electronics;Ipod - Nano;1;;", "http://www.esshopzilla.com/product/?pid=as23233"),
        ]);
        let (job, store) = job_with(&AppConfig::default(), &body);

        assert_eq!(job.run(&location(), date()).await.unwrap(), InvocationStatus::Success);
        assert_eq!(
            result_body(&store),
            "Search Engine Domain\tSearch Keyword\tRevenue\n\
             \t\t0.0\n\
             yahoo.com\tcd player\t190.0\n\
             msn.com\tzune\t250.0\n\
             google.com\tipod\t290.0\n"
        );
    }

    #[tokio::test]
    async fn test_handle_event_decodes_key() {
        let body = export(&[row("UA", "1.1.1.1", "", "Salem", "", "")]);
        let store = Arc::new(MemoryObjectStore::new());
        store.insert(BUCKET, "raw/hit data.tsv", Bytes::from(body));
        let job = KeywordPerformanceJob::new(&AppConfig::default(), store.clone());

        let event = TriggerEvent::from_json(
            br#"{"Records":[{"s3":{"bucket":{"name":"hit-data"},"object":{"key":"raw/hit+data.tsv"}}}]}"#,
        )
        .unwrap();
        let status = job.handle_event(&event, date()).await.unwrap();
        assert_eq!(status, InvocationStatus::Success);
        assert!(store.get(BUCKET, RESULT_KEY).is_some());
    }

    #[tokio::test]
    async fn test_empty_table_writes_header_only() {
        let (job, store) = job_with(&AppConfig::default(), &export(&[]));
        assert_eq!(job.run(&location(), date()).await.unwrap(), InvocationStatus::Success);
        assert_eq!(
            result_body(&store),
            "Search Engine Domain\tSearch Keyword\tRevenue\n"
        );
    }

    #[tokio::test]
    async fn test_empty_result_skipped_when_configured() {
        let mut config = AppConfig::default();
        config.pipeline.skip_empty_result = true;
        let (job, store) = job_with(&config, &export(&[]));

        let status = job.run(&location(), date()).await.unwrap();
        assert_eq!(status, InvocationStatus::Failure);
        assert_eq!(status.code(), -1);
        assert!(store.get(BUCKET, RESULT_KEY).is_none());
    }

    #[tokio::test]
    async fn test_absent_table_fails_without_write() {
        let (job, store) = job_with(&AppConfig::default(), "");
        let status = job.run(&location(), date()).await.unwrap();
        assert_eq!(status, InvocationStatus::Failure);
        assert_eq!(store.keys(BUCKET), vec![INPUT_KEY.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_object_is_reraised() {
        let store = Arc::new(MemoryObjectStore::new());
        let job = KeywordPerformanceJob::new(&AppConfig::default(), store.clone());
        let err = job.run(&location(), date()).await.unwrap_err();
        assert!(matches!(err, KeywordError::Retrieval { .. }));
        assert!(store.keys(BUCKET).is_empty());
    }

    #[tokio::test]
    async fn test_parse_error_is_reraised() {
        let (job, _store) = job_with(&AppConfig::default(), "referrer\tip\n\tx\n");
        let err = job.run(&location(), date()).await.unwrap_err();
        assert!(matches!(err, KeywordError::Parse(_)));
    }

    #[tokio::test]
    async fn test_rejected_product_writes_nothing() {
        let mut config = AppConfig::default();
        config.pipeline.malformed_products = MalformedProductPolicy::Reject;
        let body = export(&[row("UA", "1.1.1.1", "1", "Salem", "Electronics;Ipod", "")]);
        let (job, store) = job_with(&config, &body);

        let err = job.run(&location(), date()).await.unwrap_err();
        assert!(matches!(err, KeywordError::MalformedProduct { .. }));
        assert!(store.get(BUCKET, RESULT_KEY).is_none());
    }

    struct RecordingSink {
        rows: std::sync::Mutex<Vec<Vec<ResultRow>>>,
    }

    #[async_trait]
    impl ResultSink for RecordingSink {
        async fn write(
            &self,
            bucket: &str,
            rows: Option<&[ResultRow]>,
            _date: NaiveDate,
        ) -> KeywordResult<SinkOutcome> {
            let rows = rows.ok_or_else(|| KeywordError::OutputMissing(bucket.to_string()))?;
            self.rows.lock().unwrap().push(rows.to_vec());
            Ok(SinkOutcome::Written {
                bucket: bucket.to_string(),
                key: "recorded".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_custom_sink_receives_rows() {
        let body = export(&[row("UA", "1.1.1.1", "1", "Salem", "E;Ipod;1;5.5;,E;Case;1;4.5;", "http://search.yahoo.com/search?p=Ipod")]);
        let store = Arc::new(MemoryObjectStore::new());
        store.insert(BUCKET, INPUT_KEY, Bytes::from(body));
        let sink = Arc::new(RecordingSink {
            rows: std::sync::Mutex::new(Vec::new()),
        });
        let job = KeywordPerformanceJob::with_sink(&AppConfig::default(), store, sink.clone());

        assert_eq!(job.run(&location(), date()).await.unwrap(), InvocationStatus::Success);
        let written = sink.rows.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].len(), 1);
        assert_eq!(written[0][0].search_keyword.as_deref(), Some("ipod"));
        assert!((written[0][0].revenue - 10.0).abs() < f64::EPSILON);
    }
}
