//! Result persistence. The aggregated table is encoded as TSV and uploaded
//! under a date-stamped key in the bucket the input came from.

use crate::object_store::ObjectStore;
use crate::tsv::write_result_table;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use keyword_core::config::StorageConfig;
use keyword_core::error::KeywordResult;
use keyword_core::types::ResultRow;
use std::sync::Arc;
use tracing::{info, warn};

/// What happened to a result table handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Written { bucket: String, key: String },
    /// Nothing to write; the sink logged and skipped.
    Skipped,
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist `rows` for `bucket`, stamped with `date`. `None` skips the
    /// write without failing.
    async fn write(
        &self,
        bucket: &str,
        rows: Option<&[ResultRow]>,
        date: NaiveDate,
    ) -> KeywordResult<SinkOutcome>;
}

pub struct ObjectStoreSink {
    store: Arc<dyn ObjectStore>,
    config: StorageConfig,
}

impl ObjectStoreSink {
    pub fn new(store: Arc<dyn ObjectStore>, config: StorageConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl ResultSink for ObjectStoreSink {
    async fn write(
        &self,
        bucket: &str,
        rows: Option<&[ResultRow]>,
        date: NaiveDate,
    ) -> KeywordResult<SinkOutcome> {
        let Some(rows) = rows else {
            warn!(bucket = %bucket, "Unable to write results, aggregated data is blank");
            return Ok(SinkOutcome::Skipped);
        };

        let key = self.config.result_key(date);
        let body = write_result_table(rows)?;
        self.store.put_object(bucket, &key, Bytes::from(body)).await?;

        info!(bucket = %bucket, key = %key, rows = rows.len(), "Result file uploaded");
        Ok(SinkOutcome::Written {
            bucket: bucket.to_string(),
            key,
        })
    }
}
