//! Storage glue for the keyword performance job: object retrieval, hit
//! table decoding, result encoding and upload, trigger event parsing.

pub mod object_store;
pub mod sink;
pub mod trigger;
pub mod tsv;

pub use object_store::{LocalObjectStore, MemoryObjectStore, ObjectStore};
pub use sink::{ObjectStoreSink, ResultSink, SinkOutcome};
pub use trigger::{ObjectLocation, TriggerEvent};
