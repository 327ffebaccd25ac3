use thiserror::Error;

pub type KeywordResult<T> = Result<T, KeywordError>;

#[derive(Error, Debug)]
pub enum KeywordError {
    #[error("Input data is missing: {0}")]
    InputMissing(String),

    #[error("Aggregated output is missing: {0}")]
    OutputMissing(String),

    #[error("Error retrieving object {key} from bucket {bucket}: {reason}")]
    Retrieval {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed product entry {entry:?}: {reason}")]
    MalformedProduct { entry: String, reason: String },

    #[error("Trigger event error: {0}")]
    Trigger(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
