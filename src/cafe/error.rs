use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record #{index} is not a valid {kind} object: {reason}")]
    Malformed {
        kind: &'static str,
        index: usize,
        reason: String,
    },
    #[error("{kind} record #{index} has no id")]
    MissingId { kind: &'static str, index: usize },
    #[error("café `{id}` has no name")]
    MissingName { id: String },
    #[error("event `{id}` has an unparseable time `{time}`")]
    InvalidTime { id: String, time: String },
    #[error("event `{id}` is not attached to any café")]
    MissingCafe { id: String },
}
