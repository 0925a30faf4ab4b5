use chrono::NaiveDate;
use serde_json::{json, Value};
use thiserror::Error;

use crate::dates::date_key;

/// Error type shared by the lifecycle store and the routing shim.
///
/// Every variant maps onto the status-code convention of the remote API so
/// callers can branch on status/detail regardless of which backend answered.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("period {0} not found")]
    NotFound(u64),
    #[error("date range overlaps period {id} ({start_date}..{end_date})")]
    Overlap {
        id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    #[error("period {id} ({start_date}..{end_date}) is already pinned")]
    AlreadyPinned {
        id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    #[error("daily expenses incomplete: {missing} day(s) without an entry")]
    IncompleteDailyData { missing: usize },
    #[error("period {0} is closed")]
    Closed(u64),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unsupported request: {method} {path}")]
    UnsupportedRequest { method: String, path: String },
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// HTTP-equivalent status code used by the response envelope.
    pub fn status(&self) -> u16 {
        match self {
            StoreError::NotFound(_) => 404,
            StoreError::Overlap { .. } | StoreError::AlreadyPinned { .. } => 409,
            StoreError::IncompleteDailyData { .. } => 422,
            StoreError::Closed(_) => 423,
            StoreError::InvalidInput(_) | StoreError::UnsupportedRequest { .. } => 400,
            StoreError::Storage(_) => 500,
        }
    }

    /// Structured conflict detail surfaced to the caller, when applicable.
    pub fn detail(&self) -> Option<Value> {
        match self {
            StoreError::Overlap {
                id,
                start_date,
                end_date,
            } => Some(json!({
                "overlap": {
                    "id": id,
                    "start_date": date_key(*start_date),
                    "end_date": date_key(*end_date),
                }
            })),
            StoreError::AlreadyPinned {
                id,
                start_date,
                end_date,
            } => Some(json!({
                "pinned": {
                    "id": id,
                    "start_date": date_key(*start_date),
                    "end_date": date_key(*end_date),
                }
            })),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}
