//! Maps REST-shaped request tuples onto lifecycle store operations so the
//! offline store answers with the exact envelope of the remote API.
//!
//! Success payloads arrive as `{"data": ...}`; failures as
//! `{"status", "message", "data"}` with the shared status-code convention
//! (409 conflicts, 404 not-found, 422 incomplete daily data, 423 closed,
//! 400 for anything malformed or unrouted).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dates::parse_date_key;
use crate::errors::StoreError;
use crate::period::{ExpenseCategory, PeriodPatch};
use crate::store::PeriodStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// The generic request tuple shared with the real network client.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub query: HashMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: HashMap::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Error envelope mirrored from the remote API.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError {
            status: err.status(),
            message: err.to_string(),
            data: err.detail(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateBody {
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default)]
    force: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PinBody {
    #[serde(default)]
    pinned: bool,
    #[serde(default)]
    force: bool,
}

/// Routes one request onto the store, wrapping the payload as `{"data": ...}`.
pub fn dispatch(store: &mut PeriodStore, request: &ApiRequest) -> Result<Value, ApiError> {
    let segments: Vec<&str> = request
        .path
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    tracing::debug!(method = %request.method, path = %request.path, "dispatching request");

    match (request.method, segments.as_slice()) {
        (Method::Get, ["periods"]) => Ok(envelope(serialize(&store.list())?)),
        (Method::Post, ["periods"]) => {
            let body: CreateBody = decode_body(request)?;
            let start = require_date(body.start_date.as_deref(), "start_date")?;
            let end = require_date(body.end_date.as_deref(), "end_date")?;
            let period = store.create(start, end, body.force)?;
            Ok(envelope(serialize(&period)?))
        }
        (Method::Get, ["periods", id, "expense-suggestions"]) => {
            let id = parse_id(id)?;
            let category = request
                .query
                .get("type")
                .map(String::as_str)
                .unwrap_or_default()
                .parse::<ExpenseCategory>()
                .map_err(|err| invalid(err.to_string()))?;
            let suggestions = store.suggestions(id, category)?;
            Ok(envelope(serialize(&suggestions)?))
        }
        (Method::Post, ["periods", id, "close"]) => {
            let outcome = store.close(parse_id(id)?)?;
            Ok(envelope(serialize(&outcome)?))
        }
        (Method::Post, ["periods", id, "pin"]) => {
            let body: PinBody = decode_body(request)?;
            let outcome = store.set_pinned(parse_id(id)?, body.pinned, body.force)?;
            Ok(envelope(serialize(&outcome)?))
        }
        (Method::Get, ["periods", id]) => {
            let period = store.get(parse_id(id)?)?;
            Ok(envelope(serialize(&period)?))
        }
        (Method::Put, ["periods", id]) => {
            let patch: PeriodPatch = decode_body(request)?;
            let period = store.update(parse_id(id)?, patch)?;
            Ok(envelope(serialize(&period)?))
        }
        (Method::Delete, ["periods", id]) => {
            store.remove(parse_id(id)?)?;
            Ok(envelope(Value::Null))
        }
        _ => Err(StoreError::UnsupportedRequest {
            method: request.method.to_string(),
            path: request.path.clone(),
        }
        .into()),
    }
}

fn envelope(payload: Value) -> Value {
    json!({ "data": payload })
}

fn serialize<T: Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|err| ApiError::from(StoreError::from(err)))
}

fn decode_body<T: Default + for<'de> Deserialize<'de>>(
    request: &ApiRequest,
) -> Result<T, ApiError> {
    match &request.body {
        None => Ok(T::default()),
        Some(body) => serde_json::from_value(body.clone())
            .map_err(|err| invalid(format!("malformed request body: {err}"))),
    }
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| invalid(format!("invalid period id `{raw}`")))
}

fn require_date(raw: Option<&str>, field: &str) -> Result<chrono::NaiveDate, ApiError> {
    raw.and_then(parse_date_key)
        .ok_or_else(|| invalid(format!("missing or invalid `{field}`")))
}

fn invalid(message: String) -> ApiError {
    ApiError::from(StoreError::InvalidInput(message))
}
