//! Scenario-scoped key/value storage.
//!
//! A cache is created empty for every scenario, filled by producing steps and
//! cleared with [`Cache::reset`] before the next scenario starts. Lookups of
//! absent keys always fail with [`CoreError::NotFound`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::exchange::{PreparedRequest, RecordedResponse};
use crate::value::{to_template_string, JsonValue};

/// Cache key of the last recorded HTTP response
pub const LAST_HTTP_RESPONSE: &str = "LAST_HTTP_RESPONSE";
/// Cache key of the instant the last HTTP request was sent
pub const LAST_HTTP_REQUEST_TIMESTAMP: &str = "LAST_HTTP_REQUEST_TIMESTAMP";
/// Cache key of the instant the last HTTP response was received
pub const LAST_HTTP_RESPONSE_TIMESTAMP: &str = "LAST_HTTP_RESPONSE_TIMESTAMP";

/// Value stored in the cache
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// String, number, boolean, null or structured JSON
    Json(JsonValue),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Request(PreparedRequest),
    Response(RecordedResponse),
}

impl CacheValue {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Json(_) => "a JSON value",
            CacheValue::Bytes(_) => "bytes",
            CacheValue::Timestamp(_) => "a timestamp",
            CacheValue::Request(_) => "a prepared request",
            CacheValue::Response(_) => "an HTTP response",
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            CacheValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CacheValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Text substituted for this value by the template resolver
    pub fn to_template_string(&self) -> CoreResult<String> {
        let rendered = match self {
            CacheValue::Json(value) => to_template_string(value),
            CacheValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            CacheValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            CacheValue::Request(request) => {
                serde_json::to_string(request).map_err(|e| CoreError::Render(e.to_string()))?
            }
            CacheValue::Response(response) => {
                serde_json::to_string(response).map_err(|e| CoreError::Render(e.to_string()))?
            }
        };
        Ok(rendered)
    }
}

impl From<JsonValue> for CacheValue {
    fn from(value: JsonValue) -> Self {
        CacheValue::Json(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Json(Value::String(value.to_string()))
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Json(Value::String(value))
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        CacheValue::Json(Value::from(value))
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        CacheValue::Json(Value::from(value))
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Json(Value::Bool(value))
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(value: Vec<u8>) -> Self {
        CacheValue::Bytes(value)
    }
}

impl From<DateTime<Utc>> for CacheValue {
    fn from(value: DateTime<Utc>) -> Self {
        CacheValue::Timestamp(value)
    }
}

impl From<PreparedRequest> for CacheValue {
    fn from(value: PreparedRequest) -> Self {
        CacheValue::Request(value)
    }
}

impl From<RecordedResponse> for CacheValue {
    fn from(value: RecordedResponse) -> Self {
        CacheValue::Response(value)
    }
}

/// Storage for scenario data.
///
/// Implementations must be safe to call from several threads without
/// external locking.
pub trait Cache: Send + Sync + fmt::Debug {
    /// Insert or overwrite the value under `key`
    fn save(&self, key: &str, value: CacheValue);

    /// Value saved under `key`, or `NotFound`
    fn get_saved(&self, key: &str) -> CoreResult<CacheValue>;

    /// Remove every entry
    fn reset(&self);

    /// Snapshot of the saved keys, sorted
    fn keys(&self) -> Vec<String>;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_json(&self, key: &str) -> CoreResult<JsonValue> {
        match self.get_saved(key)? {
            CacheValue::Json(value) => Ok(value),
            _ => Err(unexpected(key, "a JSON value")),
        }
    }

    fn get_timestamp(&self, key: &str) -> CoreResult<DateTime<Utc>> {
        self.get_saved(key)?
            .as_timestamp()
            .ok_or_else(|| unexpected(key, "a timestamp"))
    }

    fn get_request(&self, key: &str) -> CoreResult<PreparedRequest> {
        match self.get_saved(key)? {
            CacheValue::Request(request) => Ok(request),
            _ => Err(unexpected(key, "a prepared request")),
        }
    }

    fn get_response(&self, key: &str) -> CoreResult<RecordedResponse> {
        match self.get_saved(key)? {
            CacheValue::Response(response) => Ok(response),
            _ => Err(unexpected(key, "an HTTP response")),
        }
    }
}

fn unexpected(key: &str, expected: &'static str) -> CoreError {
    CoreError::UnexpectedCacheType {
        key: key.to_string(),
        expected,
    }
}

/// Thread-safe in-memory cache guarded by a single read/write lock.
#[derive(Clone, Default)]
pub struct ConcurrentCache {
    entries: Arc<RwLock<HashMap<String, CacheValue>>>,
}

impl ConcurrentCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for ConcurrentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentCache")
            .field("entry_count", &self.entries.read().len())
            .finish()
    }
}

impl Cache for ConcurrentCache {
    fn save(&self, key: &str, value: CacheValue) {
        debug!(key, kind = value.kind(), "Saving value in scenario cache");
        self.entries.write().insert(key.to_string(), value);
    }

    fn get_saved(&self, key: &str) -> CoreResult<CacheValue> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(key.to_string()))
    }

    fn reset(&self) {
        self.entries.write().clear();
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::thread;

    #[test]
    fn test_save_then_get() {
        let cache = ConcurrentCache::new();
        cache.save("NAME", "abc".into());
        cache.save("AGE", 30i64.into());
        cache.save("USER", json!({"id": 1}).into());

        assert_eq!(cache.get_saved("NAME").unwrap(), CacheValue::from("abc"));
        assert_eq!(cache.get_json("AGE").unwrap(), json!(30));
        assert_eq!(cache.get_json("USER").unwrap(), json!({"id": 1}));
        assert_eq!(cache.keys(), vec!["AGE", "NAME", "USER"]);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = ConcurrentCache::new();
        cache.save("K", "first".into());
        cache.save("K", "second".into());

        assert_eq!(cache.get_saved("K").unwrap().as_str(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let cache = ConcurrentCache::new();
        assert_eq!(
            cache.get_saved("MISSING"),
            Err(CoreError::NotFound("MISSING".to_string()))
        );
    }

    #[test]
    fn test_reset_clears_every_entry() {
        let cache = ConcurrentCache::new();
        for key in ["A", "B", "C"] {
            cache.save(key, key.into());
        }

        cache.reset();

        assert!(cache.is_empty());
        for key in ["A", "B", "C"] {
            assert!(matches!(cache.get_saved(key), Err(CoreError::NotFound(_))));
        }
    }

    #[test]
    fn test_template_string_of_every_kind() {
        let request = PreparedRequest::new("GET", "http://localhost/users");
        let response = RecordedResponse::new(204, vec![], Vec::new());

        assert_eq!(CacheValue::from(json!(2.0)).to_template_string().unwrap(), "2");
        assert_eq!(CacheValue::from(b"raw".to_vec()).to_template_string().unwrap(), "raw");
        assert_eq!(
            CacheValue::from(request).to_template_string().unwrap(),
            r#"{"method":"GET","url":"http://localhost/users","headers":[],"body":null}"#
        );
        assert_eq!(
            CacheValue::from(response).to_template_string().unwrap(),
            r#"{"status":204,"headers":[],"body":[]}"#
        );
    }

    #[test]
    fn test_typed_getters_reject_other_kinds() {
        let cache = ConcurrentCache::new();
        cache.save("TS", Utc::now().into());
        cache.save("TEXT", "abc".into());

        assert!(cache.get_timestamp("TS").is_ok());
        assert_eq!(
            cache.get_timestamp("TEXT"),
            Err(CoreError::UnexpectedCacheType {
                key: "TEXT".to_string(),
                expected: "a timestamp",
            })
        );
        assert!(matches!(
            cache.get_request("TS"),
            Err(CoreError::UnexpectedCacheType { .. })
        ));
        assert!(matches!(
            cache.get_response("NOPE"),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let cache = ConcurrentCache::new();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("KEY_{}_{}", t, i);
                        cache.save(&key, (i as i64).into());
                        assert_eq!(cache.get_json(&key).unwrap(), json!(i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 800);
    }
}
