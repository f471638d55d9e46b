//! Normalized API responses.
//!
//! Raw transport output (header blob, body text, status code) is parsed
//! into an [`ApiResponse`]: a key-ordered JSON payload with explicit
//! accessors, the final hop's headers, and the HTTP status.

use crate::error::{Result, VeltroError};
use crate::transport::RawResponse;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A parsed API response.
///
/// The decoded payload behaves as an ordered key/value structure via
/// [`get`](Self::get), [`set`](Self::set), [`has`](Self::has) and
/// [`remove`](Self::remove). Serializing the response reproduces the
/// payload keys plus a synthesized `httpCode` entry.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    body: serde_json::Map<String, Value>,
    headers: HashMap<String, String>,
    http_code: u16,
}

impl ApiResponse {
    /// Parses raw transport output.
    ///
    /// The header blob may contain one block per redirect hop, separated
    /// by blank lines; only the final hop's headers are retained. The body
    /// must be empty or a JSON object; anything else fails with
    /// [`VeltroError::MalformedResponse`] carrying the status and the raw
    /// body for diagnostics.
    pub fn parse(headers: &str, body: &str, http_code: u16) -> Result<Self> {
        Ok(Self {
            body: parse_body(body, http_code)?,
            headers: parse_headers(headers),
            http_code,
        })
    }

    pub(crate) fn from_raw(raw: &RawResponse) -> Result<Self> {
        Self::parse(&raw.headers, &raw.body, raw.status)
    }

    /// True iff the status code's leading decimal digit is `2`.
    pub fn is_successful(&self) -> bool {
        self.http_code.to_string().starts_with('2')
    }

    /// Returns a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Sets a payload field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.body.insert(key.into(), value);
    }

    /// True if the payload contains `key`.
    pub fn has(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    /// Removes and returns a payload field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.body.shift_remove(key)
    }

    /// HTTP status code.
    pub fn http_code(&self) -> u16 {
        self.http_code
    }

    /// Headers of the final response, after any redirects.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The payload merged with an `httpCode` entry.
    pub fn to_map(&self) -> serde_json::Map<String, Value> {
        let mut map = self.body.clone();
        map.insert("httpCode".to_string(), Value::from(self.http_code));
        map
    }

    /// Consumes the response into the merged payload map.
    pub fn into_map(mut self) -> serde_json::Map<String, Value> {
        self.body
            .insert("httpCode".to_string(), Value::from(self.http_code));
        self.body
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.to_map()).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Splits the blob into per-hop blocks on blank lines and keeps the last
/// hop. Within a block the first line is the status line; every other
/// line splits on the first `": "`. Header names are lowercased.
fn parse_headers(blob: &str) -> HashMap<String, String> {
    let last_hop = blob
        .split("\r\n\r\n")
        .filter(|hop| !hop.trim().is_empty())
        .last()
        .unwrap_or("");

    last_hop
        .split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(": "))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
        .collect()
}

fn parse_body(body: &str, http_code: u16) -> Result<serde_json::Map<String, Value>> {
    if body.trim().is_empty() {
        return Ok(serde_json::Map::new());
    }

    let malformed = |message: String| VeltroError::MalformedResponse {
        message,
        http_code,
        body: body.to_string(),
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(serde_json::Map::new()),
        Ok(other) => Err(malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(malformed(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
