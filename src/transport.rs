//! HTTP transport layer.
//!
//! Issues single request/response round trips with the configured base URI,
//! default headers and timeouts. Resource clients never touch this module
//! directly; they go through [`MerchantClient::call`](crate::client::MerchantClient::call).

use crate::error::{Result, VeltroError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use url::form_urlencoded;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Form/query parameter map. Key order is preserved, so encodings are stable.
pub type Params = serde_json::Map<String, Value>;

/// HTTP verbs implemented by the transport.
///
/// The set is a fixed allow-list; anything else fails to parse with
/// [`VeltroError::UnsupportedMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    /// Returns the verb as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }

    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = VeltroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            other => Err(VeltroError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Per-request options merged over the transport defaults; caller values
/// win on conflict.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers, appended after the defaults. A repeated name
    /// overrides the default value.
    pub headers: Vec<(String, String)>,
    /// Form-encoded body, sent for POST/PUT/DELETE.
    pub form: Option<Params>,
    /// Overall timeout override for this request only.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options carrying only a form body.
    pub fn form(params: Params) -> Self {
        Self {
            form: Some(params),
            ..Default::default()
        }
    }
}

/// Transport construction parameters.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URI prepended to relative request URLs.
    pub base_uri: String,
    /// Headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Connection timeout (default 20 seconds).
    pub connect_timeout: Option<Duration>,
    /// Overall timeout (default 60 seconds).
    pub timeout: Option<Duration>,
    /// Whether redirects are followed (default true).
    pub follow_redirects: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            headers: Vec::new(),
            connect_timeout: None,
            timeout: None,
            follow_redirects: true,
        }
    }
}

/// Raw output of a round trip: the final hop's header block as a
/// `\r\n`-joined blob, the body text and the status code.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub headers: String,
    pub body: String,
    pub status: u16,
}

/// Blocking-free HTTP transport over a pooled reqwest client.
pub struct Transport {
    http: reqwest::Client,
    base_uri: String,
    default_headers: Vec<(String, String)>,
    log_file: Option<PathBuf>,
}

impl Transport {
    /// Builds the transport. Fails only if the underlying client cannot
    /// be constructed (e.g. TLS backend initialization).
    pub fn new(config: TransportConfig) -> Result<Self> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };

        let http = reqwest::Client::builder()
            .connect_timeout(
                config
                    .connect_timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            )
            .timeout(
                config
                    .timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            )
            .redirect(redirect)
            .build()?;

        Ok(Self {
            http,
            base_uri: config.base_uri,
            default_headers: config.headers,
            log_file: None,
        })
    }

    /// Subsequent relative URLs resolve against this base.
    pub fn set_base_uri(&mut self, base_uri: impl Into<String>) {
        self.base_uri = base_uri.into();
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Enables or disables the request/response trace file.
    ///
    /// Trace lines are appended per call; the file is opened and closed
    /// within each request. Headers and bodies appear verbatim, so the
    /// file may contain credentials and other sensitive data.
    pub fn set_log_file(&mut self, log_file: Option<PathBuf>) {
        self.log_file = log_file;
    }

    /// Sends one request and returns the raw response.
    ///
    /// `url` may be absolute or relative to the configured base URI.
    /// HEAD and GET never carry a body; POST/PUT/DELETE send the form
    /// body when one is present in `options`.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<RawResponse> {
        let url = compose_url(&self.base_uri, url);
        debug!(method = %method, url = %url, "dispatching API request");

        let headers = merge_headers(&self.default_headers, &options.headers)?;
        self.log_request(method, &url, &headers);

        let mut builder = self.http.request(method.as_reqwest(), &url).headers(headers);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        if !matches!(method, Method::Get | Method::Head) {
            if let Some(params) = &options.form {
                builder = builder
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(form_encode(params));
            }
        }

        let response = builder.send().await?;

        let status = response.status();
        let header_blob = format_header_blob(&response);
        let body = response.text().await?;

        self.log_response(status.as_u16(), &body);
        debug!(status = status.as_u16(), "API request completed");

        Ok(RawResponse {
            headers: header_blob,
            body,
            status: status.as_u16(),
        })
    }

    fn log_request(&self, method: Method, url: &str, headers: &HeaderMap) {
        self.append_log(|f| {
            writeln!(f, "> {} {}", method, url)?;
            for (name, value) in headers {
                writeln!(f, "> {}: {}", name, value.to_str().unwrap_or("<binary>"))?;
            }
            Ok(())
        });
    }

    fn log_response(&self, status: u16, body: &str) {
        self.append_log(|f| {
            writeln!(f, "< HTTP {}", status)?;
            writeln!(f, "< {}", body)
        });
    }

    fn append_log(&self, write: impl FnOnce(&mut std::fs::File) -> std::io::Result<()>) {
        let Some(path) = &self.log_file else {
            return;
        };
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(mut f) => {
                if let Err(e) = write(&mut f) {
                    tracing::warn!(error = %e, "failed to write transport trace");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to open transport trace file"),
        }
    }
}

/// Prefixes `url` with the base URI unless it is already absolute.
fn compose_url(base_uri: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || base_uri.is_empty() {
        url.to_string()
    } else {
        format!("{}{}", base_uri, url)
    }
}

fn merge_headers(defaults: &[(String, String)], extra: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in defaults.iter().chain(extra.iter()) {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| VeltroError::InvalidConfig(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| VeltroError::InvalidConfig(format!("invalid header value: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Rebuilds the final hop's header block as a `\r\n`-joined blob, the way
/// raw HTTP header output looks after redirects are resolved.
fn format_header_blob(response: &reqwest::Response) -> String {
    let mut blob = format!(
        "{:?} {} {}\r\n",
        response.version(),
        response.status().as_u16(),
        response.status().canonical_reason().unwrap_or("")
    );
    for (name, value) in response.headers() {
        blob.push_str(name.as_str());
        blob.push_str(": ");
        blob.push_str(value.to_str().unwrap_or(""));
        blob.push_str("\r\n");
    }
    blob.push_str("\r\n");
    blob
}

/// Encodes a parameter map as `application/x-www-form-urlencoded`, with
/// bracketed keys for nested arrays and objects (`card[number]=...`,
/// `items[0]=...`). Key order follows map insertion order.
pub(crate) fn form_encode(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        append_pairs(&mut serializer, key.clone(), value);
    }
    serializer.finish()
}

fn append_pairs(serializer: &mut form_urlencoded::Serializer<'_, String>, key: String, value: &Value) {
    match value {
        Value::Null => {
            serializer.append_pair(&key, "");
        }
        Value::Bool(b) => {
            serializer.append_pair(&key, if *b { "1" } else { "0" });
        }
        Value::Number(n) => {
            serializer.append_pair(&key, &n.to_string());
        }
        Value::String(s) => {
            serializer.append_pair(&key, s);
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                append_pairs(serializer, format!("{key}[{index}]"), item);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                append_pairs(serializer, format!("{key}[{name}]"), item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("Put".parse::<Method>().unwrap(), Method::Put);
        assert_eq!("delete".parse::<Method>().unwrap(), Method::Delete);
        assert_eq!("HEAD".parse::<Method>().unwrap(), Method::Head);
    }

    #[test]
    fn test_method_outside_allow_list() {
        let err = "PATCH".parse::<Method>().unwrap_err();
        assert!(matches!(err, VeltroError::UnsupportedMethod(m) if m == "PATCH"));
    }

    #[test]
    fn test_compose_url() {
        assert_eq!(
            compose_url("https://api.example.com/v1/", "transactions"),
            "https://api.example.com/v1/transactions"
        );
        assert_eq!(
            compose_url("https://api.example.com/v1/", "https://other.example.com/x"),
            "https://other.example.com/x"
        );
        assert_eq!(compose_url("", "https://api.example.com/"), "https://api.example.com/");
    }

    #[test]
    fn test_form_encode_flat() {
        let encoded = form_encode(&params(json!({
            "amount": "12.50",
            "currency": "PLN",
            "order_id": 1044,
            "notify": true,
        })));
        assert_eq!(encoded, "amount=12.50&currency=PLN&order_id=1044&notify=1");
    }

    #[test]
    fn test_form_encode_nested() {
        let encoded = form_encode(&params(json!({
            "buyer": {"email": "jan@example.com", "name": "Jan"},
            "items": ["a", "b"],
        })));
        assert_eq!(
            encoded,
            "buyer%5Bemail%5D=jan%40example.com&buyer%5Bname%5D=Jan&items%5B0%5D=a&items%5B1%5D=b"
        );
    }

    #[test]
    fn test_form_encode_preserves_insertion_order() {
        let mut p = Params::new();
        p.insert("z".into(), json!("1"));
        p.insert("a".into(), json!("2"));
        p.insert("m".into(), json!("3"));
        assert_eq!(form_encode(&p), "z=1&a=2&m=3");
    }

    #[test]
    fn test_merge_headers_caller_wins() {
        let defaults = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("X-API-Language".to_string(), "en".to_string()),
        ];
        let extra = vec![("X-API-Language".to_string(), "pl".to_string())];
        let merged = merge_headers(&defaults, &extra).unwrap();
        assert_eq!(merged.get("X-API-Language").unwrap(), "pl");
        assert_eq!(merged.get("Accept").unwrap(), "application/json");
    }

    #[test]
    fn test_default_transport_config() {
        let config = TransportConfig::default();
        assert!(config.follow_redirects);
        assert!(config.connect_timeout.is_none());
        assert!(config.timeout.is_none());
    }
}
