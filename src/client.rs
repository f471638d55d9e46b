//! Veltro Merchant API client.
//!
//! The main entry point for interacting with the Veltro Merchant API.
//! A [`MerchantClient`] owns the merchant credentials, the environment
//! endpoint and the session token; per-resource clients are borrowed from
//! it and funnel every request through [`MerchantClient::call`].

use crate::accounts::{AccountsClient, BankAccountsClient};
use crate::addresses::{AddressTemplatesClient, AddressesClient};
use crate::channels::ChannelsClient;
use crate::contacts::{ContactTemplatesClient, ContactsClient};
use crate::error::{Result, VeltroError};
use crate::offers::OffersClient;
use crate::payouts::PayoutsClient;
use crate::pos::PosClient;
use crate::response::ApiResponse;
use crate::transactions::TransactionsClient;
use crate::transport::{Method, Params, RequestOptions, Transport, TransportConfig};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{LazyLock, PoisonError, RwLock};
use std::time::Duration;

/// Production API endpoint.
pub const API_ENDPOINT: &str = "https://api.veltro.com/";
/// Sandbox API endpoint, selected for `test_`-prefixed tokens.
pub const SANDBOX_API_ENDPOINT: &str = "https://api.sandbox.veltro.com/";

/// Merchant application token header.
pub const APP_TOKEN_HEADER: &str = "X-API-Token";
/// Session token header; also returned by the server on silent rotation.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Message language header.
pub const LANG_HEADER: &str = "X-API-Language";
/// Merchant timezone header.
pub const TIMEZONE_HEADER: &str = "X-API-Timezone";
/// Best-effort originating client address header.
pub const CLIENT_IP_HEADER: &str = "X-Client-IP";

const USER_AGENT_PREFIX: &str = "VeltroMerchantApi/v";
const SUPPORTED_LANGS: [&str; 2] = ["pl", "en"];
const DEFAULT_API_VERSION: u32 = 1;

/// Application token: optional `test_`/`prod_` prefix followed by a
/// lowercase UUID v4.
static APP_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(test_|prod_)?[a-f0-9]{8}-[a-f0-9]{4}-4[a-f0-9]{3}-[89ab][a-f0-9]{3}-[a-f0-9]{12}$",
    )
    .expect("app token pattern is valid")
});

type TokenListener = Box<dyn Fn(&str) + Send + Sync>;

/// Configuration options for the client.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Base URL override, taken verbatim. When unset the environment is
    /// derived from the application token.
    pub base_url: Option<String>,
    /// Connection timeout (default 20 seconds).
    pub connect_timeout: Option<Duration>,
    /// Overall request timeout (default 60 seconds).
    pub timeout: Option<Duration>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// Originating client address, forwarded as `X-Client-IP`.
    /// See [`client_ip`] for deriving it from inbound request data.
    pub client_ip: Option<String>,
}

/// Derives the best-effort client address from inbound request data.
///
/// Picks the first entry of a case-insensitive `X-Forwarded-For` header,
/// falling back to the remote peer address. The caller supplies both from
/// its host environment; the SDK never reads ambient process state.
pub fn client_ip(headers: &HashMap<String, String>, remote_addr: Option<IpAddr>) -> Option<String> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("x-forwarded-for"))
        .and_then(|(_, value)| value.split(',').next())
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
        .or_else(|| remote_addr.map(|addr| addr.to_string()))
}

/// Veltro Merchant API client.
///
/// # Example
///
/// ```rust,no_run
/// use veltro::MerchantClient;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = MerchantClient::new(
///         "prod_9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0f",
///         "en",
///         "Europe/Warsaw",
///     )?;
///     client.auth("merchant_login", "merchant_password").await?;
///
///     let transaction = client
///         .transactions()
///         .create(json!({
///             "amount": "12.50",
///             "currency": "pln",
///             "order_id": "1044",
///         }).as_object().cloned().unwrap())
///         .await?;
///
///     println!("created {}", transaction["identifier"]);
///     Ok(())
/// }
/// ```
pub struct MerchantClient {
    app_token: String,
    language: String,
    timezone: String,
    endpoint: String,
    api_version: u32,
    transport: Option<Transport>,
    auth_token: RwLock<Option<String>>,
    token_listener: RwLock<Option<TokenListener>>,
}

impl std::fmt::Debug for MerchantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerchantClient")
            .field("app_token", &self.app_token)
            .field("language", &self.language)
            .field("timezone", &self.timezone)
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("transport", &self.transport.is_some())
            .field("auth_token", &self.auth_token)
            .field(
                "token_listener",
                &self.token_listener.read().map(|l| l.is_some()).unwrap_or(false),
            )
            .finish()
    }
}

impl MerchantClient {
    /// Creates a client with default configuration.
    ///
    /// The application token is validated locally and decides the
    /// environment: tokens containing `test` target the sandbox. The
    /// language must be a two-letter code (unsupported values degrade to
    /// `en`); the timezone must be a valid IANA zone name.
    pub fn new(app_token: &str, language: &str, timezone: &str) -> Result<Self> {
        Self::with_config(app_token, language, timezone, ClientConfig::default())
    }

    /// Creates a client with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use veltro::{ClientConfig, MerchantClient};
    /// use std::time::Duration;
    ///
    /// let client = MerchantClient::with_config(
    ///     "prod_9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0f",
    ///     "pl",
    ///     "Europe/Warsaw",
    ///     ClientConfig {
    ///         timeout: Some(Duration::from_secs(30)),
    ///         ..Default::default()
    ///     },
    /// ).unwrap();
    /// ```
    pub fn with_config(
        app_token: &str,
        language: &str,
        timezone: &str,
        config: ClientConfig,
    ) -> Result<Self> {
        if !APP_TOKEN_RE.is_match(app_token) {
            return Err(VeltroError::InvalidCredential(
                "application token format is invalid".to_string(),
            ));
        }

        let language = normalize_language(language)?;
        let timezone = validate_timezone(timezone)?;

        // Unlike set_base_api_endpoint, the construction-time override is
        // taken verbatim so local mock servers can be targeted in tests.
        let endpoint = match config.base_url {
            Some(url) if url.ends_with('/') => url,
            Some(url) => format!("{url}/"),
            None if app_token.to_ascii_lowercase().contains("test") => {
                SANDBOX_API_ENDPOINT.to_string()
            }
            None => API_ENDPOINT.to_string(),
        };

        let user_agent = config
            .user_agent
            .unwrap_or_else(|| format!("{}{}", USER_AGENT_PREFIX, env!("CARGO_PKG_VERSION")));

        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), user_agent),
            (APP_TOKEN_HEADER.to_string(), app_token.to_string()),
            (LANG_HEADER.to_string(), language.clone()),
            (TIMEZONE_HEADER.to_string(), timezone.clone()),
        ];
        if let Some(ip) = config.client_ip {
            headers.push((CLIENT_IP_HEADER.to_string(), ip));
        }

        let transport = Transport::new(TransportConfig {
            base_uri: String::new(),
            headers,
            connect_timeout: config.connect_timeout,
            timeout: config.timeout,
            follow_redirects: true,
        })?;

        let mut client = Self {
            app_token: app_token.to_string(),
            language,
            timezone,
            endpoint,
            api_version: DEFAULT_API_VERSION,
            transport: Some(transport),
            auth_token: RwLock::new(None),
            token_listener: RwLock::new(None),
        };
        client.refresh_base_uri();
        Ok(client)
    }

    /// Full URL of the versioned API root, e.g. `https://api.veltro.com/v1/`.
    pub fn base_api_endpoint(&self) -> String {
        format!("{}v{}/", self.endpoint, self.api_version)
    }

    /// Message language in effect (after coercion).
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Validated IANA timezone name.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Overrides the environment URL.
    ///
    /// The URL must be lowercase and use `https://`; a trailing slash is
    /// added when missing.
    pub fn set_base_api_endpoint(&mut self, url: &str) -> Result<()> {
        self.endpoint = validate_endpoint(url)?;
        self.refresh_base_uri();
        Ok(())
    }

    /// Switches to the sandbox environment.
    pub fn set_sandbox_mode(&mut self) {
        self.endpoint = SANDBOX_API_ENDPOINT.to_string();
        self.refresh_base_uri();
    }

    /// Sets the target API version.
    ///
    /// The version is the first run of digits in the rendered input:
    /// `"version2"`, `4` and `-6` select versions 2, 4 and 6. Input
    /// without digits leaves the version unchanged.
    pub fn set_api_version(&mut self, version: impl ToString) {
        let rendered = version.to_string();
        if let Some(digits) = first_digit_run(rendered.trim()) {
            if let Ok(parsed) = digits.parse::<u32>() {
                self.api_version = parsed;
                self.refresh_base_uri();
            }
        }
    }

    fn refresh_base_uri(&mut self) {
        let base = self.base_api_endpoint();
        if let Some(transport) = &mut self.transport {
            transport.set_base_uri(base);
        }
    }

    /// Enables appending request/response traces to `log_file`.
    ///
    /// USE WITH CAUTION: traces include headers and bodies verbatim, so
    /// credentials and customer data will appear in the file. Protect it
    /// or delete it once the debugging session is over.
    pub fn enable_logging(&mut self, log_file: impl Into<PathBuf>) {
        if let Some(transport) = &mut self.transport {
            transport.set_log_file(Some(log_file.into()));
        }
    }

    /// Disables trace logging.
    pub fn disable_logging(&mut self) {
        if let Some(transport) = &mut self.transport {
            transport.set_log_file(None);
        }
    }

    /// Logs in with merchant credentials and stores the session token.
    ///
    /// On success the token is adopted (with the same side effects as
    /// [`set_auth_token`](Self::set_auth_token)) and returned. A response
    /// without a usable token fails with [`VeltroError::Auth`] carrying
    /// the server-provided message.
    pub async fn auth(&self, login: &str, password: &str) -> Result<String> {
        let mut form = Params::new();
        form.insert("login".to_string(), Value::from(login));
        form.insert("password".to_string(), Value::from(password));

        let response = self
            .dispatch(Method::Post, "auth/login", RequestOptions::form(form))
            .await?;

        match response.get("token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {
                let token = token.to_string();
                self.set_auth_token(&token)?;
                Ok(token)
            }
            _ => Err(VeltroError::Auth {
                message: auth_error_message(&response),
                http_code: response.http_code(),
                body: response.to_string(),
            }),
        }
    }

    /// Injects a session token directly, bypassing login.
    ///
    /// Invokes the renewal listener, if registered, so the caller can
    /// persist the newly active token.
    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(VeltroError::InvalidConfig(
                "auth token must not be empty".to_string(),
            ));
        }

        *self
            .auth_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());

        if let Some(listener) = self
            .token_listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            listener(token);
        }
        Ok(())
    }

    /// Currently active session token, if any.
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registers a listener invoked on every session-token change, both
    /// manual injection and server-driven rotation.
    ///
    /// The listener runs synchronously on the calling task and must not
    /// block significantly.
    pub fn on_token_renewal<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self
            .token_listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(listener));
    }

    /// Issues a request to the API (low-level).
    ///
    /// The single dispatch path used by every resource client: attaches
    /// the session token, sends the request, adopts a rotated token from
    /// the response headers, and fails with [`VeltroError::Api`] on a
    /// non-2xx status.
    pub async fn call(
        &self,
        method: Method,
        route: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let response = self.dispatch(method, route, options).await?;

        if !response.is_successful() {
            return Err(VeltroError::Api {
                http_code: response.http_code(),
                body: response.to_string(),
            });
        }
        Ok(response)
    }

    /// Sends a request and normalizes the response without the 2xx gate.
    async fn dispatch(
        &self,
        method: Method,
        route: &str,
        mut options: RequestOptions,
    ) -> Result<ApiResponse> {
        let transport = self.transport.as_ref().ok_or(VeltroError::NotInitialized)?;

        if let Some(token) = self.auth_token() {
            options.headers.push((AUTH_TOKEN_HEADER.to_string(), token));
        }

        let raw = transport
            .send(method, route.trim_start_matches('/'), &options)
            .await?;
        let response = ApiResponse::from_raw(&raw)?;

        // The server may rotate the session token close to expiry; adopt
        // it transparently so the next request already carries it.
        if let Some(rotated) = response.header(AUTH_TOKEN_HEADER) {
            if !rotated.is_empty() && self.auth_token().as_deref() != Some(rotated) {
                self.set_auth_token(rotated)?;
            }
        }

        Ok(response)
    }

    /// Handles an inbound transaction notification.
    ///
    /// The identifier comes from the explicit argument or from the
    /// notification payload's `identifier` field. Returns the transaction
    /// only when its status is accepted; lookups that fail for any reason
    /// yield `None` — this helper never raises and must not be used where
    /// errors need to be observed.
    pub async fn handle_callback(
        &self,
        identifier: Option<&str>,
        payload: Option<&Params>,
    ) -> Option<Params> {
        self.transactions().handle_callback(identifier, payload).await
    }

    /// Transactions.
    pub fn transactions(&self) -> TransactionsClient<'_> {
        TransactionsClient::new(self)
    }

    /// Merchant accounts.
    pub fn accounts(&self) -> AccountsClient<'_> {
        AccountsClient::new(self)
    }

    /// Bank accounts.
    pub fn bank_accounts(&self) -> BankAccountsClient<'_> {
        BankAccountsClient::new(self)
    }

    /// Contacts.
    pub fn contacts(&self) -> ContactsClient<'_> {
        ContactsClient::new(self)
    }

    /// Contact templates.
    pub fn contact_templates(&self) -> ContactTemplatesClient<'_> {
        ContactTemplatesClient::new(self)
    }

    /// Addresses.
    pub fn addresses(&self) -> AddressesClient<'_> {
        AddressesClient::new(self)
    }

    /// Address templates.
    pub fn address_templates(&self) -> AddressTemplatesClient<'_> {
        AddressTemplatesClient::new(self)
    }

    /// Points of sale.
    pub fn pos(&self) -> PosClient<'_> {
        PosClient::new(self)
    }

    /// Payouts.
    pub fn payouts(&self) -> PayoutsClient<'_> {
        PayoutsClient::new(self)
    }

    /// Payment channels.
    pub fn channels(&self) -> ChannelsClient<'_> {
        ChannelsClient::new(self)
    }

    /// Offers.
    pub fn offers(&self) -> OffersClient<'_> {
        OffersClient::new(self)
    }
}

/// Two-letter check is strict; unsupported-but-well-formed codes degrade
/// to `en` rather than failing.
fn normalize_language(language: &str) -> Result<String> {
    if language.chars().count() != 2 {
        return Err(VeltroError::InvalidConfig(
            "language must be a two-letter code".to_string(),
        ));
    }
    let language = language.to_ascii_lowercase();
    Ok(if SUPPORTED_LANGS.contains(&language.as_str()) {
        language
    } else {
        "en".to_string()
    })
}

fn validate_timezone(timezone: &str) -> Result<String> {
    timezone
        .parse::<chrono_tz::Tz>()
        .map(|tz| tz.name().to_string())
        .map_err(|_| VeltroError::InvalidConfig(format!("unknown timezone {timezone:?}")))
}

fn validate_endpoint(url: &str) -> Result<String> {
    if url != url.to_lowercase() || !url.starts_with("https://") {
        return Err(VeltroError::InvalidConfig(format!(
            "endpoint must be a lowercase https:// URL, got {url:?}"
        )));
    }
    Ok(if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    })
}

fn first_digit_run(input: &str) -> Option<&str> {
    let start = input.find(|c: char| c.is_ascii_digit())?;
    let rest = &input[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn auth_error_message(response: &ApiResponse) -> String {
    if response.has("code") {
        if let Some(message) = response.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    if let Some(message) = response
        .get("errors")
        .and_then(|errors| errors.get(0))
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
    {
        return message.to_string();
    }
    format!("auth response is invalid: {response}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0f";

    #[test]
    fn test_valid_tokens_construct() {
        for token in [
            TOKEN.to_string(),
            format!("test_{TOKEN}"),
            format!("prod_{TOKEN}"),
        ] {
            assert!(
                MerchantClient::new(&token, "en", "UTC").is_ok(),
                "token {token} should be accepted"
            );
        }
    }

    #[test]
    fn test_invalid_tokens_rejected() {
        for token in [
            "",
            "not-a-token",
            "sandbox_9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0f",
            // version nibble is not 4
            "9f8b7c6d-1a2b-5c3d-8e4f-5a6b7c8d9e0f",
            // variant nibble outside [89ab]
            "9f8b7c6d-1a2b-4c3d-7e4f-5a6b7c8d9e0f",
            // uppercase hex
            "9F8B7C6D-1A2B-4C3D-8E4F-5A6B7C8D9E0F",
            "test_9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0",
        ] {
            let err = MerchantClient::new(token, "en", "UTC").unwrap_err();
            assert!(
                matches!(err, VeltroError::InvalidCredential(_)),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_environment_selected_from_token() {
        let client = MerchantClient::new(&format!("test_{TOKEN}"), "en", "UTC").unwrap();
        assert!(client.base_api_endpoint().starts_with(SANDBOX_API_ENDPOINT));

        let client = MerchantClient::new(&format!("prod_{TOKEN}"), "en", "UTC").unwrap();
        assert!(client.base_api_endpoint().starts_with(API_ENDPOINT));

        let client = MerchantClient::new(TOKEN, "en", "UTC").unwrap();
        assert!(client.base_api_endpoint().starts_with(API_ENDPOINT));
    }

    #[test]
    fn test_language_coercion() {
        let client = MerchantClient::new(TOKEN, "PL", "UTC").unwrap();
        assert_eq!(client.language(), "pl");

        // well-formed but unsupported codes degrade to en
        let client = MerchantClient::new(TOKEN, "de", "UTC").unwrap();
        assert_eq!(client.language(), "en");

        let err = MerchantClient::new(TOKEN, "eng", "UTC").unwrap_err();
        assert!(matches!(err, VeltroError::InvalidConfig(_)));
    }

    #[test]
    fn test_timezone_validation() {
        let client = MerchantClient::new(TOKEN, "en", "Europe/Warsaw").unwrap();
        assert_eq!(client.timezone(), "Europe/Warsaw");

        let err = MerchantClient::new(TOKEN, "en", "Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, VeltroError::InvalidConfig(_)));
    }

    #[test]
    fn test_api_version_digit_extraction() {
        let mut client = MerchantClient::new(TOKEN, "en", "UTC").unwrap();
        assert_eq!(client.base_api_endpoint(), format!("{API_ENDPOINT}v1/"));

        client.set_api_version("version2");
        assert!(client.base_api_endpoint().ends_with("/v2/"));

        client.set_api_version(4);
        assert!(client.base_api_endpoint().ends_with("/v4/"));

        client.set_api_version(-6);
        assert!(client.base_api_endpoint().ends_with("/v6/"));

        client.set_api_version("no digits here");
        assert!(client.base_api_endpoint().ends_with("/v6/"));
    }

    #[test]
    fn test_endpoint_override_validation() {
        let mut client = MerchantClient::new(TOKEN, "en", "UTC").unwrap();

        client
            .set_base_api_endpoint("https://api.staging.veltro.com")
            .unwrap();
        assert_eq!(
            client.base_api_endpoint(),
            "https://api.staging.veltro.com/v1/"
        );

        for url in ["http://api.veltro.com/", "https://API.veltro.com/"] {
            let err = client.set_base_api_endpoint(url).unwrap_err();
            assert!(matches!(err, VeltroError::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_sandbox_mode() {
        let mut client = MerchantClient::new(TOKEN, "en", "UTC").unwrap();
        client.set_sandbox_mode();
        assert!(client.base_api_endpoint().starts_with(SANDBOX_API_ENDPOINT));
    }

    #[test]
    fn test_set_auth_token_rejects_empty() {
        let client = MerchantClient::new(TOKEN, "en", "UTC").unwrap();
        assert!(matches!(
            client.set_auth_token(""),
            Err(VeltroError::InvalidConfig(_))
        ));
        assert_eq!(client.auth_token(), None);
    }

    #[test]
    fn test_token_listener_invoked_on_injection() {
        use std::sync::Arc;
        use std::sync::Mutex;

        let client = MerchantClient::new(TOKEN, "en", "UTC").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_listener = Arc::clone(&seen);
        client.on_token_renewal(move |token| {
            seen_by_listener.lock().unwrap().push(token.to_string());
        });

        client.set_auth_token("session-1").unwrap();
        client.set_auth_token("session-2").unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["session-1", "session-2"]);
        assert_eq!(client.auth_token().as_deref(), Some("session-2"));
    }

    #[test]
    fn test_client_ip_priority() {
        let mut headers = HashMap::new();
        headers.insert(
            "X-Forwarded-For".to_string(),
            "203.0.113.7, 10.0.0.1".to_string(),
        );
        let remote = Some("192.0.2.1".parse().unwrap());

        assert_eq!(client_ip(&headers, remote).as_deref(), Some("203.0.113.7"));

        headers.clear();
        assert_eq!(client_ip(&headers, remote).as_deref(), Some("192.0.2.1"));
        assert_eq!(client_ip(&headers, None), None);
    }

    #[test]
    fn test_first_digit_run() {
        assert_eq!(first_digit_run("version2"), Some("2"));
        assert_eq!(first_digit_run("-6"), Some("6"));
        assert_eq!(first_digit_run("v10beta2"), Some("10"));
        assert_eq!(first_digit_run("latest"), None);
    }
}
