//! Transaction operations.
//!
//! Creating, listing and settling payment transactions, plus the tolerant
//! notification helper used by merchant webhook endpoints.

use crate::client::MerchantClient;
use crate::error::{Result, VeltroError};
use crate::transport::{form_encode, Method, Params, RequestOptions};
use serde_json::Value;

/// Transaction lifecycle statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    New = 1,
    Paid = 2,
    Accepted = 4,
    Refunded = 16,
    Declined = 32,
}

impl TransactionStatus {
    /// Numeric status code used on the wire.
    pub fn code(&self) -> i64 {
        *self as i64
    }
}

/// Client for transaction operations.
///
/// Access via `client.transactions()`.
pub struct TransactionsClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> TransactionsClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Creates a transaction.
    ///
    /// The `currency` field, when present, is trimmed and uppercased
    /// before submission. A successful response must carry the
    /// `identifier` and `sign` of the new transaction; a response missing
    /// either is a protocol violation and fails with
    /// [`VeltroError::MalformedResponse`].
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
    ///     let transaction = client.transactions().create(
    ///         json!({
    ///             "amount": "12.50",
    ///             "currency": "pln",
    ///             "order_id": "1044",
    ///             "buyer": {"email": "jan@example.com"},
    ///         }).as_object().cloned().unwrap(),
    ///     ).await?;
    ///
    ///     println!("redirect sign: {}", transaction["sign"]);
    ///     Ok(())
    /// }
    /// ```
    pub async fn create(&self, mut transaction: Params) -> Result<Params> {
        if let Some(currency) = transaction.get("currency").and_then(Value::as_str) {
            let currency = currency.trim().to_ascii_uppercase();
            transaction.insert("currency".to_string(), Value::from(currency));
        }

        let response = self
            .api
            .call(Method::Post, "transactions", RequestOptions::form(transaction))
            .await?;

        if is_empty_field(response.get("identifier")) || is_empty_field(response.get("sign")) {
            return Err(VeltroError::MalformedResponse {
                message: "create response is missing identifier or sign".to_string(),
                http_code: response.http_code(),
                body: response.to_string(),
            });
        }

        Ok(response.into_map())
    }

    /// Lists transactions, optionally narrowed by pagination settings.
    pub async fn listing(&self, pagination: Params) -> Result<Params> {
        let route = if pagination.is_empty() {
            "transactions/".to_string()
        } else {
            format!("transactions/?{}", form_encode(&pagination))
        };
        let response = self
            .api
            .call(Method::Get, &route, RequestOptions::default())
            .await?;
        Ok(response.into_map())
    }

    /// Gets transaction details.
    pub async fn details(&self, identifier: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("transactions/{identifier}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Accepts the transaction.
    ///
    /// Usually unnecessary; auto-acceptance is enabled by default on most
    /// merchant accounts.
    pub async fn accept(&self, identifier: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Put,
                &format!("transactions/{identifier}/accept"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Declines the transaction. Only paid transactions can be declined.
    pub async fn decline(&self, identifier: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Put,
                &format!("transactions/{identifier}/decline"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Refunds the transaction.
    ///
    /// The map must contain `identifier`; `refund_amount` and `desc` are
    /// optional and refund the full amount when omitted.
    pub async fn refund(&self, transaction: Params) -> Result<Params> {
        let identifier = transaction
            .get("identifier")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(VeltroError::MissingField("identifier"))?;

        let response = self
            .api
            .call(
                Method::Post,
                &format!("transactions/{identifier}/refund"),
                RequestOptions::form(transaction),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Handles an inbound transaction notification.
    ///
    /// The identifier comes from the explicit argument or, when absent,
    /// from the notification payload's `identifier` field. The
    /// transaction is returned only when its status is
    /// [`TransactionStatus::Accepted`]; missing identifiers, lookup
    /// failures and any other status all yield `None`. Errors are
    /// swallowed deliberately — do not use this helper where failures
    /// must be observed.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use veltro::MerchantClient;
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
    ///     // `payload` is the form body of the inbound notification
    ///     // request, decoded by the host web framework.
    ///     let payload = serde_json::json!({"identifier": "tr_2kx9"})
    ///         .as_object().cloned().unwrap();
    ///     if let Some(transaction) = client
    ///         .transactions()
    ///         .handle_callback(None, Some(&payload))
    ///         .await
    ///     {
    ///         println!("paid: {}", transaction["amount"]);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn handle_callback(
        &self,
        identifier: Option<&str>,
        payload: Option<&Params>,
    ) -> Option<Params> {
        let identifier = identifier.map(str::to_string).or_else(|| {
            payload?
                .get("identifier")
                .and_then(Value::as_str)
                .map(str::to_string)
        })?;

        match self.details(&identifier).await {
            Ok(transaction) if is_accepted(transaction.get("status")) => Some(transaction),
            _ => None,
        }
    }
}

/// Missing, null, empty-string, `false` and `0` all count as absent,
/// matching the loose presence rules of the API contract.
fn is_empty_field(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_i64() == Some(0),
        Some(_) => false,
    }
}

/// The status field arrives as a number, but some serializers render it
/// as a numeric string.
fn is_accepted(status: Option<&Value>) -> bool {
    let accepted = TransactionStatus::Accepted.code();
    match status {
        Some(Value::Number(n)) => n.as_i64() == Some(accepted),
        Some(Value::String(s)) => s.parse::<i64>() == Ok(accepted),
        _ => false,
    }
}
