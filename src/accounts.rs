//! Merchant account operations.
//!
//! Settlement accounts, their reports, and the read-only bank account
//! registry they pay out to.

use crate::client::MerchantClient;
use crate::error::{Result, VeltroError};
use crate::transport::{form_encode, Method, Params, RequestOptions};
use serde_json::Value;

/// Account report types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Payouts = 1,
    Transactions = 2,
    Refunds = 4,
    Charges = 32,
}

impl ReportType {
    /// Numeric report code used on the wire.
    pub fn code(&self) -> i64 {
        *self as i64
    }
}

/// Client for merchant account operations.
///
/// Access via `client.accounts()`.
pub struct AccountsClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> AccountsClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists accounts.
    pub async fn listing(&self) -> Result<Params> {
        let response = self
            .api
            .call(Method::Get, "accounts/", RequestOptions::default())
            .await?;
        Ok(response.into_map())
    }

    /// Creates an account.
    pub async fn create(&self, account: Params) -> Result<Params> {
        let response = self
            .api
            .call(Method::Post, "accounts/", RequestOptions::form(account))
            .await?;
        Ok(response.into_map())
    }

    /// Updates an account.
    ///
    /// The map must contain `account_id`, which addresses the account and
    /// is re-keyed to `id` in the submitted body.
    pub async fn update(&self, mut account: Params) -> Result<Params> {
        let id = account
            .shift_remove("account_id")
            .and_then(|value| id_string(&value))
            .ok_or(VeltroError::MissingField("account_id"))?;
        account.insert("id".to_string(), Value::from(id.clone()));

        let response = self
            .api
            .call(
                Method::Put,
                &format!("accounts/{id}"),
                RequestOptions::form(account),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Gets account details.
    pub async fn details(&self, account_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("accounts/{account_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Generates an account report.
    ///
    /// `parameters` narrows the report (date ranges etc.); see the API
    /// documentation for the accepted keys per report type.
    pub async fn report(
        &self,
        account_id: &str,
        report_type: ReportType,
        parameters: Params,
    ) -> Result<Params> {
        let mut query = Params::new();
        query.insert("type".to_string(), Value::from(report_type.code()));
        query.extend(parameters);

        let response = self
            .api
            .call(
                Method::Get,
                &format!("accounts/{account_id}/report?{}", form_encode(&query)),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }
}

/// Client for bank account lookups.
///
/// Access via `client.bank_accounts()`.
pub struct BankAccountsClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> BankAccountsClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists bank accounts.
    pub async fn listing(&self) -> Result<Params> {
        let response = self
            .api
            .call(Method::Get, "bank_accounts/", RequestOptions::default())
            .await?;
        Ok(response.into_map())
    }

    /// Gets bank account details.
    pub async fn details(&self, bank_account_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("bank_accounts/{bank_account_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }
}

/// Identifiers arrive as strings or numbers depending on the caller.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
