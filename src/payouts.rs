//! Payout operations.

use crate::client::MerchantClient;
use crate::error::Result;
use crate::transport::{Method, Params, RequestOptions};
use serde_json::Value;

/// Client for payout operations.
///
/// Access via `client.payouts()`.
pub struct PayoutsClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> PayoutsClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Requests a payout of the account's available balance.
    pub async fn create(&self, account_id: &str) -> Result<Params> {
        let mut form = Params::new();
        form.insert("account_id".to_string(), Value::from(account_id));

        let response = self
            .api
            .call(
                Method::Post,
                &format!("accounts/{account_id}/payouts"),
                RequestOptions::form(form),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Lists all payouts.
    pub async fn listing(&self) -> Result<Params> {
        let response = self
            .api
            .call(Method::Get, "payouts", RequestOptions::default())
            .await?;
        Ok(response.into_map())
    }

    /// Gets payout details.
    pub async fn details(&self, identifier: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("payouts/{identifier}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }
}
