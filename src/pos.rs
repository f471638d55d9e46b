//! Point of sale operations.
//!
//! A POS groups transactions under one storefront; settlement accounts
//! are bound to it to receive its funds.

use crate::client::MerchantClient;
use crate::error::{Result, VeltroError};
use crate::transport::{Method, Params, RequestOptions};

/// Client for point of sale operations.
///
/// Access via `client.pos()`.
pub struct PosClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> PosClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists points of sale.
    pub async fn listing(&self) -> Result<Params> {
        let response = self
            .api
            .call(Method::Get, "pos/", RequestOptions::default())
            .await?;
        Ok(response.into_map())
    }

    /// Creates a point of sale.
    pub async fn create(&self, pos: Params) -> Result<Params> {
        let response = self
            .api
            .call(Method::Post, "pos/", RequestOptions::form(pos))
            .await?;
        Ok(response.into_map())
    }

    /// Updates a point of sale. The map must contain `id`.
    pub async fn update(&self, pos: Params) -> Result<Params> {
        let id = pos
            .get("id")
            .and_then(crate::accounts::id_string)
            .ok_or(VeltroError::MissingField("id"))?;

        let response = self
            .api
            .call(
                Method::Put,
                &format!("pos/{id}"),
                RequestOptions::form(pos),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Gets details about a point of sale.
    pub async fn details(&self, pos_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("pos/{pos_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Lists accounts bound to a point of sale.
    pub async fn accounts(&self, pos_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("pos/{pos_id}/accounts"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Binds an account to a point of sale.
    pub async fn bind_account(&self, pos_id: &str, account_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Post,
                &format!("pos/{pos_id}/accounts/{account_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Unbinds an account from a point of sale.
    pub async fn unbind_account(&self, pos_id: &str, account_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Delete,
                &format!("pos/{pos_id}/accounts/{account_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }
}
