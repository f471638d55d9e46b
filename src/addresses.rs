//! Merchant address operations.

use crate::client::MerchantClient;
use crate::error::{Result, VeltroError};
use crate::transport::{Method, Params, RequestOptions};
use std::fmt;

/// Address kinds recognized by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Registration,
    Correspondence,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Registration => "registration",
            AddressKind::Correspondence => "correspondence",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for address operations.
///
/// Access via `client.addresses()`.
pub struct AddressesClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> AddressesClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists addresses of the given kind.
    pub async fn listing(&self, kind: AddressKind) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("addresses/{kind}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Updates the address of the given kind.
    pub async fn update(&self, kind: AddressKind, address: Params) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Put,
                &format!("addresses/{kind}"),
                RequestOptions::form(address),
            )
            .await?;
        Ok(response.into_map())
    }
}

/// Client for address template operations.
///
/// Access via `client.address_templates()`.
pub struct AddressTemplatesClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> AddressTemplatesClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists address templates.
    pub async fn listing(&self) -> Result<Params> {
        let response = self
            .api
            .call(Method::Get, "addresses_templates/", RequestOptions::default())
            .await?;
        Ok(response.into_map())
    }

    /// Creates an address template.
    pub async fn create(&self, template: Params) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Post,
                "addresses_templates/",
                RequestOptions::form(template),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Updates an address template. The map must contain `id`.
    pub async fn update(&self, template: Params) -> Result<Params> {
        let id = template
            .get("id")
            .and_then(crate::accounts::id_string)
            .ok_or(VeltroError::MissingField("id"))?;

        let response = self
            .api
            .call(
                Method::Put,
                &format!("addresses_templates/{id}"),
                RequestOptions::form(template),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Gets address template details.
    pub async fn details(&self, template_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("addresses_templates/{template_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Deletes an address template.
    pub async fn delete(&self, template_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Delete,
                &format!("addresses_templates/{template_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_kind_routes() {
        assert_eq!(AddressKind::Registration.to_string(), "registration");
        assert_eq!(AddressKind::Correspondence.to_string(), "correspondence");
    }
}
