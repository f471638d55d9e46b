//! Merchant contact operations.
//!
//! Contacts are keyed by role rather than id; templates are free-standing
//! records with full CRUD.

use crate::client::MerchantClient;
use crate::error::{Result, VeltroError};
use crate::transport::{Method, Params, RequestOptions};
use std::fmt;

/// Contact roles recognized by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Main,
    Technical,
    Accounting,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Main => "main",
            ContactKind::Technical => "technical",
            ContactKind::Accounting => "accounting",
        }
    }
}

impl fmt::Display for ContactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for contact operations.
///
/// Access via `client.contacts()`.
pub struct ContactsClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> ContactsClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists contacts of the given role.
    pub async fn listing(&self, kind: ContactKind) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("contacts/{kind}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Updates the contact of the given role.
    pub async fn update(&self, kind: ContactKind, contact: Params) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Put,
                &format!("contacts/{kind}"),
                RequestOptions::form(contact),
            )
            .await?;
        Ok(response.into_map())
    }
}

/// Client for contact template operations.
///
/// Access via `client.contact_templates()`.
pub struct ContactTemplatesClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> ContactTemplatesClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists contact templates.
    pub async fn listing(&self) -> Result<Params> {
        let response = self
            .api
            .call(Method::Get, "contacts_templates/", RequestOptions::default())
            .await?;
        Ok(response.into_map())
    }

    /// Creates a contact template.
    pub async fn create(&self, template: Params) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Post,
                "contacts_templates/",
                RequestOptions::form(template),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Updates a contact template. The map must contain `id`.
    pub async fn update(&self, template: Params) -> Result<Params> {
        let id = template
            .get("id")
            .and_then(crate::accounts::id_string)
            .ok_or(VeltroError::MissingField("id"))?;

        let response = self
            .api
            .call(
                Method::Put,
                &format!("contacts_templates/{id}"),
                RequestOptions::form(template),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Gets contact template details.
    pub async fn details(&self, template_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("contacts_templates/{template_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Deletes a contact template.
    pub async fn delete(&self, template_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Delete,
                &format!("contacts_templates/{template_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }
}
