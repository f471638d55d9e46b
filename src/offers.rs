//! Offer lookups.
//!
//! Offers describe the commercial terms active on the merchant account.

use crate::client::MerchantClient;
use crate::error::Result;
use crate::transport::{Method, Params, RequestOptions};
use std::fmt;

/// Offer categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferKind {
    Services,
    Payments,
}

impl OfferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferKind::Services => "services",
            OfferKind::Payments => "payments",
        }
    }
}

impl fmt::Display for OfferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for offer lookups.
///
/// Access via `client.offers()`.
pub struct OffersClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> OffersClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists active offers of the given kind.
    pub async fn listing(&self, kind: OfferKind) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("offer/{kind}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }

    /// Gets details about an offer.
    pub async fn details(&self, kind: OfferKind, offer_id: &str) -> Result<Params> {
        let response = self
            .api
            .call(
                Method::Get,
                &format!("offer/{kind}/{offer_id}"),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }
}
