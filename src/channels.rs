//! Payment channel discovery.

use crate::client::MerchantClient;
use crate::error::Result;
use crate::transport::{form_encode, Method, Params, RequestOptions};
use serde_json::Value;

/// Payment channel categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    /// Online bank transfers.
    ETransfer = 1,
    /// BLIK one-time codes.
    Blik = 2,
    /// Mobile application channels.
    MobileApp = 4,
    /// Manually settled payments.
    Manual = 8,
    Card = 16,
    Other = 32,
}

impl ChannelType {
    /// Numeric channel code used on the wire.
    pub fn code(&self) -> i64 {
        *self as i64
    }
}

/// Client for payment channel lookups.
///
/// Access via `client.channels()`.
pub struct ChannelsClient<'a> {
    api: &'a MerchantClient,
}

impl<'a> ChannelsClient<'a> {
    pub(crate) fn new(api: &'a MerchantClient) -> Self {
        Self { api }
    }

    /// Lists payment channels currently available for a currency,
    /// optionally filtered by channel type.
    pub async fn listing(&self, currency: &str, types: &[ChannelType]) -> Result<Params> {
        let type_filter = types
            .iter()
            .map(|t| t.code().to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut query = Params::new();
        query.insert(
            "currency".to_string(),
            Value::from(currency.trim().to_ascii_uppercase()),
        );
        query.insert("type".to_string(), Value::from(type_filter));

        let response = self
            .api
            .call(
                Method::Get,
                &format!("paymentChannels?{}", form_encode(&query)),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.into_map())
    }
}
