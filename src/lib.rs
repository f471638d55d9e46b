//! # Veltro Rust SDK
//!
//! Official Rust SDK for the Veltro Merchant API.
//!
//! Veltro processes online payments for merchant integrations:
//! transactions, settlement accounts, payouts, points of sale and the
//! payment channels available to buyers. This crate handles the
//! client-side plumbing — credential validation, environment selection,
//! session tokens, request signing headers and response normalization —
//! and leaves the business decisions to you.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use veltro::MerchantClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The token prefix picks the environment: test_ targets the sandbox.
//!     let client = MerchantClient::new(
//!         "test_9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0f",
//!         "en",
//!         "Europe/Warsaw",
//!     )?;
//!
//!     // Obtain a session token; it is attached to every later request.
//!     client.auth("merchant_login", "merchant_password").await?;
//!
//!     // Create a payment transaction.
//!     let transaction = client.transactions().create(
//!         json!({
//!             "amount": "12.50",
//!             "currency": "pln",
//!             "order_id": "1044",
//!         }).as_object().cloned().unwrap(),
//!     ).await?;
//!
//!     println!(
//!         "created {} (sign {})",
//!         transaction["identifier"], transaction["sign"],
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! A session token comes from [`MerchantClient::auth`] or is injected
//! with [`MerchantClient::set_auth_token`] (e.g. restored from a session
//! store). The server may rotate the token close to expiry by returning
//! a replacement header on any response; the client adopts it
//! transparently. Register [`MerchantClient::on_token_renewal`] to
//! persist whichever token is currently active:
//!
//! ```rust,no_run
//! use veltro::MerchantClient;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MerchantClient::new(
//!     "prod_9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0f",
//!     "en",
//!     "Europe/Warsaw",
//! )?;
//! client.on_token_renewal(|token| {
//!     // write the token to your session store
//!     println!("active session token: {token}");
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, VeltroError>`:
//!
//! ```rust,no_run
//! use veltro::{MerchantClient, VeltroError};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = MerchantClient::new(
//!         "prod_9f8b7c6d-1a2b-4c3d-8e4f-5a6b7c8d9e0f",
//!         "en",
//!         "Europe/Warsaw",
//!     ).unwrap();
//!
//!     match client.payouts().listing().await {
//!         Ok(payouts) => println!("{payouts:?}"),
//!         Err(VeltroError::Api { http_code: 401, .. }) => println!("session expired"),
//!         Err(VeltroError::Transport(e)) => println!("network trouble: {e}"),
//!         Err(e) => println!("error: {e}"),
//!     }
//! }
//! ```

pub mod accounts;
pub mod addresses;
pub mod channels;
pub mod client;
pub mod contacts;
pub mod error;
pub mod offers;
pub mod payouts;
pub mod pos;
pub mod response;
pub mod transactions;
pub mod transport;

// Re-export main types at the crate root
pub use client::{client_ip, ClientConfig, MerchantClient};
pub use error::{Result, VeltroError};
pub use response::ApiResponse;
pub use transport::{Method, Params, RequestOptions};

// Resource clients and their wire enums
pub use accounts::{AccountsClient, BankAccountsClient, ReportType};
pub use addresses::{AddressKind, AddressTemplatesClient, AddressesClient};
pub use channels::{ChannelType, ChannelsClient};
pub use contacts::{ContactKind, ContactTemplatesClient, ContactsClient};
pub use offers::{OfferKind, OffersClient};
pub use payouts::PayoutsClient;
pub use pos::PosClient;
pub use transactions::{TransactionStatus, TransactionsClient};
