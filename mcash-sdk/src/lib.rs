//! SDK for the mCASH merchant API.
//!
//! The crate is split the same way the API is consumed:
//!
//! - [`objects`]: wire types exchanged with the merchant API.
//! - [`config`]: the immutable client configuration and credentials.
//! - [`money`]: two-decimal money formatting used on every amount field.
//! - `client` (feature `client`, on by default): the transport seam, the
//!   retrying request executor and the typed [`client::MerchantApi`].
//! - `testkit` (feature `testkit`): a scripted transport for tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod money;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;

#[cfg(all(feature = "client", any(test, feature = "testkit")))]
pub mod testkit;
