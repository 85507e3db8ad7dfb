//! Event-notification engine of the mCASH merchant client.
//!
//! - [`poller`]: generic fixed-interval poll loop with generation-gated
//!   delivery.
//! - [`policies`]: what to check for payment outcomes, shortlink scans and
//!   report closing.
//! - [`listeners`]: per-kind listener registries.
//! - [`client`]: the [`MerchantClient`] façade owning all of the above.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod client;
pub mod error;
pub mod events;
pub mod listeners;
pub mod poller;
pub mod policies;

pub use client::MerchantClient;
pub use error::WorkflowError;
pub use events::EventKind;
pub use listeners::{ListenerId, Subscription};
pub use poller::{Check, PollPolicy, PollState, Poller};
