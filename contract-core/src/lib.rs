//! Core of the contract coordination service: the signature protocol,
//! per-contract key registry, replicated persistence, the contract state
//! machine, the authentication gate, and the effect-resolver adapter.
//! Transport-agnostic — `contract-node` is the HTTP binding over this.

pub mod auth;
pub mod crypto;
pub mod error;
pub mod fs_util;
pub mod keys;
pub mod model;
pub mod resolver;
pub mod state_machine;
pub mod store;

#[cfg(test)]
pub(crate) mod test_util;

pub use error::Error;
