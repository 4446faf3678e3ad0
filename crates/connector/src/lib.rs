//! `connector` crate — the contract of the remote node-connector service.
//!
//! Provides the [`NodeConnector`] client trait (one async method per remote
//! operation), the typed request/response models those methods exchange, and
//! an in-process [`SimulatedConnector`] for dry runs and tests.  No step logic
//! lives here.

pub mod client;
pub mod error;
pub mod models;
pub mod simulated;

pub use client::NodeConnector;
pub use error::RpcError;
pub use models::{RequestMetadata, ResponseMetadata};
pub use simulated::{SimulatedConnector, SimulatorConfig};
