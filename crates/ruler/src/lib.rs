//! Reconciliation client for the ruler.
//!
//! This crate provides:
//! - `RulerTransport` trait with a reqwest implementation and an in-memory ruler
//! - `RulerClient` for push / verify / delete of rule groups, tenant-scoped
//! - Normalized field-by-field comparison of intended and fetched groups
//! - `Reconciler`, the build → push → verify entry point per definition

pub mod client;
pub mod compare;
pub mod error;
pub mod memory;
pub mod reconcile;
pub mod tenant;
pub mod transport;

pub use client::RulerClient;
pub use error::SyncError;
pub use reconcile::{Reconciler, SyncOutcome};
pub use tenant::TenantMapper;
pub use transport::{HttpTransport, RulerRequest, RulerResponse, RulerTransport, TransportError};
