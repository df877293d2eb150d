// SPDX-License-Identifier: MIT

//! Client surface: configuration, transport, background sync and typed reads
//!
//! - [`FeatureFlags`] - the client handed to application code
//! - [`ClientConfig`] - endpoint, project, intervals and declared variables
//! - [`Transport`] / [`HttpTransport`] - load and sync exchanges

mod accessors;
pub mod config;
mod flags;
pub mod sync;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SYNC_INTERVAL};
pub use flags::FeatureFlags;
pub use transport::{HttpTransport, Transport};
pub use types::{LoadRequest, RemoteState, SyncRequest, ValueInput};
