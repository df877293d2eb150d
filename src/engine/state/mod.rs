// SPDX-License-Identifier: MIT

//! Flag and value state
//!
//! This module provides:
//! - `Defaults` - locally declared keys and their permanent defaults
//! - `FlagStore` - versioned, snapshot-swapped store merged from remote updates
//! - `Snapshot` - one consistent generation that evaluations read from

mod schema;
mod store;

pub use schema::{Defaults, FlagDefault, ValueDefault};
pub use store::{FlagState, FlagStore, Snapshot, ValueState};
