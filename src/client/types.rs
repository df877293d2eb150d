// SPDX-License-Identifier: MIT

//! Request/response records exchanged with the remote authority

use serde::{Deserialize, Serialize};

use crate::engine::types::{FlagRecord, ValueRecord, Variable};
use crate::engine::value::Value;

/// Locally declared value reported during load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueInput {
    pub name: String,
    pub value: Value,
}

/// Startup exchange: registers the project and every declared key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub project: String,
    pub version: u64,
    pub variables: Vec<Variable>,
    pub flags: Vec<String>,
    pub values: Vec<ValueInput>,
}

/// Periodic exchange for already-known keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub project: String,
    pub version: u64,
    pub flags: Vec<String>,
    pub values: Vec<String>,
}

/// Definitions held by the remote authority at `version`.
/// Load and sync share this response shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteState {
    pub version: u64,
    #[serde(default)]
    pub flags: Vec<FlagRecord>,
    #[serde(default)]
    pub values: Vec<ValueRecord>,
}
