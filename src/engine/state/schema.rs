// SPDX-License-Identifier: MIT

//! Locally declared defaults
//!
//! Every flag and value the application reads must be declared here before
//! the client is created. The declared value is the key's permanent default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::error::{FlagsError, Result};
use crate::engine::value::Value;

/// Flag declaration with its static default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDefault {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
}

/// Value declaration with its default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDefault {
    pub name: String,
    pub value: Value,
}

/// All declarations for one client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub flags: Vec<FlagDefault>,
    #[serde(default)]
    pub values: Vec<ValueDefault>,
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.flags.push(FlagDefault {
            name: name.into(),
            enabled,
        });
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push(ValueDefault {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Load declarations from a YAML file
    pub fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FlagsError::config(format!("cannot read defaults {}: {}", path.display(), e))
        })?;
        Self::parse_yaml(&content)
    }

    /// Parse declarations from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| FlagsError::config(format!("invalid defaults: {}", e)))
    }
}
