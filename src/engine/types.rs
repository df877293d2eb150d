// SPDX-License-Identifier: MIT

//! Wire-level definitions of flags, values and their targeting rules
//!
//! These mirror the records served by the remote authority. They are decoded
//! once per refresh and immediately compiled; nothing evaluates them directly.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Expected shape of a context variable, declared to the remote authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum VariableType {
    String,
    Number,
    Timestamp,
    Set,
    /// A type code this client does not know; kept so decoding never fails on it.
    Unknown(i64),
}

impl From<i64> for VariableType {
    fn from(code: i64) -> Self {
        match code {
            1 => VariableType::String,
            2 => VariableType::Number,
            3 => VariableType::Timestamp,
            4 => VariableType::Set,
            other => VariableType::Unknown(other),
        }
    }
}

impl From<VariableType> for i64 {
    fn from(kind: VariableType) -> Self {
        match kind {
            VariableType::String => 1,
            VariableType::Number => 2,
            VariableType::Timestamp => 3,
            VariableType::Set => 4,
            VariableType::Unknown(code) => code,
        }
    }
}

/// A named, typed slot expected in an evaluation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: VariableType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Comparison operator codes (1-11 on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Operator {
    Equal,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Contains,
    Percent,
    Regexp,
    Wildcard,
    /// Context collection is included in the literal collection
    Subset,
    /// Context collection includes every literal item
    Superset,
    /// Unrecognised code; compiles to a check that never passes.
    Unknown(i64),
}

impl From<i64> for Operator {
    fn from(code: i64) -> Self {
        match code {
            1 => Operator::Equal,
            2 => Operator::LessThan,
            3 => Operator::LessOrEqual,
            4 => Operator::GreaterThan,
            5 => Operator::GreaterOrEqual,
            6 => Operator::Contains,
            7 => Operator::Percent,
            8 => Operator::Regexp,
            9 => Operator::Wildcard,
            10 => Operator::Subset,
            11 => Operator::Superset,
            other => Operator::Unknown(other),
        }
    }
}

impl From<Operator> for i64 {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Equal => 1,
            Operator::LessThan => 2,
            Operator::LessOrEqual => 3,
            Operator::GreaterThan => 4,
            Operator::GreaterOrEqual => 5,
            Operator::Contains => 6,
            Operator::Percent => 7,
            Operator::Regexp => 8,
            Operator::Wildcard => 9,
            Operator::Subset => 10,
            Operator::Superset => 11,
            Operator::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Equal => write!(f, "=="),
            Operator::LessThan => write!(f, "<"),
            Operator::LessOrEqual => write!(f, "<="),
            Operator::GreaterThan => write!(f, ">"),
            Operator::GreaterOrEqual => write!(f, ">="),
            Operator::Contains => write!(f, "contains"),
            Operator::Percent => write!(f, "percent"),
            Operator::Regexp => write!(f, "regexp"),
            Operator::Wildcard => write!(f, "wildcard"),
            Operator::Subset => write!(f, "subset"),
            Operator::Superset => write!(f, "superset"),
            Operator::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Variable reference inside a check. The type is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckVariable {
    pub name: String,
    #[serde(rename = "type", default = "unknown_variable_type")]
    pub kind: VariableType,
}

fn unknown_variable_type() -> VariableType {
    VariableType::Unknown(0)
}

/// One atomic comparison between a context variable and a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub operator: Operator,
    pub variable: CheckVariable,
    #[serde(default = "null_value")]
    pub value: Value,
}

impl CheckRecord {
    pub fn new(operator: Operator, variable: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            operator,
            variable: CheckVariable {
                name: variable.into(),
                kind: unknown_variable_type(),
            },
            value: value.into(),
        }
    }
}

/// AND-group of checks for a flag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    #[serde(default)]
    pub checks: Vec<CheckRecord>,
}

/// AND-group of checks for a value, plus the value it selects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueConditionRecord {
    #[serde(default)]
    pub checks: Vec<CheckRecord>,
    #[serde(default = "null_value")]
    pub value_override: Value,
}

/// Flag definition served by the remote authority
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagRecord {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    /// `false` means the remote has no opinion and the local default applies.
    #[serde(default)]
    pub overridden: bool,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
}

/// Value definition served by the remote authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub overridden: bool,
    #[serde(default = "null_value")]
    pub value_default: Value,
    #[serde(default = "null_value")]
    pub value_override: Value,
    #[serde(default)]
    pub conditions: Vec<ValueConditionRecord>,
}

fn null_value() -> Value {
    Value::Null
}
