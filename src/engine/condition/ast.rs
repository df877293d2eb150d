// SPDX-License-Identifier: MIT

//! Compiled targeting programs
//!
//! The compiler lowers wire records into these trees once per refresh. They
//! hold no interior mutability, so a snapshot can share them across threads.

use regex::Regex;
use std::collections::HashSet;

use crate::engine::value::Value;

/// A single compiled check against one context variable
#[derive(Debug, Clone)]
pub enum Check {
    /// Fail-closed placeholder for malformed or unknown checks
    Never,
    /// Same-type equality
    Equal { variable: String, literal: Value },
    /// Numeric ordering with a string fallback
    Compare {
        variable: String,
        op: CompareOp,
        literal: Value,
    },
    /// Substring test on the textual forms
    Contains { variable: String, needle: String },
    /// Deterministic rollout: passes when the variable's bucket is below `threshold`
    Percent { variable: String, threshold: u32 },
    /// Unanchored regular expression search (wildcards compile to anchored patterns)
    Matches { variable: String, pattern: Regex },
    /// Every context item must be in `allowed`
    Subset {
        variable: String,
        allowed: HashSet<String>,
    },
    /// Every item of `required` must be in the context collection
    Superset {
        variable: String,
        required: Vec<String>,
    },
}

/// Ordering operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// <
    Lt,
    /// <=
    Lte,
    /// >
    Gt,
    /// >=
    Gte,
}

/// AND-group of checks. Never empty once compiled.
#[derive(Debug, Clone)]
pub struct Condition {
    pub checks: Vec<Check>,
}

/// Compiled flag behaviour for a remotely overridden flag
#[derive(Debug, Clone)]
pub enum FlagProgram {
    /// Flag resolves to a fixed state regardless of context
    Constant(bool),
    /// True when any condition passes
    AnyOf(Vec<Condition>),
}

/// One prioritised value rule
#[derive(Debug, Clone)]
pub struct ValueRule {
    pub condition: Condition,
    pub value: Value,
}

/// Compiled value behaviour: first matching rule wins, otherwise `fallback`
#[derive(Debug, Clone)]
pub struct ValueProgram {
    pub rules: Vec<ValueRule>,
    pub fallback: Value,
}

impl ValueProgram {
    pub fn constant(value: Value) -> Self {
        Self {
            rules: Vec::new(),
            fallback: value,
        }
    }
}

impl Check {
    /// Name of the context variable this check reads, if any
    pub fn variable(&self) -> Option<&str> {
        match self {
            Check::Never => None,
            Check::Equal { variable, .. }
            | Check::Compare { variable, .. }
            | Check::Contains { variable, .. }
            | Check::Percent { variable, .. }
            | Check::Matches { variable, .. }
            | Check::Subset { variable, .. }
            | Check::Superset { variable, .. } => Some(variable),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
        }
    }
}
