// SPDX-License-Identifier: MIT

//! Lowers wire records into compiled programs
//!
//! Compilation never fails: anything malformed becomes a check that never
//! passes, so a bad rule can only narrow who sees an override.

use regex::Regex;

use super::ast::{Check, CompareOp, Condition, FlagProgram, ValueProgram, ValueRule};
use crate::engine::types::{CheckRecord, FlagRecord, Operator, ValueRecord};
use crate::engine::value::Value;

/// Compile a flag definition.
///
/// Returns `None` when the remote has no opinion on the flag, in which case
/// the locally declared default applies.
pub fn compile_flag(record: &FlagRecord) -> Option<FlagProgram> {
    if !record.overridden {
        return None;
    }

    if record.enabled && !record.conditions.is_empty() {
        let conditions = record
            .conditions
            .iter()
            .map(|c| compile_condition(&c.checks))
            .collect();
        return Some(FlagProgram::AnyOf(conditions));
    }

    Some(FlagProgram::Constant(record.enabled))
}

/// Compile a value definition into a prioritised rule list.
pub fn compile_value(record: &ValueRecord) -> ValueProgram {
    if !record.overridden {
        return ValueProgram::constant(record.value_default.clone());
    }

    if !record.enabled {
        return ValueProgram::constant(record.value_override.clone());
    }

    ValueProgram {
        rules: record
            .conditions
            .iter()
            .map(|c| ValueRule {
                condition: compile_condition(&c.checks),
                value: c.value_override.clone(),
            })
            .collect(),
        fallback: record.value_override.clone(),
    }
}

/// AND-group; an empty group is invalid and can never pass.
pub fn compile_condition(checks: &[CheckRecord]) -> Condition {
    if checks.is_empty() {
        return Condition {
            checks: vec![Check::Never],
        };
    }
    Condition {
        checks: checks.iter().map(compile_check).collect(),
    }
}

pub fn compile_check(record: &CheckRecord) -> Check {
    if record.value.is_null() {
        return Check::Never;
    }

    let variable = record.variable.name.clone();
    let literal = &record.value;

    match record.operator {
        Operator::Equal => Check::Equal {
            variable,
            literal: literal.clone(),
        },
        Operator::LessThan => compare(variable, CompareOp::Lt, literal),
        Operator::LessOrEqual => compare(variable, CompareOp::Lte, literal),
        Operator::GreaterThan => compare(variable, CompareOp::Gt, literal),
        Operator::GreaterOrEqual => compare(variable, CompareOp::Gte, literal),
        Operator::Contains => Check::Contains {
            variable,
            needle: literal.to_string(),
        },
        Operator::Percent => match literal.as_f64() {
            // Saturating cast: negative thresholds never pass, >100 always do.
            Some(threshold) => Check::Percent {
                variable,
                threshold: threshold as u32,
            },
            None => Check::Never,
        },
        Operator::Regexp => regexp(variable, &literal.to_string()),
        Operator::Wildcard => regexp(variable, &wildcard_pattern(&literal.to_string())),
        Operator::Subset => match literal.as_list() {
            Some(items) if !items.is_empty() => Check::Subset {
                variable,
                allowed: items.iter().cloned().collect(),
            },
            _ => Check::Never,
        },
        Operator::Superset => match literal.as_list() {
            Some(items) if !items.is_empty() => Check::Superset {
                variable,
                required: items.to_vec(),
            },
            _ => Check::Never,
        },
        Operator::Unknown(code) => {
            log::warn!("Unknown operator {} for variable '{}'", code, variable);
            Check::Never
        }
    }
}

fn compare(variable: String, op: CompareOp, literal: &Value) -> Check {
    Check::Compare {
        variable,
        op,
        literal: literal.clone(),
    }
}

fn regexp(variable: String, pattern: &str) -> Check {
    match Regex::new(pattern) {
        Ok(pattern) => Check::Matches { variable, pattern },
        Err(e) => {
            log::warn!("Invalid pattern for variable '{}': {}", variable, e);
            Check::Never
        }
    }
}

/// `*` matches any sequence; everything else is literal and the whole
/// string must match.
fn wildcard_pattern(glob: &str) -> String {
    let parts: Vec<String> = glob.split('*').map(regex::escape).collect();
    format!("^{}$", parts.join("(?:.*)"))
}
