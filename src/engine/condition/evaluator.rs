//! Compiled program evaluator
//!
//! Every check reads a single context variable; a missing variable makes the
//! check fail rather than error.

use md5::{Digest, Md5};

use super::ast::{Check, CompareOp, Condition, FlagProgram, ValueProgram};
use crate::engine::value::{EvaluationContext, Value};

/// Evaluate a flag program against a context
pub fn evaluate_flag(program: &FlagProgram, ctx: &EvaluationContext) -> bool {
    match program {
        FlagProgram::Constant(enabled) => *enabled,
        FlagProgram::AnyOf(conditions) => conditions.iter().any(|c| evaluate_condition(c, ctx)),
    }
}

/// Evaluate a value program: rules are tried in declaration order.
pub fn evaluate_value<'a>(program: &'a ValueProgram, ctx: &EvaluationContext) -> &'a Value {
    program
        .rules
        .iter()
        .find(|rule| evaluate_condition(&rule.condition, ctx))
        .map(|rule| &rule.value)
        .unwrap_or(&program.fallback)
}

pub fn evaluate_condition(condition: &Condition, ctx: &EvaluationContext) -> bool {
    condition.checks.iter().all(|check| evaluate_check(check, ctx))
}

pub fn evaluate_check(check: &Check, ctx: &EvaluationContext) -> bool {
    let Some(actual) = check.variable().and_then(|name| ctx.get(name)) else {
        return false;
    };

    match check {
        Check::Never => false,
        Check::Equal { literal, .. } => actual == literal,
        Check::Compare { op, literal, .. } => compare_values(actual, *op, literal),
        Check::Contains { needle, .. } => actual.to_string().contains(needle.as_str()),
        Check::Percent {
            variable,
            threshold,
        } => rollout_hash(variable, actual) % 100 < *threshold,
        Check::Matches { pattern, .. } => pattern.is_match(&actual.to_string()),
        Check::Subset { allowed, .. } => match actual.as_list() {
            Some(items) if !items.is_empty() => items.iter().all(|i| allowed.contains(i)),
            _ => false,
        },
        Check::Superset { required, .. } => match actual.as_list() {
            Some(items) if !items.is_empty() => required.iter().all(|r| items.contains(r)),
            _ => false,
        },
    }
}

fn compare_values(actual: &Value, op: CompareOp, literal: &Value) -> bool {
    match (actual.as_f64(), literal.as_f64()) {
        (Some(a), Some(b)) => apply(op, a.partial_cmp(&b)),
        _ => apply(op, Some(actual.to_string().cmp(&literal.to_string()))),
    }
}

fn apply(op: CompareOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;
    match (op, ordering) {
        (_, None) => false,
        (CompareOp::Lt, Some(o)) => o == Less,
        (CompareOp::Lte, Some(o)) => o != Greater,
        (CompareOp::Gt, Some(o)) => o == Greater,
        (CompareOp::Gte, Some(o)) => o != Less,
    }
}

/// Stable rollout hash shared with every other client of the same authority:
/// MD5 over `name` followed by the value's text, last four digest bytes read
/// as a little-endian u32.
pub fn rollout_hash(name: &str, value: &Value) -> u32 {
    let mut hasher = Md5::new();
    hasher.update(name.as_bytes());
    hasher.update(value.to_string().as_bytes());
    let digest = hasher.finalize();
    u32::from_le_bytes([digest[12], digest[13], digest[14], digest[15]])
}
