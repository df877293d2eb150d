// SPDX-License-Identifier: MIT

//! Targeting rule compilation and evaluation
//!
//! Remote rules arrive as check records grouped into conditions:
//! - a flag passes when any of its conditions passes
//! - a value takes the override of the first passing condition
//!
//! Records are compiled once per refresh into [`FlagProgram`] and
//! [`ValueProgram`] trees, which are then evaluated per request.

mod ast;
mod compiler;
mod evaluator;

pub use ast::{Check, CompareOp, Condition, FlagProgram, ValueProgram, ValueRule};
pub use compiler::{compile_check, compile_condition, compile_flag, compile_value};
pub use evaluator::{evaluate_check, evaluate_flag, evaluate_value, rollout_hash};
