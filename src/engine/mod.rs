// SPDX-License-Identifier: MIT

//! Local decision core: values, wire definitions, rule compilation and the
//! versioned state store. Nothing in here performs I/O.

pub mod condition;
pub mod error;
pub mod state;
pub mod types;
pub mod value;
