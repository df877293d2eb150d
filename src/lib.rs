// SPDX-License-Identifier: MIT

//! Feature flags client with locally evaluated targeting rules.
//!
//! Flag and value definitions are fetched from a remote authority, compiled
//! into targeting programs and merged into a versioned store. Evaluations run
//! locally against a per-request [`EvaluationContext`] and never touch the
//! network.
//!
//! ```no_run
//! use featureflags_rs::{ClientConfig, Defaults, EvaluationContext, FeatureFlags};
//!
//! # async fn demo() -> featureflags_rs::Result<()> {
//! let defaults = Defaults::new().flag("new_checkout", false).value("max_items", 25);
//! let flags = FeatureFlags::connect(
//!     ClientConfig::new("https://flags.example.com", "shop.web"),
//!     defaults,
//! )
//! .await?;
//!
//! let ctx = EvaluationContext::new().with("user.id", 123);
//! if flags.get("new_checkout", &ctx) {
//!     let limit = flags.value_int_or_default("max_items", &ctx);
//!     println!("limit: {}", limit);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod engine;

pub use client::{ClientConfig, FeatureFlags};
pub use engine::error::{FlagsError, Result, TransportError};
pub use engine::state::Defaults;
pub use engine::types::{Variable, VariableType};
pub use engine::value::{EvaluationContext, Value};
