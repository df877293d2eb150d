// SPDX-License-Identifier: MIT

//! Typed value accessors
//!
//! Two families:
//! - `value_int` / `value_string` return an error for unknown keys or a value
//!   of the wrong shape.
//! - `value_int_or_default` / `value_string_or_default` fall back to the
//!   declared default on a wrong shape. They panic in two cases, both
//!   programming errors: the key was never declared, or the declared default
//!   itself does not have the requested shape.

use super::flags::FeatureFlags;
use crate::engine::error::{FlagsError, Result};
use crate::engine::value::{EvaluationContext, Value};

/// Integer view; floats are truncated toward zero.
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) => Some(f.trunc() as i64),
        _ => None,
    }
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

impl FeatureFlags {
    pub fn value_int(&self, name: &str, ctx: &EvaluationContext) -> Result<i64> {
        self.typed(name, ctx, "int", as_int)
    }

    pub fn value_string(&self, name: &str, ctx: &EvaluationContext) -> Result<String> {
        self.typed(name, ctx, "string", as_string)
    }

    /// # Panics
    ///
    /// If `name` is unknown to the client, or if both the evaluated value and
    /// the declared default fail to read as an integer.
    pub fn value_int_or_default(&self, name: &str, ctx: &EvaluationContext) -> i64 {
        self.typed_or_default(name, ctx, "int", as_int)
    }

    /// # Panics
    ///
    /// If `name` is unknown to the client, or if both the evaluated value and
    /// the declared default fail to read as a string.
    pub fn value_string_or_default(&self, name: &str, ctx: &EvaluationContext) -> String {
        self.typed_or_default(name, ctx, "string", as_string)
    }

    /// Whether the remote authority currently overrides the value.
    pub fn is_value_overridden(&self, name: &str) -> bool {
        self.store
            .snapshot()
            .value(name)
            .is_some_and(|state| state.is_overridden)
    }

    /// Whether the remote authority currently has rules for the flag.
    pub fn is_flag_overridden(&self, name: &str) -> bool {
        self.store
            .snapshot()
            .flag(name)
            .is_some_and(|state| state.program.is_some())
    }

    fn typed<T>(
        &self,
        name: &str,
        ctx: &EvaluationContext,
        expected: &'static str,
        convert: fn(&Value) -> Option<T>,
    ) -> Result<T> {
        let snapshot = self.store.snapshot();
        let value = snapshot
            .evaluate_value(name, ctx)
            .ok_or_else(|| FlagsError::ValueNotFound {
                name: name.to_string(),
            })?;
        convert(value).ok_or_else(|| FlagsError::wrong_type(name, expected, value.type_name()))
    }

    fn typed_or_default<T: std::fmt::Debug>(
        &self,
        name: &str,
        ctx: &EvaluationContext,
        expected: &'static str,
        convert: fn(&Value) -> Option<T>,
    ) -> T {
        let snapshot = self.store.snapshot();
        let Some(state) = snapshot.value(name) else {
            panic!(
                "value {} was never declared in defaults - this is a programming error",
                name
            );
        };

        let value = snapshot
            .evaluate_value(name, ctx)
            .unwrap_or(&state.default);
        if let Some(converted) = convert(value) {
            return converted;
        }

        match convert(&state.default) {
            Some(fallback) => {
                log::warn!(
                    "Value {} cannot be cast to {} (type: {}), using default {:?}",
                    name,
                    expected,
                    value.type_name(),
                    fallback
                );
                fallback
            }
            None => panic!(
                "value {} has no valid {} default - this is a programming error",
                name, expected
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::config::ClientConfig;
    use crate::client::transport::Transport;
    use crate::client::types::{LoadRequest, RemoteState, SyncRequest};
    use crate::engine::error::TransportError;
    use crate::engine::state::Defaults;
    use crate::engine::types::ValueRecord;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StaticTransport(RemoteState);

    #[async_trait]
    impl Transport for StaticTransport {
        async fn load(
            &self,
            _request: &LoadRequest,
        ) -> std::result::Result<RemoteState, TransportError> {
            Ok(self.0.clone())
        }

        async fn sync(
            &self,
            _request: &SyncRequest,
        ) -> std::result::Result<RemoteState, TransportError> {
            Ok(self.0.clone())
        }
    }

    fn overridden(name: &str, value: Value) -> ValueRecord {
        ValueRecord {
            name: name.to_string(),
            enabled: true,
            overridden: true,
            value_default: Value::Null,
            value_override: value,
            conditions: vec![],
        }
    }

    async fn client(values: Vec<ValueRecord>) -> FeatureFlags {
        let defaults = Defaults::new()
            .value("limit", 10)
            .value("ratio", 2.9)
            .value("banner", "hello")
            .value("untouched", 5)
            .flag("beta", false)
            .flag("released", false);
        let state = RemoteState {
            version: 1,
            flags: vec![crate::engine::types::FlagRecord {
                name: "released".to_string(),
                enabled: true,
                overridden: true,
                conditions: vec![],
            }],
            values,
        };
        FeatureFlags::with_transport(
            ClientConfig::new("http://localhost", "p"),
            defaults,
            Arc::new(StaticTransport(state)),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_value_int_and_string() {
        let flags = client(vec![]).await;
        let ctx = EvaluationContext::new();

        assert_eq!(flags.value_int("limit", &ctx).unwrap(), 10);
        assert_eq!(flags.value_int("ratio", &ctx).unwrap(), 2);
        assert_eq!(flags.value_string("banner", &ctx).unwrap(), "hello");

        assert!(matches!(
            flags.value_int("missing", &ctx),
            Err(FlagsError::ValueNotFound { .. })
        ));
        assert!(matches!(
            flags.value_int("banner", &ctx),
            Err(FlagsError::WrongType { expected: "int", actual: "string", .. })
        ));
        assert!(matches!(
            flags.value_string("limit", &ctx),
            Err(FlagsError::WrongType { expected: "string", actual: "int", .. })
        ));
    }

    #[tokio::test]
    async fn test_or_default_falls_back_on_wrong_type() {
        let flags = client(vec![
            overridden("limit", Value::from("lots")),
            overridden("banner", Value::Int(3)),
        ])
        .await;
        let ctx = EvaluationContext::new();

        assert_eq!(flags.value_int_or_default("limit", &ctx), 10);
        assert_eq!(flags.value_string_or_default("banner", &ctx), "hello");
        assert!(flags.value_int("limit", &ctx).is_err());
    }

    #[tokio::test]
    async fn test_or_default_uses_remote_value_when_valid() {
        let flags = client(vec![overridden("limit", Value::Float(42.7))]).await;
        assert_eq!(flags.value_int_or_default("limit", &EvaluationContext::new()), 42);
    }

    #[tokio::test]
    #[should_panic(expected = "never declared")]
    async fn test_or_default_panics_on_undeclared() {
        let flags = client(vec![]).await;
        flags.value_int_or_default("missing", &EvaluationContext::new());
    }

    #[tokio::test]
    #[should_panic(expected = "no valid int default")]
    async fn test_or_default_panics_when_default_has_wrong_shape() {
        let flags = client(vec![overridden("banner", Value::from("bye"))]).await;
        flags.value_int_or_default("banner", &EvaluationContext::new());
    }

    #[tokio::test]
    async fn test_remote_seeded_value_uses_remote_default() {
        let seeded = ValueRecord {
            name: "new_value".to_string(),
            enabled: true,
            overridden: false,
            value_default: Value::from("fallback"),
            value_override: Value::Int(123),
            conditions: vec![],
        };
        let flags = client(vec![seeded]).await;
        assert_eq!(
            flags.value_string_or_default("new_value", &EvaluationContext::new()),
            "fallback"
        );
    }

    #[tokio::test]
    async fn test_overridden_checks() {
        let flags = client(vec![overridden("limit", Value::Int(50))]).await;

        assert!(flags.is_value_overridden("limit"));
        assert!(!flags.is_value_overridden("untouched"));
        assert!(!flags.is_value_overridden("missing"));
        assert!(flags.is_flag_overridden("released"));
        assert!(!flags.is_flag_overridden("beta"));
        assert!(!flags.is_flag_overridden("missing"));
    }
}
