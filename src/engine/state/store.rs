// SPDX-License-Identifier: MIT

//! Versioned flag/value store
//!
//! Readers pin an immutable [`Snapshot`]; a merge compiles the incoming
//! definitions first and then publishes a replacement snapshot in one swap,
//! so no evaluation ever sees a half-applied refresh.

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

use super::schema::Defaults;
use crate::engine::condition::{
    compile_flag, compile_value, evaluate_flag, evaluate_value, FlagProgram, ValueProgram,
};
use crate::engine::types::{FlagRecord, ValueRecord};
use crate::engine::value::{EvaluationContext, Value};

/// Local state of one flag
#[derive(Debug, Clone)]
pub struct FlagState {
    pub name: String,
    /// Declared default; never replaced by a merge
    pub static_default: bool,
    /// `None` while the remote has no opinion
    pub program: Option<Arc<FlagProgram>>,
}

/// Local state of one value
#[derive(Debug, Clone)]
pub struct ValueState {
    pub name: String,
    /// Latest base value (declared default, then the remote override)
    pub current: Value,
    /// Declared default; never replaced by a merge
    pub default: Value,
    pub is_overridden: bool,
    pub program: Arc<ValueProgram>,
}

/// One consistent generation of the store
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub version: u64,
    pub flags: HashMap<String, FlagState>,
    pub values: HashMap<String, ValueState>,
}

impl Snapshot {
    /// Unknown flags are off; flags without a remote program use their default.
    pub fn evaluate_flag(&self, name: &str, ctx: &EvaluationContext) -> bool {
        match self.flags.get(name) {
            None => false,
            Some(FlagState {
                program: None,
                static_default,
                ..
            }) => *static_default,
            Some(FlagState {
                program: Some(program),
                ..
            }) => evaluate_flag(program, ctx),
        }
    }

    pub fn evaluate_value(&self, name: &str, ctx: &EvaluationContext) -> Option<&Value> {
        self.values
            .get(name)
            .map(|state| evaluate_value(&state.program, ctx))
    }

    pub fn flag(&self, name: &str) -> Option<&FlagState> {
        self.flags.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&ValueState> {
        self.values.get(name)
    }
}

/// Concurrency-safe holder of the current [`Snapshot`]
pub struct FlagStore {
    snapshot: ArcSwap<Snapshot>,
    flag_names: Vec<String>,
    value_names: Vec<String>,
}

impl FlagStore {
    /// Register every declared key with its default at version 0
    pub fn new(defaults: &Defaults) -> Self {
        let mut snapshot = Snapshot::default();
        let mut flag_names = Vec::with_capacity(defaults.flags.len());
        let mut value_names = Vec::with_capacity(defaults.values.len());

        for flag in &defaults.flags {
            if snapshot.flags.contains_key(&flag.name) {
                log::warn!("Flag {} declared more than once, keeping the last default", flag.name);
            } else {
                flag_names.push(flag.name.clone());
            }
            snapshot.flags.insert(
                flag.name.clone(),
                FlagState {
                    name: flag.name.clone(),
                    static_default: flag.enabled,
                    program: None,
                },
            );
        }

        for value in &defaults.values {
            if snapshot.values.contains_key(&value.name) {
                log::warn!("Value {} declared more than once, keeping the last default", value.name);
            } else {
                value_names.push(value.name.clone());
            }
            snapshot.values.insert(
                value.name.clone(),
                ValueState {
                    name: value.name.clone(),
                    current: value.value.clone(),
                    default: value.value.clone(),
                    is_overridden: false,
                    program: Arc::new(ValueProgram::constant(value.value.clone())),
                },
            );
        }

        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            flag_names,
            value_names,
        }
    }

    /// Pin the current generation
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub fn version(&self) -> u64 {
        self.snapshot.load().version
    }

    /// Names declared at construction, in declaration order
    pub fn flag_names(&self) -> &[String] {
        &self.flag_names
    }

    pub fn value_names(&self) -> &[String] {
        &self.value_names
    }

    pub fn evaluate_flag(&self, name: &str, ctx: &EvaluationContext) -> bool {
        self.snapshot.load().evaluate_flag(name, ctx)
    }

    pub fn evaluate_value(&self, name: &str, ctx: &EvaluationContext) -> Option<Value> {
        self.snapshot.load().evaluate_value(name, ctx).cloned()
    }

    /// Merge a remote generation.
    ///
    /// Returns `false` without touching anything when `version` is already
    /// held. Keys in the payload get fresh programs and override state while
    /// keeping their declared defaults; keys absent from the payload are left
    /// as they are.
    pub fn merge(&self, version: u64, flags: &[FlagRecord], values: &[ValueRecord]) -> bool {
        if self.version() == version {
            return false;
        }

        let flag_programs: Vec<(&FlagRecord, Option<Arc<FlagProgram>>)> = flags
            .iter()
            .map(|record| (record, compile_flag(record).map(Arc::new)))
            .collect();
        let value_programs: Vec<(&ValueRecord, Arc<ValueProgram>)> = values
            .iter()
            .map(|record| (record, Arc::new(compile_value(record))))
            .collect();

        let mut changed = false;
        self.snapshot.rcu(|current| {
            if current.version == version {
                changed = false;
                return Arc::clone(current);
            }
            changed = true;

            let mut next = Snapshot::clone(current);
            next.version = version;

            for (record, program) in &flag_programs {
                let static_default = current
                    .flags
                    .get(&record.name)
                    .map(|state| state.static_default)
                    .unwrap_or(false);
                next.flags.insert(
                    record.name.clone(),
                    FlagState {
                        name: record.name.clone(),
                        static_default,
                        program: program.clone(),
                    },
                );
            }

            for (record, program) in &value_programs {
                let default = current
                    .values
                    .get(&record.name)
                    .map(|state| state.default.clone())
                    .unwrap_or_else(|| record.value_default.clone());
                next.values.insert(
                    record.name.clone(),
                    ValueState {
                        name: record.name.clone(),
                        current: record.value_override.clone(),
                        default,
                        is_overridden: record.overridden,
                        program: Arc::clone(program),
                    },
                );
            }

            Arc::new(next)
        });

        if changed {
            log::debug!(
                "Merged version {} ({} flags, {} values)",
                version,
                flags.len(),
                values.len()
            );
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{CheckRecord, ConditionRecord, Operator, ValueConditionRecord};

    fn defaults() -> Defaults {
        Defaults::new()
            .flag("A", false)
            .flag("B", true)
            .value("limit", 10)
            .value("banner", "hello")
    }

    fn user_flag(name: &str, user_id: i64) -> FlagRecord {
        FlagRecord {
            name: name.to_string(),
            enabled: true,
            overridden: true,
            conditions: vec![ConditionRecord {
                checks: vec![CheckRecord::new(Operator::Equal, "user.id", user_id)],
            }],
        }
    }

    fn value_record(name: &str, overridden: bool, value_override: Value) -> ValueRecord {
        ValueRecord {
            name: name.to_string(),
            enabled: true,
            overridden,
            value_default: Value::from("remote-default"),
            value_override,
            conditions: vec![],
        }
    }

    fn user(id: i64) -> EvaluationContext {
        EvaluationContext::new().with("user.id", id)
    }

    #[test]
    fn test_registered_defaults() {
        let store = FlagStore::new(&defaults());
        let ctx = EvaluationContext::new();

        assert_eq!(store.version(), 0);
        assert!(!store.evaluate_flag("A", &ctx));
        assert!(store.evaluate_flag("B", &ctx));
        assert!(!store.evaluate_flag("unknown", &ctx));
        assert_eq!(store.evaluate_value("limit", &ctx), Some(Value::Int(10)));
        assert_eq!(store.evaluate_value("unknown", &ctx), None);
        assert_eq!(store.flag_names(), &["A".to_string(), "B".to_string()]);
        assert_eq!(store.value_names(), &["limit".to_string(), "banner".to_string()]);
    }

    #[test]
    fn test_merge_compiles_conditions() {
        let store = FlagStore::new(&defaults());
        assert!(store.merge(2, &[user_flag("A", 123)], &[]));

        assert_eq!(store.version(), 2);
        assert!(store.evaluate_flag("A", &user(123)));
        assert!(!store.evaluate_flag("A", &user(456)));
        assert!(!store.evaluate_flag("A", &EvaluationContext::new()));
    }

    #[test]
    fn test_merge_same_version_is_noop() {
        let store = FlagStore::new(&defaults());
        assert!(store.merge(2, &[user_flag("A", 123)], &[]));
        let before = store.snapshot();

        assert!(!store.merge(2, &[user_flag("A", 999)], &[]));
        let after = store.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(store.evaluate_flag("A", &user(123)));
        assert!(!store.evaluate_flag("A", &user(999)));
    }

    #[test]
    fn test_merge_preserves_defaults() {
        let store = FlagStore::new(&defaults());
        store.merge(
            2,
            &[FlagRecord {
                name: "B".to_string(),
                enabled: false,
                overridden: true,
                conditions: vec![],
            }],
            &[value_record("limit", true, Value::Int(50))],
        );

        let snapshot = store.snapshot();
        let b = snapshot.flag("B").unwrap();
        assert!(b.static_default);
        assert!(!snapshot.evaluate_flag("B", &EvaluationContext::new()));

        let limit = snapshot.value("limit").unwrap();
        assert_eq!(limit.default, Value::Int(10));
        assert_eq!(limit.current, Value::Int(50));
        assert!(limit.is_overridden);

        // A later merge that omits both keys leaves them alone
        store.merge(3, &[user_flag("A", 1)], &[]);
        let snapshot = store.snapshot();
        assert!(!snapshot.evaluate_flag("B", &EvaluationContext::new()));
        assert_eq!(snapshot.value("limit").unwrap().default, Value::Int(10));
        assert_eq!(
            snapshot.evaluate_value("limit", &EvaluationContext::new()),
            Some(&Value::Int(50))
        );
    }

    #[test]
    fn test_remote_stops_overriding() {
        let store = FlagStore::new(&defaults());
        store.merge(2, &[user_flag("B", 1)], &[]);
        assert!(!store.evaluate_flag("B", &EvaluationContext::new()));

        let released = FlagRecord {
            name: "B".to_string(),
            ..FlagRecord::default()
        };
        store.merge(3, &[released], &[]);
        assert!(store.snapshot().flag("B").unwrap().program.is_none());
        assert!(store.evaluate_flag("B", &EvaluationContext::new()));
    }

    #[test]
    fn test_new_keys_are_seeded_from_payload() {
        let store = FlagStore::new(&Defaults::new());
        store.merge(
            2,
            &[user_flag("fresh", 5)],
            &[value_record("new_value", false, Value::Int(123))],
        );

        let snapshot = store.snapshot();
        assert!(!snapshot.flag("fresh").unwrap().static_default);
        let value = snapshot.value("new_value").unwrap();
        assert_eq!(value.default, Value::from("remote-default"));
        assert!(!value.is_overridden);
        assert_eq!(
            snapshot.evaluate_value("new_value", &EvaluationContext::new()),
            Some(&Value::from("remote-default"))
        );
    }

    #[test]
    fn test_value_conditions_after_merge() {
        let store = FlagStore::new(&defaults());
        let tier = |name: &str, result: &str| ValueConditionRecord {
            checks: vec![CheckRecord::new(Operator::Equal, "tier", name)],
            value_override: Value::from(result),
        };
        let mut record = value_record("banner", true, Value::from("B"));
        record.conditions = vec![tier("premium", "P"), tier("gold", "G")];
        store.merge(5, &[], &[record]);

        let ctx = |t: &str| EvaluationContext::new().with("tier", t);
        assert_eq!(store.evaluate_value("banner", &ctx("gold")), Some(Value::from("G")));
        assert_eq!(store.evaluate_value("banner", &ctx("silver")), Some(Value::from("B")));
    }

    #[test]
    fn test_readers_keep_pinned_snapshot() {
        let store = FlagStore::new(&defaults());
        let pinned = store.snapshot();
        store.merge(2, &[user_flag("A", 1)], &[]);

        assert_eq!(pinned.version, 0);
        assert!(pinned.flag("A").unwrap().program.is_none());
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_concurrent_readers_during_merges() {
        let store = Arc::new(FlagStore::new(&defaults()));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let snapshot = store.snapshot();
                        // Every generation flips A on for user 1 in one step
                        let on = snapshot.evaluate_flag("A", &user(1));
                        assert_eq!(on, snapshot.version > 0);
                    }
                })
            })
            .collect();

        for version in 1..200 {
            store.merge(version, &[user_flag("A", 1)], &[]);
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
