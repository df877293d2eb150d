// SPDX-License-Identifier: MIT

//! Sync coordinator: the only writer of the flag store
//!
//! Network round-trips happen without holding anything; only the in-memory
//! merge publishes a new snapshot.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::transport::Transport;
use super::types::{LoadRequest, SyncRequest, ValueInput};
use crate::engine::error::{FlagsError, Result};
use crate::engine::state::FlagStore;
use crate::engine::types::Variable;

pub struct Synchronizer {
    store: Arc<FlagStore>,
    transport: Arc<dyn Transport>,
    project: String,
    variables: Vec<Variable>,
}

impl Synchronizer {
    pub fn new(
        store: Arc<FlagStore>,
        transport: Arc<dyn Transport>,
        project: String,
        variables: Vec<Variable>,
    ) -> Self {
        Self {
            store,
            transport,
            project,
            variables,
        }
    }

    /// Register the project and declared keys, then merge the answer.
    /// Returns whether the store moved to a new version.
    pub async fn load(&self) -> Result<bool> {
        let snapshot = self.store.snapshot();
        let values = self
            .store
            .value_names()
            .iter()
            .filter_map(|name| snapshot.value(name))
            .map(|state| ValueInput {
                name: state.name.clone(),
                value: state.current.clone(),
            })
            .collect();

        let request = LoadRequest {
            project: self.project.clone(),
            version: snapshot.version,
            variables: self.variables.clone(),
            flags: self.store.flag_names().to_vec(),
            values,
        };

        let state = self
            .transport
            .load(&request)
            .await
            .map_err(FlagsError::Load)?;
        Ok(self.store.merge(state.version, &state.flags, &state.values))
    }

    /// Fetch the current definitions of every declared key and merge them.
    pub async fn sync(&self) -> Result<bool> {
        let request = SyncRequest {
            project: self.project.clone(),
            version: self.store.version(),
            flags: self.store.flag_names().to_vec(),
            values: self.store.value_names().to_vec(),
        };

        let state = self
            .transport
            .sync(&request)
            .await
            .map_err(FlagsError::Sync)?;
        Ok(self.store.merge(state.version, &state.flags, &state.values))
    }

    /// Sync forever at a fixed interval. Failures are logged and retried on
    /// the next tick; the previous state stays in place meanwhile.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;
            match self.sync().await {
                Ok(true) => log::info!(
                    "Flags have been synced to version {}",
                    self.store.version()
                ),
                Ok(false) => log::debug!("Flags already at version {}", self.store.version()),
                Err(e) => log::warn!("Could not sync flags: {}", e),
            }
        }
    }

    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(self.run(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::types::RemoteState;
    use crate::engine::error::TransportError;
    use crate::engine::state::Defaults;
    use crate::engine::types::FlagRecord;
    use crate::engine::value::{EvaluationContext, Value};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted answers and records what it was asked
    struct ScriptedTransport {
        answers: Mutex<Vec<std::result::Result<RemoteState, TransportError>>>,
        loads: Mutex<Vec<LoadRequest>>,
        syncs: Mutex<Vec<SyncRequest>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(answers: Vec<std::result::Result<RemoteState, TransportError>>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().rev().collect()),
                loads: Mutex::new(vec![]),
                syncs: Mutex::new(vec![]),
                calls: AtomicUsize::new(0),
            }
        }

        fn next(&self) -> std::result::Result<RemoteState, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::other("script exhausted")))
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn load(
            &self,
            request: &LoadRequest,
        ) -> std::result::Result<RemoteState, TransportError> {
            self.loads.lock().unwrap().push(request.clone());
            self.next()
        }

        async fn sync(
            &self,
            request: &SyncRequest,
        ) -> std::result::Result<RemoteState, TransportError> {
            self.syncs.lock().unwrap().push(request.clone());
            self.next()
        }
    }

    fn enabled_flag(name: &str) -> FlagRecord {
        FlagRecord {
            name: name.to_string(),
            enabled: true,
            overridden: true,
            conditions: vec![],
        }
    }

    fn remote(version: u64, flags: Vec<FlagRecord>) -> RemoteState {
        RemoteState {
            version,
            flags,
            values: vec![],
        }
    }

    fn setup(
        answers: Vec<std::result::Result<RemoteState, TransportError>>,
    ) -> (Arc<FlagStore>, Arc<ScriptedTransport>, Arc<Synchronizer>) {
        let defaults = Defaults::new().flag("A", false).value("limit", 10);
        let store = Arc::new(FlagStore::new(&defaults));
        let transport = Arc::new(ScriptedTransport::new(answers));
        let syncer = Arc::new(Synchronizer::new(
            Arc::clone(&store),
            transport.clone(),
            "test.test".to_string(),
            vec![],
        ));
        (store, transport, syncer)
    }

    #[tokio::test]
    async fn test_load_sends_declarations() {
        let (store, transport, syncer) = setup(vec![Ok(remote(1, vec![enabled_flag("A")]))]);

        assert!(syncer.load().await.unwrap());
        assert!(store.evaluate_flag("A", &EvaluationContext::new()));

        let loads = transport.loads.lock().unwrap();
        assert_eq!(loads[0].project, "test.test");
        assert_eq!(loads[0].version, 0);
        assert_eq!(loads[0].flags, vec!["A".to_string()]);
        assert_eq!(loads[0].values[0].name, "limit");
        assert_eq!(loads[0].values[0].value, Value::Int(10));
    }

    #[tokio::test]
    async fn test_sync_sends_current_version() {
        let (store, transport, syncer) = setup(vec![
            Ok(remote(4, vec![])),
            Ok(remote(4, vec![enabled_flag("A")])),
        ]);

        assert!(syncer.sync().await.unwrap());
        // Same version again: nothing changes even though the payload differs
        assert!(!syncer.sync().await.unwrap());
        assert!(!store.evaluate_flag("A", &EvaluationContext::new()));

        let syncs = transport.syncs.lock().unwrap();
        assert_eq!(syncs[0].version, 0);
        assert_eq!(syncs[1].version, 4);
        assert_eq!(syncs[1].values, vec!["limit".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_keeps_state() {
        let (store, _transport, syncer) = setup(vec![
            Ok(remote(2, vec![enabled_flag("A")])),
            Err(TransportError::Status {
                url: "http://flags/flags/sync".to_string(),
                status: 500,
            }),
        ]);

        syncer.sync().await.unwrap();
        let err = syncer.sync().await.unwrap_err();
        assert!(matches!(err, FlagsError::Sync(TransportError::Status { status: 500, .. })));
        assert_eq!(store.version(), 2);
        assert!(store.evaluate_flag("A", &EvaluationContext::new()));
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let (store, _transport, syncer) = setup(vec![Err(TransportError::other("offline"))]);
        let err = syncer.load().await.unwrap_err();
        assert!(matches!(err, FlagsError::Load(_)));
        assert_eq!(store.version(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_keeps_going_after_failures() {
        let (store, transport, syncer) = setup(vec![
            Err(TransportError::other("offline")),
            Err(TransportError::other("still offline")),
            Ok(remote(3, vec![enabled_flag("A")])),
        ]);

        let handle = syncer.spawn(Duration::from_secs(10));
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_secs(10)).await;
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(transport.calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(store.version(), 3);
        handle.abort();
    }
}
