// SPDX-License-Identifier: MIT

//! Feature flags client
//!
//! Creating a client registers every declared key, performs the initial load
//! and starts the background sync task. Reads never wait on the network.

use std::sync::Arc;
use tokio::task::JoinHandle;

use super::config::ClientConfig;
use super::sync::Synchronizer;
use super::transport::{HttpTransport, Transport};
use crate::engine::error::Result;
use crate::engine::state::{Defaults, FlagStore, Snapshot};
use crate::engine::value::{EvaluationContext, Value};

pub struct FeatureFlags {
    pub(crate) store: Arc<FlagStore>,
    syncer: Arc<Synchronizer>,
    sync_task: Option<JoinHandle<()>>,
}

impl FeatureFlags {
    /// Connect over HTTP using `config`.
    ///
    /// Fails if the configuration is invalid or the initial load does not
    /// succeed; no background task is left running in that case.
    pub async fn connect(config: ClientConfig, defaults: Defaults) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.base_url, config.effective_request_timeout())?;
        Self::with_transport(config, defaults, Arc::new(transport)).await
    }

    /// Same as [`connect`](Self::connect) with a caller-supplied transport
    pub async fn with_transport(
        config: ClientConfig,
        defaults: Defaults,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let store = Arc::new(FlagStore::new(&defaults));
        let syncer = Arc::new(Synchronizer::new(
            Arc::clone(&store),
            transport,
            config.project.clone(),
            config.variables.clone(),
        ));

        syncer.load().await?;
        log::info!(
            "Loaded flags for project {} at version {}",
            config.project,
            store.version()
        );

        let sync_task = Some(Arc::clone(&syncer).spawn(config.effective_sync_interval()));
        Ok(Self {
            store,
            syncer,
            sync_task,
        })
    }

    /// Evaluate a flag. Undeclared flags are off.
    pub fn get(&self, name: &str, ctx: &EvaluationContext) -> bool {
        self.store.evaluate_flag(name, ctx)
    }

    /// Evaluate a value; `None` when the value is unknown.
    pub fn value(&self, name: &str, ctx: &EvaluationContext) -> Option<Value> {
        self.store.evaluate_value(name, ctx)
    }

    pub fn version(&self) -> u64 {
        self.store.version()
    }

    /// Pin the current generation for several consistent reads
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    /// Re-run the load exchange now
    pub async fn load(&self) -> Result<bool> {
        self.syncer.load().await
    }

    /// Sync now instead of waiting for the next tick
    pub async fn sync(&self) -> Result<bool> {
        self.syncer.sync().await
    }
}

impl Drop for FeatureFlags {
    fn drop(&mut self) {
        if let Some(task) = self.sync_task.take() {
            task.abort();
        }
    }
}
