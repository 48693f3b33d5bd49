//! Provisioning service facade
//!
//! Wires the whole pipeline together: reads the config directory, builds
//! one engine per source, runs an initial pass, and keeps each source
//! polling on its own task until shutdown.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use panel_config::{ConfigReader, OrgLookup};

use crate::scheduler::Scheduler;
use crate::store::ElementStore;
use crate::sync::SyncEngine;
use crate::Result;

/// Owns the engines and scheduler tasks for every configured source.
pub struct ElementProvisioner {
    engines: Vec<Arc<SyncEngine>>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ElementProvisioner {
    /// Build engines for every source defined under `config_dir`.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration: unparseable files, duplicate source
    /// names, unknown organizations, or conflicting folder options.
    pub async fn from_config_dir(
        config_dir: &Path,
        store: Arc<dyn ElementStore>,
        orgs: &dyn OrgLookup,
    ) -> Result<Self> {
        let sources = ConfigReader::new(config_dir).read_config(orgs).await?;

        let engines = sources
            .into_iter()
            .map(|cfg| SyncEngine::new(cfg, store.clone()).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            engines,
            shutdown,
            tasks: Vec::new(),
        })
    }

    /// Run one reconciliation pass for every source.
    ///
    /// A failed pass is logged and skipped; it is no different from a
    /// failed scheduled scan, which the source's next tick retries.
    pub async fn provision(&self) {
        for engine in &self.engines {
            if let Err(error) = engine.reconcile().await {
                tracing::error!(
                    source = %engine.config().name,
                    %error,
                    "initial element provisioning pass failed"
                );
            }
        }
    }

    /// Spawn one polling task per source.
    pub fn start(&mut self) {
        for engine in &self.engines {
            let scheduler = Scheduler::new(engine.clone());
            let receiver = self.shutdown.subscribe();
            self.tasks.push(tokio::spawn(scheduler.run(receiver)));
        }
    }

    /// Stop all polling tasks and wait for them to finish. Scans already
    /// in flight complete; only future ticks are suppressed.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }

    pub fn engines(&self) -> &[Arc<SyncEngine>] {
        &self.engines
    }
}
