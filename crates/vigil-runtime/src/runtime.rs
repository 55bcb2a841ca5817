use crate::config::RuntimeConfig;
use crate::rule_seed;
use crate::scheduler::EvaluationScheduler;
use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use vigil_alert::{AlertManager, MetricSource};

/// Owns the alert manager and the background evaluation loop.
///
/// Dropping the runtime closes the shutdown channel, which also stops the
/// loop; [`AlertRuntime::shutdown`] additionally waits for it to finish.
pub struct AlertRuntime {
    manager: Arc<AlertManager>,
    shutdown_tx: broadcast::Sender<()>,
    scheduler_task: Mutex<Option<JoinHandle<()>>>,
    shutdown_initiated: AtomicBool,
}

impl AlertRuntime {
    /// Build the manager, load rules as configured and spawn the evaluation
    /// loop. Must be called from within a tokio runtime.
    pub async fn start(config: RuntimeConfig, source: Arc<dyn MetricSource>) -> anyhow::Result<Self> {
        crate::logging::init_tracing(config.logging.filter.as_deref(), config.logging.json)?;
        vigil_common::id::init(1, 1);

        let manager = Arc::new(AlertManager::new(config.alerts.max_alerts));

        if config.rules.install_defaults {
            manager
                .install_default_rules()
                .context("Failed to install default alert rules")?;
        }
        if let Some(path) = config.rules.seed_file.as_deref() {
            let (created, skipped) = rule_seed::load_rules(&manager, path)?;
            tracing::info!(path, created, skipped, "Alert rules seeded");
        }

        let (shutdown_tx, _) = broadcast::channel(1);
        let scheduler_task = if config.evaluation.enabled {
            let scheduler =
                EvaluationScheduler::new(manager.clone(), source, config.evaluation.tick_secs);
            Some(tokio::spawn(scheduler.run(shutdown_tx.subscribe())))
        } else {
            tracing::info!("Alert evaluation loop disabled");
            None
        };

        tracing::info!(
            rules = manager.all_rules().len(),
            max_alerts = config.alerts.max_alerts,
            "Alert runtime started"
        );

        Ok(Self {
            manager,
            shutdown_tx,
            scheduler_task: Mutex::new(scheduler_task),
            shutdown_initiated: AtomicBool::new(false),
        })
    }

    pub fn manager(&self) -> Arc<AlertManager> {
        self.manager.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Stop the evaluation loop and wait for it. Safe to call more than once;
    /// only the first call does anything.
    pub async fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Alert runtime shutdown already in progress");
            return;
        }

        tracing::info!("Shutting down alert runtime");
        // No receivers left means the loop already exited.
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.scheduler_task.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Alert evaluation task panicked");
            }
        }
        tracing::info!("Alert runtime stopped");
    }
}
