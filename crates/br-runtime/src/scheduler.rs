//! # Sync Scheduler
//!
//! Drives the sync engine in one process:
//!
//! - at startup, a pass if the cache is missing or structurally incomplete
//! - a pass every `sync_interval`
//! - a pass per explicit trigger (`setAuth`, `clearCache`)
//!
//! Passes never overlap inside the scheduler. Triggers that arrive while a
//! pass runs collapse into exactly one follow-up pass. Other processes are
//! kept out by the engine's lease, not by the scheduler.

use std::sync::Arc;

use br_03_sync_engine::{SyncEngineApi, SyncOutcome};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;

/// Handle that queues a sync pass on the scheduler.
#[derive(Clone, Debug)]
pub struct SyncTrigger {
    tx: mpsc::Sender<()>,
}

impl SyncTrigger {
    /// Queue a pass. Returns false if no scheduler is listening.
    pub fn fire(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                debug!("Sync already queued");
                true
            }
            Err(TrySendError::Closed(())) => {
                warn!("No scheduler listening, sync not queued");
                false
            }
        }
    }

    /// A trigger and the receiving end it feeds.
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }

    /// A trigger with no scheduler behind it.
    pub fn detached() -> Self {
        Self::channel().0
    }
}

/// Periodic and on-demand sync driver.
pub struct Scheduler {
    engine: Arc<dyn SyncEngineApi>,
    config: SchedulerConfig,
    triggers: mpsc::Receiver<()>,
}

impl Scheduler {
    pub fn new(engine: Arc<dyn SyncEngineApi>, config: SchedulerConfig) -> (Self, SyncTrigger) {
        let (trigger, triggers) = SyncTrigger::channel();
        let scheduler = Self {
            engine,
            config,
            triggers,
        };
        (scheduler, trigger)
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    ///
    /// A pass in progress when shutdown is signalled runs to the end.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.config.sync_interval();
        info!(interval_secs = interval.as_secs(), "Sync scheduler started");

        if self.config.sync_on_startup && !*shutdown.borrow() {
            self.startup_check().await;
        }

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.absorb_queued();
                    run_pass(self.engine.as_ref(), "interval").await;
                }
                Some(()) = self.triggers.recv() => {
                    self.absorb_queued();
                    run_pass(self.engine.as_ref(), "trigger").await;
                }
            }
        }

        info!("Sync scheduler stopped");
    }

    /// Drop triggers queued before a pass starts; that pass serves them.
    ///
    /// Triggers fired while the pass runs stay queued and start one
    /// follow-up pass.
    fn absorb_queued(&mut self) {
        while self.triggers.try_recv().is_ok() {}
    }

    async fn startup_check(&mut self) {
        match self.engine.needs_initial_sync() {
            Ok(true) => {
                info!("Cache missing or incomplete, syncing now");
                self.absorb_queued();
                run_pass(self.engine.as_ref(), "startup").await;
            }
            Ok(false) => debug!("Cache present, waiting for the next interval"),
            Err(e) => warn!(error = %e, "Could not inspect cache at startup"),
        }
    }
}

async fn run_pass(engine: &dyn SyncEngineApi, reason: &'static str) {
    debug!(reason, "Starting sync pass");
    match engine.run_sync().await {
        Ok(SyncOutcome::Completed(report)) => info!(
            reason,
            follows = report.total_follows,
            synced = report.synced_follows,
            errors = report.errors.len(),
            elapsed_ms = report.elapsed_ms,
            "Sync pass finished"
        ),
        Ok(SyncOutcome::Skipped(skip)) => debug!(reason, ?skip, "Sync pass skipped"),
        Err(e) => error!(reason, error = %e, "Sync pass failed"),
    }
}
