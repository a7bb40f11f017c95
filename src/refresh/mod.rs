//! Manual and periodic data refresh
//!
//! The controller is a two-state machine (auto refresh off or on). Fetches run as spawned
//! tasks and report back through the event channel; results are applied on the event loop
//! in issue order, and anything older than the newest applied cycle is discarded.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::events::Event;
use crate::core::state::{NotificationLevel, RefreshStatus, StateStore};
use crate::integrations::api::{ApiError, SnapshotSummary, SystemReport};
use crate::integrations::MetricsSource;
use crate::viz::context::GraphicsError;
use crate::viz::Visualization;

/// Outcome of an enable/disable request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
    Unchanged,
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied,
    Failed,
    Stale,
}

/// Everything one refresh cycle fetched
#[derive(Debug)]
pub struct CycleResult {
    pub seq: u64,
    pub system: Result<SystemReport, ApiError>,
    pub snapshots: Result<Vec<SnapshotSummary>, ApiError>,
}

pub struct RefreshController {
    interval: Duration,
    timer: Option<JoinHandle<()>>,
    issued: u64,
    applied: u64,
}

impl RefreshController {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: None,
            issued: 0,
            applied: 0,
        }
    }

    pub fn is_auto(&self) -> bool {
        self.timer.is_some()
    }

    /// Turn auto refresh on. The first periodic tick arrives one interval from now; the
    /// caller triggers the immediate refresh when this returns [`Transition::Started`].
    pub fn enable(&mut self, tx: &mpsc::UnboundedSender<Event>) -> Transition {
        if self.timer.is_some() {
            return Transition::Unchanged;
        }

        let period = self.interval;
        let tx = tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(Event::RefreshTick).is_err() {
                    break;
                }
            }
        });

        self.timer = Some(handle);
        tracing::info!(interval_secs = period.as_secs_f64(), "auto refresh enabled");
        Transition::Started
    }

    /// Turn auto refresh off. In-flight fetches still complete and apply.
    pub fn disable(&mut self) -> Transition {
        match self.timer.take() {
            Some(handle) => {
                handle.abort();
                tracing::info!("auto refresh disabled");
                Transition::Stopped
            }
            None => Transition::Unchanged,
        }
    }

    pub fn toggle(&mut self, tx: &mpsc::UnboundedSender<Event>) -> Transition {
        if self.is_auto() {
            self.disable()
        } else {
            self.enable(tx)
        }
    }

    /// Reserve the sequence number for a new cycle.
    pub fn begin_cycle(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Apply a finished cycle. Transport failures leave the scene untouched; graphics
    /// failures are returned to the caller.
    pub fn complete(
        &mut self,
        result: CycleResult,
        viz: &mut Visualization,
        state: &StateStore,
    ) -> Result<CycleOutcome, GraphicsError> {
        if result.seq <= self.applied {
            tracing::debug!(seq = result.seq, applied = self.applied, "dropping stale refresh");
            return Ok(CycleOutcome::Stale);
        }

        let report = match result.system {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(seq = result.seq, "refresh failed: {err}");
                state.update(|s| s.status = RefreshStatus::Error(err.to_string()));
                return Ok(CycleOutcome::Failed);
            }
        };

        viz.update_rings(&report.disks)?;
        self.applied = result.seq;
        tracing::debug!(seq = result.seq, volumes = report.disks.len(), "refresh applied");

        state.update(|s| {
            s.apply_report(report);
            match result.snapshots {
                Ok(snapshots) => s.snapshots = snapshots,
                Err(err) => {
                    tracing::warn!("snapshot list unavailable: {err}");
                    s.add_notification(
                        format!("Snapshot list unavailable: {err}"),
                        NotificationLevel::Warning,
                    );
                }
            }
        });
        Ok(CycleOutcome::Applied)
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        self.disable();
    }
}

/// Fetch the report and snapshot list concurrently.
pub async fn run_cycle(source: Arc<dyn MetricsSource>, seq: u64, snapshot_limit: usize) -> CycleResult {
    let (system, snapshots) = tokio::join!(source.system(), source.snapshots(snapshot_limit));
    CycleResult {
        seq,
        system,
        snapshots,
    }
}

/// Run a cycle in the background and post its result to the event loop.
pub fn spawn_cycle(
    source: Arc<dyn MetricsSource>,
    seq: u64,
    snapshot_limit: usize,
    tx: mpsc::UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        let result = run_cycle(source, seq, snapshot_limit).await;
        let _ = tx.send(Event::CycleCompleted(result));
    });
}
