//! Background forecast refresh
//!
//! Runs fetch-and-transform cycles on a fixed interval and reports each outcome
//! over a tokio channel. The latest snapshot lives in an owned [`ForecastState`]
//! shared with the caller, so independent forecast instances can coexist.
//!
//! A tick that arrives while the previous cycle is still running is skipped.
//! Shutting down stops new cycles from starting; a cycle already in flight
//! runs to completion and still publishes its result.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::ForecastError;
use crate::pv::ForecastSnapshot;

/// Something that can produce a fresh snapshot, e.g. a provider client
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch_snapshot(
        &self,
    ) -> impl Future<Output = Result<ForecastSnapshot, ForecastError>> + Send;
}

/// Messages sent from the refresh task to its owner
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A fetch cycle started
    CycleStarted,
    /// A cycle produced a new snapshot
    SnapshotUpdated(Arc<ForecastSnapshot>),
    /// A cycle failed; the previous snapshot is kept
    CycleFailed(Arc<ForecastError>),
    /// A tick was dropped because the previous cycle was still running
    CycleSkipped,
}

/// Configuration for the refresh interval
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between cycle starts
    pub interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600), // 1 hour
            enabled: true,
        }
    }
}

impl RefreshConfig {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            enabled: !interval.is_zero(),
        }
    }
}

/// Single-slot holder of the most recent snapshot
#[derive(Debug, Default)]
pub struct ForecastState {
    last: RwLock<Option<Arc<ForecastSnapshot>>>,
}

impl ForecastState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently stored snapshot, if any
    pub fn latest(&self) -> Option<Arc<ForecastSnapshot>> {
        self.last.read().ok().and_then(|slot| slot.clone())
    }

    /// Replace the stored snapshot wholesale
    pub fn store(&self, snapshot: Arc<ForecastSnapshot>) {
        if let Ok(mut slot) = self.last.write() {
            *slot = Some(snapshot);
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Signals the scheduling loop to stop
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the refresh task; must be called inside a tokio runtime
    ///
    /// The first cycle starts immediately, then one per interval.
    ///
    /// # Arguments
    /// * `config` - refresh interval settings
    /// * `source` - where snapshots come from
    /// * `state` - slot updated by every successful cycle
    pub fn spawn<S: SnapshotSource>(
        config: RefreshConfig,
        source: Arc<S>,
        state: Arc<ForecastState>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled && !config.interval.is_zero() {
            let period = config.interval;
            let tx = msg_tx.clone();
            info!(interval_secs = period.as_secs_f64(), "starting forecast refresh");

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                let in_flight = Arc::new(AtomicBool::new(false));

                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.recv() => {
                            info!("forecast refresh stopped");
                            break;
                        }
                        _ = interval.tick() => {
                            if in_flight.swap(true, Ordering::AcqRel) {
                                debug!("previous forecast cycle still running, skipping tick");
                                notify(&tx, RefreshMessage::CycleSkipped);
                                continue;
                            }

                            let tx = tx.clone();
                            let source = Arc::clone(&source);
                            let state = Arc::clone(&state);
                            let in_flight = Arc::clone(&in_flight);
                            tokio::spawn(async move {
                                run_cycle(source.as_ref(), &state, &tx).await;
                                in_flight.store(false, Ordering::Release);
                            });
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Stops new cycles from starting; an in-flight cycle still completes
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.try_send(());
    }

    /// Waits for the next message; `None` once the task and all cycles are done
    pub async fn recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Checks for a pending message without blocking
    pub fn try_recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.try_recv().ok()
    }
}

/// One fetch-and-transform cycle
///
/// Status messages are dropped when the channel is full; the fetch and the
/// state update never wait on the receiver.
async fn run_cycle<S: SnapshotSource>(
    source: &S,
    state: &ForecastState,
    tx: &mpsc::Sender<RefreshMessage>,
) {
    notify(tx, RefreshMessage::CycleStarted);

    match source.fetch_snapshot().await {
        Ok(snapshot) => {
            let snapshot = Arc::new(snapshot);
            info!(
                location = %snapshot.location.label,
                days = snapshot.days().len(),
                today_average = snapshot.today_average_generation_percent(),
                "forecast snapshot updated"
            );
            state.store(Arc::clone(&snapshot));
            notify(tx, RefreshMessage::SnapshotUpdated(snapshot));
        }
        Err(e) => {
            warn!(error = %e, "forecast cycle failed");
            notify(tx, RefreshMessage::CycleFailed(Arc::new(e)));
        }
    }
}

/// Send without waiting; a full or closed channel drops the message
fn notify(tx: &mpsc::Sender<RefreshMessage>, message: RefreshMessage) {
    if let Err(mpsc::error::TrySendError::Full(message)) = tx.try_send(message) {
        debug!(?message, "refresh channel full, dropping message");
    }
}
