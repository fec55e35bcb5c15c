//! Request scheduling - one request at a time, plus periodic sync.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info};

use vaultsync_common::{Error, Result};
use vaultsync_vault::Materializer;

use crate::engine::VaultSyncEngine;
use crate::request::{Request, Response};

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between periodic syncs. `None` disables them.
    pub interval_secs: Option<u64>,
    /// Requests that may wait before submitters are back-pressured.
    pub queue_depth: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: None,
            queue_depth: 100,
        }
    }
}

impl SchedulerConfig {
    /// Parse a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("Invalid scheduler config: {}", e)))
    }

    fn interval(&self) -> Option<Duration> {
        self.interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

enum Command {
    Dispatch(Request, oneshot::Sender<Response>),
    Shutdown,
}

/// Submits requests to the scheduler task.
#[derive(Clone)]
pub struct SyncScheduler {
    command_tx: mpsc::Sender<Command>,
}

impl SyncScheduler {
    /// Create a scheduler and the handle that runs it.
    pub fn new(config: &SchedulerConfig) -> (Self, SyncSchedulerHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.queue_depth.max(1));

        let scheduler = Self { command_tx };
        let handle = SyncSchedulerHandle {
            command_rx,
            period: config.interval(),
        };

        (scheduler, handle)
    }

    /// Submit a request and wait for its response.
    ///
    /// # Errors
    /// - Returns error if the scheduler task is not running
    pub async fn submit(&self, request: Request) -> Result<Response> {
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Dispatch(request, response_tx))
            .await
            .map_err(|_| Error::InvalidInput("Scheduler not running".to_string()))?;

        response_rx
            .await
            .map_err(|_| Error::InvalidInput("Scheduler stopped before responding".to_string()))
    }

    /// Request a sync.
    pub async fn request_sync(&self) -> Result<Response> {
        self.submit(Request::Sync).await
    }

    /// Stop the scheduler task after the request in progress.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown).await;
    }
}

/// Runs the scheduler loop.
pub struct SyncSchedulerHandle {
    command_rx: mpsc::Receiver<Command>,
    period: Option<Duration>,
}

impl SyncSchedulerHandle {
    /// Run the scheduler loop until shutdown.
    ///
    /// This should be spawned in a tokio task. `dispatch_fn` is never called
    /// concurrently with itself.
    pub async fn run<F, Fut>(mut self, dispatch_fn: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send,
    {
        let mut ticker = self.period.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        info!("Sync scheduler started");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(Command::Dispatch(request, response_tx)) => {
                            debug!("Processing request: {:?}", request);
                            let response = dispatch_fn(request).await;
                            let _ = response_tx.send(response);
                        }
                        Some(Command::Shutdown) | None => {
                            info!("Sync scheduler shutting down");
                            break;
                        }
                    }
                }

                _ = Self::wait_for_periodic(&mut ticker) => {
                    debug!("Triggering periodic sync");
                    match dispatch_fn(Request::Sync).await {
                        Response::Error { kind, message } => {
                            error!("Periodic sync failed ({:?}): {}", kind, message);
                        }
                        response => debug!("Periodic sync completed: {:?}", response),
                    }
                }
            }
        }
    }

    /// Run the scheduler loop against `engine`.
    pub async fn run_engine<M>(self, engine: Arc<VaultSyncEngine<M>>)
    where
        M: Materializer + 'static,
    {
        self.run(move |request| {
            let engine = engine.clone();
            async move { engine.dispatch(request).await }
        })
        .await
    }

    async fn wait_for_periodic(ticker: &mut Option<Interval>) {
        match ticker {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
