//! Periodic re-synchronisation of one monitored root.
//!
//! A [`Monitor`] owns the root node of one configured directory. Creating it
//! runs a full clean and fills the content cache, so the root is consistent
//! before the server starts. [`Monitor::start`] spawns the periodic loop and
//! [`Monitor::stop`] cancels it and waits for it to exit.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::cache::ContentCache;
use super::object::FilesystemObject;
use crate::error::FsError;
use crate::metrics::Metrics;

/// Default time between two passes.
pub const UPDATE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Created,
    Running,
    Stopped,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonitorState::Created => "created",
            MonitorState::Running => "running",
            MonitorState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("cannot {action} a monitor that is {from}")]
    InvalidTransition { from: MonitorState, action: &'static str },

    #[error("monitor interval must be greater than zero")]
    ZeroInterval,

    #[error("monitor task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub struct Monitor {
    root: Arc<FilesystemObject>,
    interval: Duration,
    cache: Arc<ContentCache>,
    metrics: Metrics,
    state: MonitorState,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Stat `path` as a root, clean it and push its files into the cache.
    pub async fn new(
        path: impl Into<PathBuf>,
        interval: Duration,
        cache: Arc<ContentCache>,
        metrics: Metrics,
    ) -> Result<Self, MonitorError> {
        if interval.is_zero() {
            return Err(MonitorError::ZeroInterval);
        }
        let path = path.into();
        let cache_cl = cache.clone();
        let root = tokio::task::spawn_blocking(move || -> Result<_, FsError> {
            let root = FilesystemObject::from_path(&path, true)?;
            // Clean implies a scan.
            root.clean(&cache_cl)?;
            let files = cache_cl.sync_tree(&root);
            tracing::info!(root = %root.path.display(), files, "initial pass done");
            Ok(root)
        })
        .await??;
        metrics.inc_clean_passes();

        Ok(Self {
            root,
            interval,
            cache,
            metrics,
            state: MonitorState::Created,
            cancel: CancellationToken::new(),
            task: None,
        })
    }

    pub fn root(&self) -> &Arc<FilesystemObject> {
        &self.root
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Spawn the periodic loop on the current tokio runtime.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.state != MonitorState::Created {
            return Err(MonitorError::InvalidTransition { from: self.state, action: "start" });
        }
        let root = self.root.clone();
        let cache = self.cache.clone();
        let metrics = self.metrics.clone();
        let cancel = self.cancel.clone();
        let interval = self.interval;
        self.task = Some(tokio::spawn(run(root, interval, cache, metrics, cancel)));
        self.state = MonitorState::Running;
        tracing::info!(root = %self.root.path.display(), ?interval, "monitor started");
        Ok(())
    }

    /// Cancel the loop and wait until it has exited. A pass in progress runs
    /// to completion first.
    pub async fn stop(&mut self) -> Result<(), MonitorError> {
        if self.state != MonitorState::Running {
            return Err(MonitorError::InvalidTransition { from: self.state, action: "stop" });
        }
        self.cancel.cancel();
        self.state = MonitorState::Stopped;
        if let Some(task) = self.task.take() {
            task.await?;
        }
        tracing::info!(root = %self.root.path.display(), "monitor stopped");
        Ok(())
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    root: Arc<FilesystemObject>,
    interval: Duration,
    cache: Arc<ContentCache>,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    // The constructor already did the first pass.
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => tick(&root, &cache, &metrics).await,
        }
    }
}

async fn tick(root: &Arc<FilesystemObject>, cache: &Arc<ContentCache>, metrics: &Metrics) {
    let root_cl = root.clone();
    let cache_cl = cache.clone();
    let res = tokio::task::spawn_blocking(move || -> Result<usize, FsError> {
        root_cl.clean(&cache_cl)?;
        Ok(cache_cl.sync_tree(&root_cl))
    })
    .await;

    match res {
        Ok(Ok(files)) => {
            metrics.inc_clean_passes();
            tracing::debug!(root = %root.path.display(), files, "periodic clean done");
        }
        Ok(Err(e)) => {
            metrics.inc_clean_failures();
            tracing::error!(root = %root.path.display(), error = %e, "error doing periodic clean");
        }
        Err(e) => {
            metrics.inc_clean_failures();
            tracing::error!(root = %root.path.display(), error = %e, "periodic clean task failed");
        }
    }
}
