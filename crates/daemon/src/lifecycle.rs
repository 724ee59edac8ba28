// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, promotion, shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use tern_core::{ConfigError, SystemClock, TernConfig};
use tern_journal::{JournalError, ReadWriteJournal};
use tern_master::{MasterError, MasterJournal, MasterState, NamespaceMaster};
use thiserror::Error;
use tracing::{info, warn};

pub type DaemonMaster = NamespaceMaster<SystemClock>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Master configuration loaded from the TOML file
    pub tern: TernConfig,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
}

impl Config {
    /// Load the master configuration and derive the state paths for it
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let tern = TernConfig::load(path)?;
        let state_dir = state_dir(&tern.service_name)?;
        Ok(Self::in_state_dir(tern, &state_dir))
    }

    pub fn in_state_dir(tern: TernConfig, state_dir: &Path) -> Self {
        Self {
            tern,
            lock_path: state_dir.join("ternd.pid"),
            log_path: state_dir.join("ternd.log"),
        }
    }
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub master: Arc<DaemonMaster>,
    pub start_time: Instant,
}

impl DaemonState {
    /// Promote the master to leader
    ///
    /// A failed promotion leaves the master in standby; the daemon keeps
    /// running so a later signal can retry.
    pub async fn promote(&self) -> Result<(), LifecycleError> {
        let master = Arc::clone(&self.master);
        tokio::task::spawn_blocking(move || master.start(true)).await??;
        info!(service = %self.master.service_name(), "now leading");
        Ok(())
    }

    pub fn master_state(&self) -> MasterState {
        self.master.state()
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Stop the master: closes the writer or joins the standby loop
        let master = Arc::clone(&self.master);
        tokio::task::spawn_blocking(move || master.stop()).await??;

        // 2. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 3. Lock file is released automatically when self.lock_file is dropped

        info!(uptime = ?self.start_time.elapsed(), "Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Master error: {0}")]
    Master(#[from] MasterError),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config, leader: bool) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config, leader).await {
        Ok(state) => Ok(state),
        // The lock and PID file belong to the daemon already running
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config, leader: bool) -> Result<DaemonState, LifecycleError> {
    // 1. Create state directory
    if let Some(parent) = config.lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire lock file FIRST - prevents two daemons for one service
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Open the journal read-write so the master can be promoted later
    let journal = ReadWriteJournal::open(&config.tern.journal)?;
    let master = Arc::new(NamespaceMaster::new(
        config.tern.service_name.clone(),
        MasterJournal::ReadWrite(journal),
        config.tern.tailer.clone(),
        SystemClock,
    ));

    // 4. Start as standby; as leader only when asked
    let starting = Arc::clone(&master);
    tokio::task::spawn_blocking(move || starting.start(leader)).await??;

    info!(
        service = %config.tern.service_name,
        journal = %config.tern.journal.dir.display(),
        state = %master.state(),
        "Daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        master,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Get the state directory for one service
fn state_dir(service_name: &str) -> Result<PathBuf, LifecycleError> {
    state_dir_from(
        std::env::var("XDG_STATE_HOME").ok().as_deref(),
        std::env::var("HOME").ok().as_deref(),
        service_name,
    )
}

/// Use XDG_STATE_HOME or default to ~/.local/state
fn state_dir_from(
    xdg_state_home: Option<&str>,
    home: Option<&str>,
    service_name: &str,
) -> Result<PathBuf, LifecycleError> {
    if let Some(xdg) = xdg_state_home.filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(xdg).join("tern").join(service_name));
    }

    let home = home.ok_or(LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home)
        .join(".local/state/tern")
        .join(service_name))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
