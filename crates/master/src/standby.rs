// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Standby tailer loop
//!
//! A dedicated thread that keeps a standby's state caught up with the
//! completed segments the leader writes. The stop channel doubles as the
//! poll timer, so a stop request interrupts the wait between polls.

use crate::error::MasterError;
use crate::master::Master;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tern_core::TailerConfig;
use tern_journal::{Journal, JournalError, JournalTailer};

/// Handle to a running standby loop
pub(crate) struct StandbyTailer {
    stop: Sender<()>,
    handle: JoinHandle<Option<JournalTailer>>,
    applied: Arc<AtomicU64>,
    failure: Arc<Mutex<Option<String>>>,
}

impl StandbyTailer {
    /// Spawn the loop, resuming `tailer` if given
    ///
    /// Without a tailer the loop resets the state machine and replays the
    /// journal from its checkpoint.
    pub(crate) fn spawn<M: Master>(
        master: Arc<M>,
        journal: Journal,
        tailer: Option<JournalTailer>,
        config: TailerConfig,
    ) -> Result<Self, MasterError> {
        let (stop, stop_rx) = mpsc::channel();
        let applied = Arc::new(AtomicU64::new(
            tailer.as_ref().map_or(0, JournalTailer::latest_sequence_number),
        ));
        let failure = Arc::new(Mutex::new(None));

        let name = format!("{}-standby-tailer", master.service_name());
        let standby = StandbyLoop {
            master,
            journal,
            tailer,
            config,
            stop_rx,
            applied: Arc::clone(&applied),
            failure: Arc::clone(&failure),
        };
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || standby.run())
            .map_err(MasterError::Spawn)?;

        Ok(Self {
            stop,
            handle,
            applied,
            failure,
        })
    }

    /// Highest sequence number the loop has applied
    pub(crate) fn applied_sequence(&self) -> u64 {
        self.applied.load(Ordering::Acquire)
    }

    /// The fatal error that ended the loop, if any
    pub(crate) fn failure(&self) -> Option<String> {
        self.failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Stop the loop, wait for it, and hand back its tailer if still valid
    pub(crate) fn shutdown_and_join(self) -> Option<JournalTailer> {
        // The loop may already have exited on a fatal error
        let _ = self.stop.send(());
        match self.handle.join() {
            Ok(tailer) => tailer.filter(JournalTailer::is_valid),
            Err(_) => {
                tracing::error!("standby tailer thread panicked");
                None
            }
        }
    }
}

/// Doubled retry delay, capped at `max`
pub(crate) fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

struct StandbyLoop<M: Master> {
    master: Arc<M>,
    journal: Journal,
    tailer: Option<JournalTailer>,
    config: TailerConfig,
    stop_rx: Receiver<()>,
    applied: Arc<AtomicU64>,
    failure: Arc<Mutex<Option<String>>>,
}

impl<M: Master> StandbyLoop<M> {
    fn run(mut self) -> Option<JournalTailer> {
        let service = self.master.service_name().to_string();
        tracing::info!(%service, "standby tailer started");
        let mut backoff = self.config.poll_interval;

        loop {
            let wait = match self.poll() {
                Ok(()) => {
                    backoff = self.config.poll_interval;
                    self.config.poll_interval
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(%service, error = %e, retry_in = ?backoff, "standby tailer retrying");
                    let wait = backoff;
                    backoff = next_backoff(backoff, self.config.max_backoff);
                    wait
                }
                Err(JournalError::CheckpointSuperseded {
                    checkpoint,
                    position,
                }) => {
                    tracing::info!(%service, checkpoint, position, "position superseded, replaying from checkpoint");
                    self.tailer = None;
                    Duration::ZERO
                }
                Err(e) => {
                    tracing::error!(%service, error = %e, "standby tailer stopped on fatal error");
                    *self.failure.lock().unwrap_or_else(|p| p.into_inner()) = Some(e.to_string());
                    self.tailer = None;
                    break;
                }
            };

            match self.stop_rx.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        tracing::info!(%service, applied = self.applied.load(Ordering::Acquire), "standby tailer stopped");
        self.tailer
    }

    fn poll(&mut self) -> Result<(), JournalError> {
        if self.tailer.is_none() {
            self.tailer = Some(self.replay_checkpoint()?);
        }
        let Some(tailer) = self.tailer.as_mut() else {
            return Ok(());
        };
        tailer.process_next_journal_log_files()?;
        self.applied
            .store(tailer.latest_sequence_number(), Ordering::Release);
        Ok(())
    }

    /// A fresh tailer positioned after the newest checkpoint
    fn replay_checkpoint(&self) -> Result<JournalTailer, JournalError> {
        self.master.reset_state();
        let mut tailer = JournalTailer::new(self.master.clone(), self.journal.clone());
        if tailer.checkpoint_exists()? {
            tailer.process_journal_checkpoint(true)?;
        }
        Ok(tailer)
    }
}

#[cfg(test)]
#[path = "standby_tests.rs"]
mod tests;
