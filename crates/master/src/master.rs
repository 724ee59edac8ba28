// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master lifecycle
//!
//! [`MasterBase`] drives any [`Master`] state machine through
//! `UNINITIALIZED -> STANDBY -> LEADER`. It owns the journal handle, the
//! standby tailer loop, and while leading, the journal writer.
//!
//! Lock order is lifecycle, then writer. Leader mutations only take the
//! writer lock, which serializes them.

use crate::error::MasterError;
use crate::standby::StandbyTailer;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tern_core::TailerConfig;
use tern_journal::{
    CheckpointOutputStream, Journal, JournalError, JournalStateMachine, JournalTailer,
    JournalWriter, ReadWriteJournal,
};

/// A state machine that can be driven by [`MasterBase`]
pub trait Master: JournalStateMachine + 'static {
    /// Name used for logging and thread names
    fn service_name(&self) -> &str;

    /// Write the full current state as checkpoint entries
    fn stream_to_journal_checkpoint(
        &self,
        out: &mut CheckpointOutputStream<'_>,
    ) -> Result<(), JournalError>;
}

/// The journal handle a master holds
#[derive(Debug, Clone)]
pub enum MasterJournal {
    /// Can only tail; promotion fails
    ReadOnly(Journal),
    /// Can take the writer lock when promoted
    ReadWrite(ReadWriteJournal),
}

impl MasterJournal {
    pub fn journal(&self) -> &Journal {
        match self {
            MasterJournal::ReadOnly(journal) => journal,
            MasterJournal::ReadWrite(journal) => journal.journal(),
        }
    }

    pub fn is_read_write(&self) -> bool {
        matches!(self, MasterJournal::ReadWrite(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    Uninitialized,
    Standby,
    Leader,
}

impl fmt::Display for MasterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MasterState::Uninitialized => "UNINITIALIZED",
            MasterState::Standby => "STANDBY",
            MasterState::Leader => "LEADER",
        };
        f.write_str(name)
    }
}

enum WriterSlot {
    Closed,
    Open(JournalWriter),
    /// A durable write failed; the writer was discarded
    Failed,
}

struct Lifecycle {
    state: MasterState,
    journal: MasterJournal,
    standby: Option<StandbyTailer>,
    /// Tailer left behind by a stopped standby loop, resumed on restart
    parked: Option<JournalTailer>,
}

pub struct MasterBase<M: Master> {
    master: Arc<M>,
    tailer_config: TailerConfig,
    lifecycle: Mutex<Lifecycle>,
    writer: Mutex<WriterSlot>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl<M: Master> MasterBase<M> {
    pub fn new(master: Arc<M>, journal: MasterJournal, tailer_config: TailerConfig) -> Self {
        Self {
            master,
            tailer_config,
            lifecycle: Mutex::new(Lifecycle {
                state: MasterState::Uninitialized,
                journal,
                standby: None,
                parked: None,
            }),
            writer: Mutex::new(WriterSlot::Closed),
        }
    }

    pub fn master(&self) -> &Arc<M> {
        &self.master
    }

    pub fn service_name(&self) -> &str {
        self.master.service_name()
    }

    pub fn state(&self) -> MasterState {
        lock(&self.lifecycle).state
    }

    pub fn journal(&self) -> MasterJournal {
        lock(&self.lifecycle).journal.clone()
    }

    /// Highest sequence number applied by the running standby loop
    pub fn standby_sequence(&self) -> Option<u64> {
        lock(&self.lifecycle)
            .standby
            .as_ref()
            .map(StandbyTailer::applied_sequence)
    }

    /// Fatal error that stopped the standby loop, if it stopped on one
    pub fn standby_failure(&self) -> Option<String> {
        lock(&self.lifecycle)
            .standby
            .as_ref()
            .and_then(StandbyTailer::failure)
    }

    /// Start as standby, or as leader when `is_leader`
    ///
    /// Starting a standby that is already running does nothing; one whose
    /// loop stopped on a fatal error is restarted from the checkpoint. Once leader,
    /// every start fails with [`MasterError::AlreadyLeader`].
    pub fn start(&self, is_leader: bool) -> Result<(), MasterError> {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.state == MasterState::Leader {
            return Err(MasterError::AlreadyLeader);
        }
        if is_leader {
            self.start_leader(&mut lifecycle)
        } else {
            self.start_standby(&mut lifecycle)
        }
    }

    /// Stop the writer or the standby loop. Idempotent.
    pub fn stop(&self) -> Result<(), MasterError> {
        let mut lifecycle = lock(&self.lifecycle);
        let service = self.service_name();
        match lifecycle.state {
            MasterState::Uninitialized => return Ok(()),
            MasterState::Standby => {
                if let Some(standby) = lifecycle.standby.take() {
                    lifecycle.parked = standby.shutdown_and_join();
                }
            }
            MasterState::Leader => {
                let slot = std::mem::replace(&mut *lock(&self.writer), WriterSlot::Closed);
                // State is re-derived from the journal if this master leads again
                lifecycle.parked = None;
                lifecycle.state = MasterState::Uninitialized;
                if let WriterSlot::Open(mut writer) = slot {
                    writer.close()?;
                }
                tracing::info!(%service, "leader stopped");
                return Ok(());
            }
        }
        lifecycle.state = MasterState::Uninitialized;
        tracing::info!(%service, "standby stopped");
        Ok(())
    }

    /// Swap in a read-write journal so this master can be promoted
    pub fn upgrade_to_read_write_journal(&self, journal: ReadWriteJournal) {
        let mut lifecycle = lock(&self.lifecycle);
        tracing::info!(
            service = %self.service_name(),
            path = %journal.journal().dir().display(),
            "upgraded to read-write journal"
        );
        lifecycle.journal = MasterJournal::ReadWrite(journal);
    }

    /// Run `f` with the leader's writer
    ///
    /// A journal error from `f` discards the writer; every later call fails
    /// with [`MasterError::WriterFailed`].
    pub fn with_writer<T>(
        &self,
        f: impl FnOnce(&mut JournalWriter) -> Result<T, MasterError>,
    ) -> Result<T, MasterError> {
        let mut slot = lock(&self.writer);
        let writer = match &mut *slot {
            WriterSlot::Open(writer) => writer,
            WriterSlot::Failed => return Err(MasterError::WriterFailed),
            WriterSlot::Closed => return Err(MasterError::NotLeader),
        };
        match f(writer) {
            Err(MasterError::Journal(e)) => {
                tracing::error!(service = %self.service_name(), error = %e, "journal write failed, discarding writer");
                *slot = WriterSlot::Failed;
                Err(MasterError::Journal(e))
            }
            other => other,
        }
    }

    fn start_standby(&self, lifecycle: &mut Lifecycle) -> Result<(), MasterError> {
        if let Some(standby) = lifecycle.standby.take() {
            let Some(failure) = standby.failure() else {
                lifecycle.standby = Some(standby);
                return Ok(());
            };
            // The old loop exited on a fatal error; a fresh one replays from the checkpoint
            tracing::warn!(service = %self.service_name(), %failure, "restarting failed standby loop");
            standby.shutdown_and_join();
        }
        let tailer = lifecycle.parked.take();
        let resumed = tailer.as_ref().map(JournalTailer::latest_sequence_number);
        lifecycle.standby = Some(self.spawn_standby(&lifecycle.journal, tailer)?);
        lifecycle.state = MasterState::Standby;
        tracing::info!(
            service = %self.service_name(),
            ?resumed,
            read_write = lifecycle.journal.is_read_write(),
            "started as standby"
        );
        Ok(())
    }

    fn start_leader(&self, lifecycle: &mut Lifecycle) -> Result<(), MasterError> {
        let MasterJournal::ReadWrite(journal) = lifecycle.journal.clone() else {
            return Err(MasterError::ReadOnlyJournal);
        };
        let tailer = match lifecycle.standby.take() {
            Some(standby) => standby.shutdown_and_join(),
            None => lifecycle.parked.take(),
        };

        match self.promote(&journal, tailer) {
            Ok((writer, sequence)) => {
                let next = writer.next_sequence_number();
                *lock(&self.writer) = WriterSlot::Open(writer);
                lifecycle.state = MasterState::Leader;
                tracing::info!(service = %self.service_name(), sequence, ?next, "promoted to leader");
                Ok(())
            }
            Err(e) => {
                tracing::error!(service = %self.service_name(), error = %e, "promotion failed, staying standby");
                match self.spawn_standby(&lifecycle.journal, None) {
                    Ok(standby) => lifecycle.standby = Some(standby),
                    Err(spawn) => {
                        tracing::error!(service = %self.service_name(), error = %spawn, "failed to restart standby");
                    }
                }
                lifecycle.state = MasterState::Standby;
                Err(e)
            }
        }
    }

    /// Seal, catch up, and re-checkpoint
    ///
    /// On error the writer is dropped here, which releases its lock.
    fn promote(
        &self,
        journal: &ReadWriteJournal,
        tailer: Option<JournalTailer>,
    ) -> Result<(JournalWriter, u64), MasterError> {
        let mut writer = journal.new_writer()?;
        writer.complete_all_logs()?;

        let sequence = match tailer {
            Some(mut tailer) => match tailer.process_next_journal_log_files() {
                Ok(_) => tailer.latest_sequence_number(),
                Err(JournalError::CheckpointSuperseded { .. }) => {
                    self.replay_from_scratch(journal.journal())?
                }
                Err(e) => return Err(e.into()),
            },
            None => self.replay_from_scratch(journal.journal())?,
        };

        let mut out = writer.checkpoint_output_stream(sequence)?;
        self.master.stream_to_journal_checkpoint(&mut out)?;
        out.close()?;
        Ok((writer, sequence))
    }

    fn replay_from_scratch(&self, journal: &Journal) -> Result<u64, MasterError> {
        self.master.reset_state();
        let mut tailer = JournalTailer::new(self.master.clone(), journal.clone());
        if tailer.checkpoint_exists()? {
            tailer.process_journal_checkpoint(true)?;
        }
        tailer.process_next_journal_log_files()?;
        Ok(tailer.latest_sequence_number())
    }

    fn spawn_standby(
        &self,
        journal: &MasterJournal,
        tailer: Option<JournalTailer>,
    ) -> Result<StandbyTailer, MasterError> {
        StandbyTailer::spawn(
            Arc::clone(&self.master),
            journal.journal().clone(),
            tailer,
            self.tailer_config.clone(),
        )
    }
}

impl<M: Master> Drop for MasterBase<M> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(service = %self.service_name(), error = %e, "error stopping master on drop");
        }
    }
}

#[cfg(test)]
#[path = "master_tests.rs"]
mod tests;
