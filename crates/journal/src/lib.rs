// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tern-journal: durable, replayable journal of namespace entries
//!
//! A journal directory holds one checkpoint, the completed segments written
//! after it, and at most one incomplete segment while a leader is writing.
//!
//! - [`JournalWriter`] is the single producer, owned by the leader
//! - [`JournalTailer`] replays the checkpoint and completed segments into a
//!   [`JournalStateMachine`]

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod input;
mod journal;
mod layout;
mod record;
mod tailer;
mod writer;

pub use error::JournalError;
pub use input::JournalInputStream;
pub use journal::{Journal, ReadWriteJournal};
pub use layout::{JournalLayout, SegmentInfo};
pub use record::{CheckpointHeader, JournalRecord, RecordError};
pub use tailer::{JournalStateMachine, JournalTailer};
pub use writer::{CheckpointOutputStream, JournalWriter};
