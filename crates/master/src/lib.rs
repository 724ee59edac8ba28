// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tern-master: leader/standby lifecycle of a journal-backed master
//!
//! A master starts as a standby that tails the journal into its state, and
//! may be promoted to the leader that owns the journal writer. Promotion
//! seals the journal, catches up on every completed segment, and writes a
//! fresh checkpoint before accepting mutations.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod master;
mod namespace;
mod standby;

pub use error::MasterError;
pub use master::{Master, MasterBase, MasterJournal, MasterState};
pub use namespace::{NamespaceMaster, NamespaceState};
