#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]

pub mod certificate;
pub mod config;
pub mod crypto;
pub mod drives;
pub mod error;
pub mod executor;
pub mod log_chain;
pub mod selector;
pub mod ui;

use std::sync::atomic::{AtomicBool, Ordering};

// Process-wide interrupt flag, set by the Ctrl+C signal handler and
// checked at the top level of the CLI loop. Per-operation cancellation
// goes through `executor::CancellationFlag` instead; this flag only
// decides whether to start cancelling any running operations at all.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

pub fn set_interrupted() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

pub fn reset_interrupted() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}
