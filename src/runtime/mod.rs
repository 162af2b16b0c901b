//! Async helpers for workers that lease accounts.

pub mod worker;

pub use worker::{acquire_with_backoff, run_leased, PollPolicy, RunOutcome};
