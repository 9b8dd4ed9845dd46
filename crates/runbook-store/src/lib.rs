//! runbook-store: SQLite storage layer for the runbook tracker.
//!
//! Correctness under concurrency is pushed into the store rather than held
//! in process memory: the counter cell behind the sequential allocator is
//! only ever mutated through [`counter::update_counter`] (an immediate
//! transaction with bounded retry), and status transitions are applied
//! read-plan-write inside one per-record transaction. Any number of
//! connections — threads or processes — may work against the same store
//! file.

pub mod alloc;
pub mod counter;
pub mod db;
pub mod error;
pub mod repo;

pub use counter::DEFAULT_RETRY_BUDGET;
pub use db::open_store;
pub use error::{Result, StoreError};
