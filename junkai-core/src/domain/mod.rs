//! Domain types
//!
//! Shared business entities for the dispatch core. The registry owns job
//! definitions, the selector produces work units, the invoker produces
//! unit outcomes, and the aggregator folds them into execution records.

pub mod job;
pub mod record;
pub mod unit;
