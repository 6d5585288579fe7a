//! Junkai Core
//!
//! Core types for the junkai dispatch system.
//!
//! This crate contains:
//! - Domain types: job definitions, dispatch strategies, work units,
//!   execution records
//! - Settings: the mutable per-job configuration document shared between
//!   the dispatcher and the admin surface

pub mod domain;
pub mod settings;
