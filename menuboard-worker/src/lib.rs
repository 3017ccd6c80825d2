//! # Menuboard Worker Library
//!
//! Periodic maintenance for the menuboard database. Nothing here is on the
//! request path: access is always computed on read, the sweeps only tidy up
//! state that would otherwise linger.
//!
//! ## Modules
//!
//! - `config`: Environment configuration
//! - `sweeps`: Trial expiry, stale waiter calls and abandoned checkouts
//! - `scheduler`: Interval loop with graceful shutdown

pub mod config;
pub mod scheduler;
pub mod sweeps;
