//! # AssocLib
//!
//! Assoclib models a single set-associative cache and replays memory access traces against it
//!
//! It provides a generic cache implementation which is parameterised by a replacement policy (least
//! recently used or first in first out), a simulator which drives it from trace text, and the
//! reporting and benchmark plan helpers used by the command line driver
//!
//! Addresses are 32 bits wide, wider addresses are truncated

/// Contains the implementation of the cache, and a utility enum for the existing cache types
pub mod cache;

/// Contains the configuration types, which can be read from JSON
pub mod config;

/// Contains the error types
pub mod error;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the trace line parser
pub mod trace;

/// Contains the simulator used to replay a trace with a given cache configuration
pub mod simulator;

/// Contains the CSV and console reports
pub mod report;

/// Contains the runner for lists of configurations
pub mod benchmark;

/// Contains helpers for opening trace files
pub mod io;

#[cfg(test)]
mod test;

/// Contains utilities for generating traces for tests and benchmarks.
pub mod util;
