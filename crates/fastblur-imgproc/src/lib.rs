#![deny(missing_docs)]
//! Summed-area-table box blur and its parallel execution plumbing.

/// image filtering module.
pub mod filter;

/// summed-area table (2D prefix sum) module.
pub mod integral;

/// module containing parallelization utilities.
pub mod parallel;
