//! Shared utilities.
//!
//! Filesystem helpers used by several stages, plus test helpers.

pub mod fs;

#[cfg(test)]
pub mod testutil;
