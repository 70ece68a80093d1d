//! End-to-end tests that drive the `vsimbuild` binary against fake tools.

#![cfg(unix)]

mod build_tests;
mod clean_tests;
mod common;
mod info_tests;
