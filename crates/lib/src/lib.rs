//! vsimbuild-lib: build orchestration for Verilator-based simulators
//!
//! This crate turns a project description into the ordered tool invocations
//! that produce a simulator executable:
//! - `config`: layered configuration (defaults, project file, environment, flags)
//! - `platform`: host detection and per-platform toolchain fragments
//! - `flags`: compiler and linker flag assembly from feature toggles
//! - `stages`: one invocation builder per external tool
//! - `execute`: the task graph and its parallel, fail-fast executor

pub mod config;
pub mod execute;
pub mod flags;
pub mod platform;
pub mod sources;
pub mod stages;
pub mod util;
