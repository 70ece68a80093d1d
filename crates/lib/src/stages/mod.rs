//! Build stages.
//!
//! Each stage turns the resolved configuration into [`Invocation`]s for one
//! external tool. The executor decides when they run.
//!
//! [`Invocation`]: crate::execute::process::Invocation

pub mod clean;
pub mod compile;
pub mod generate;
pub mod link;
pub mod modules;
