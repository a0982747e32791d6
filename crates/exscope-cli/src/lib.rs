//! Command-line driver for the exscope scope engine.
//!
//! Reads procedure bodies in the JSON interchange form, analyzes each one in
//! parallel and reports scope diagnostics as text or JSON.

pub mod args;
pub mod config;
pub mod driver;
pub mod reporter;
pub mod tracing_config;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;
#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;
