//! CLI command implementations.

pub mod common;
pub mod ports;
pub mod run;
