//! E2E test scenarios.
//!
//! Each module covers one aspect of a suite run.

mod config_error;
mod fault_isolation;
mod lifecycle;
mod logging;
mod visual;
