//! E2E integration tests for stepwise-harness.
//!
//! These tests drive whole suites through [`Suite`](stepwise_harness::Suite)
//! against a temporary project directory and a recording mock driver.
//!
//! # Test Structure
//!
//! - `helpers/` -- Shared test utilities (project builder, mock driver, log capture)
//! - `scenarios/` -- Test files organized by scenario
//!
//! # Running
//!
//! ```bash
//! cargo test -p stepwise-harness --test e2e
//! ```

mod helpers;
mod scenarios;
