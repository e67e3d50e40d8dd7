//! Shared E2E test helpers.
//!
//! Provides a temporary project builder, a mock driver that records every
//! call it receives, mock page objects, and a tracing capture buffer.

pub mod logs;
pub mod mock_driver;
pub mod project;
