//! # docqa-telemetry
//!
//! Logging setup shared by every docqa binary and test suite.
//!
//! - [`init_telemetry`] installs the process-wide `tracing` subscriber
//! - [`CaptureLayer`] records events in memory so tests can assert on log output

pub mod capture;
pub mod init;

pub use capture::{CaptureLayer, CapturedEvent, CapturedEvents};
pub use init::{LogFormat, TelemetryConfig, TelemetryError, init_telemetry};
