//! Health monitor tests.
//!
//! Test organization:
//! - status.rs: threshold mapping, probe scheduling and reconciliation
//! - report.rs: metrics snapshots and the rendered report

mod report;
mod status;
