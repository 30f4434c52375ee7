//! Division-month summaries of the warranty workbooks.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
