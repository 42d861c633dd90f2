#![warn(missing_docs)]
//! NBench Report - Output Sinks
//!
//! Implementations of [`nbench_core::BenchmarkOutput`]:
//! - Human-readable terminal output
//! - JSON (machine-readable, one document per invocation)
//! - `tracing` events
//! - Fan-out and in-memory capture

mod human;
mod json;
mod report;
mod sinks;

pub use human::{HumanOutput, format_final_results, format_human_output};
pub use json::{JsonOutput, generate_json_report};
pub use report::{
    BenchmarkReportResult, BenchmarkStatus, Report, ReportMeta, ReportSummary, SCHEMA_VERSION,
    SystemInfo,
};
pub use sinks::{CollectingOutput, CompositeOutput, TracingOutput};

use thiserror::Error;

/// Errors raised while writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing the destination failed
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization failed
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with full schema
    Json,
    /// Structured log events only
    Tracing,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "tracing" | "log" => Ok(OutputFormat::Tracing),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Tracing => write!(f, "tracing"),
        }
    }
}
