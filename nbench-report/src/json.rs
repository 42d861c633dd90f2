//! JSON Output

use crate::ReportError;
use crate::report::Report;
use nbench_core::{BenchmarkFinalResults, BenchmarkOutput, BenchmarkRunReport, TrialFault};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Collects final results and writes them as one JSON document
pub struct JsonOutput {
    report: Report,
    destination: Option<PathBuf>,
}

impl JsonOutput {
    /// Write to stdout on [`finish`](Self::finish)
    pub fn stdout() -> Self {
        Self {
            report: Report::new(),
            destination: None,
        }
    }

    /// Write to `path` on [`finish`](Self::finish), creating parent directories
    pub fn to_file(path: impl AsRef<Path>) -> Self {
        Self {
            report: Report::new(),
            destination: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Report collected so far
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Serialize everything collected so far to the destination
    pub fn finish(&self) -> Result<(), ReportError> {
        let json = generate_json_report(&self.report)?;
        match &self.destination {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, json)?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{json}")?;
            }
        }
        Ok(())
    }
}

impl BenchmarkOutput for JsonOutput {
    fn write_run(&mut self, _: &BenchmarkRunReport, _: bool) {}

    fn write_final_results(&mut self, results: &BenchmarkFinalResults) {
        self.report.push(results);
    }

    fn report_error(&mut self, _: &str, _: &TrialFault) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::BenchmarkStatus;
    use nbench_core::BenchmarkResults;

    #[test]
    fn test_json_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("nbench-json-{}", std::process::id()));
        let path = dir.join("nested").join("report.json");

        let mut output = JsonOutput::to_file(&path);
        output.write_final_results(&BenchmarkFinalResults::new(
            BenchmarkResults::compile("empty", Vec::new()),
            Vec::new(),
        ));
        output.finish().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let parsed: Report = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.benchmarks.len(), 1);
        assert_eq!(parsed.benchmarks[0].name, "empty");
        assert_eq!(parsed.benchmarks[0].status, BenchmarkStatus::Passed);
        assert_eq!(parsed.meta.schema_version, crate::report::SCHEMA_VERSION);

        let _ = fs::remove_dir_all(dir);
    }
}
