use crate::report::model::BatchReport;
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Writes the batch as pretty JSON, creating parent directories as needed.
pub fn write_report<P: AsRef<Path>>(path: P, report: &BatchReport) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("serializing report")?;
    fs::write(path_ref, json).with_context(|| format!("writing report {}", path_ref.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soarcore::telemetry::Metrics;

    #[test]
    fn report_lands_in_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let report = BatchReport {
            flights: Vec::new(),
            rejected: Vec::new(),
            metrics: Metrics {
                analyzed: 2,
                ..Default::default()
            },
        };
        write_report(&path, &report).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metrics"]["analyzed"], 2);
        assert!(written["flights"].as_array().unwrap().is_empty());
    }
}
