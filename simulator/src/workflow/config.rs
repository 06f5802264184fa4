use crate::generator::profile::ScenarioConfig;
use crate::generator::template;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use soarcore::{AnalysisConfig, RawFix, Task, TaskClock};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub analysis: AnalysisConfig,
    pub scenarios: Vec<ScenarioConfig>,
    pub task: Option<Task>,
    pub task_clock: TaskClock,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .analysis
            .validate()
            .with_context(|| format!("validating analysis config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn add_preset(&mut self, name: &str) -> anyhow::Result<()> {
        let scenario = template::preset(name).ok_or_else(|| {
            anyhow!(
                "unknown preset {:?}, expected one of {}",
                name,
                template::PRESETS.join(", ")
            )
        })?;
        self.scenarios.push(scenario);
        Ok(())
    }
}

/// Reads a JSON array of already parsed recorder fixes.
pub fn load_fixes<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<RawFix>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading fixes {}", path_ref.display()))?;
    let fixes: Vec<RawFix> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing fixes {}", path_ref.display()))?;
    Ok(fixes)
}
