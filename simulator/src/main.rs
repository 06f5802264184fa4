use anyhow::Context;
use clap::Parser;
use generator::profile::build_fixes;
use generator::template::PRESETS;
use log::info;
use report::model::BatchReport;
use report::writer::write_report;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::{load_fixes, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod report;
mod workflow;

const DEFAULT_PRESET: &str = "local_soaring";

#[derive(Parser)]
#[command(author, version, about = "Offline driver for the soarcore flight analysis")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Add a built-in synthetic scenario
    #[arg(long)]
    preset: Vec<String>,
    /// Analyse a JSON array of pre-parsed fixes (repeatable)
    #[arg(long)]
    fixes: Vec<PathBuf>,
    /// Write the JSON report here
    #[arg(long)]
    report: Option<PathBuf>,
    /// Override the jitter seed of every generated scenario
    #[arg(long)]
    seed: Option<u64>,
    /// Print the available presets and exit
    #[arg(long, default_value_t = false)]
    list_presets: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_presets {
        for name in PRESETS {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    };
    for name in &args.preset {
        workflow_config.add_preset(name)?;
    }
    if workflow_config.scenarios.is_empty() && args.fixes.is_empty() {
        workflow_config.add_preset(DEFAULT_PRESET)?;
    }
    if let Some(seed) = args.seed {
        for scenario in &mut workflow_config.scenarios {
            scenario.seed = seed;
        }
    }

    let mut inputs = Vec::new();
    for scenario in &workflow_config.scenarios {
        let fixes = build_fixes(scenario)
            .with_context(|| format!("generating scenario {}", scenario.name))?;
        inputs.push((scenario.name.clone(), fixes));
    }
    for path in &args.fixes {
        inputs.push((path.display().to_string(), load_fixes(path)?));
    }
    info!("analysing {} flights", inputs.len());

    let runner = Runner::new(workflow_config);
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for batch analysis")?;
    let outcomes = runtime.block_on(runner.run_batch(inputs))?;

    let batch = BatchReport::from_outcomes(outcomes, runner.metrics());
    for line in batch.summary_lines() {
        println!("{}", line);
    }

    if let Some(path) = args.report {
        write_report(&path, &batch)?;
        info!("report written to {}", path.display());
    }

    Ok(())
}
