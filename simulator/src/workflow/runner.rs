use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::warn;
use serde::Serialize;
use soarcore::telemetry::{Metrics, MetricsRecorder};
use soarcore::{Flight, RawFix, TaskProgress};
use std::sync::Arc;

pub struct FlightRun {
    pub name: String,
    pub flight: Flight,
    pub progress: Option<TaskProgress>,
}

/// An input the analysis refused; the rest of the batch still runs.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedInput {
    pub name: String,
    pub reason: String,
}

#[derive(Clone)]
pub struct Runner {
    config: Arc<WorkflowConfig>,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config: Arc::new(config),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn execute(&self, name: &str, fixes: &[RawFix]) -> anyhow::Result<FlightRun> {
        let flight = match Flight::analyze(fixes, &self.config.analysis) {
            Ok(flight) => flight,
            Err(err) => {
                self.metrics.record_rejected();
                warn!("rejecting {}: {}", name, err);
                return Err(err).with_context(|| format!("analysing {}", name));
            }
        };
        self.metrics
            .record_flight(flight.is_valid(), flight.thermals().count());

        let progress = self
            .config
            .task
            .as_ref()
            .map(|task| task.evaluate(&flight, self.config.task_clock));

        Ok(FlightRun {
            name: name.to_string(),
            flight,
            progress,
        })
    }

    /// Analyses every input on the blocking pool; results keep input order.
    ///
    /// Only a failed worker aborts the batch. Inputs the analysis rejects are
    /// returned in place as [`RejectedInput`].
    pub async fn run_batch(
        &self,
        inputs: Vec<(String, Vec<RawFix>)>,
    ) -> anyhow::Result<Vec<Result<FlightRun, RejectedInput>>> {
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|(name, fixes)| {
                let runner = self.clone();
                let worker_name = name.clone();
                let handle = tokio::task::spawn_blocking(move || runner.execute(&worker_name, &fixes));
                (name, handle)
            })
            .collect();

        let mut runs = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = handle.await.context("joining analysis worker")?;
            runs.push(outcome.map_err(|err| RejectedInput {
                name,
                reason: format!("{:#}", err),
            }));
        }
        Ok(runs)
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_fixes;
    use crate::generator::template::preset;
    use soarcore::{Task, Turnpoint, TurnpointKind};

    fn fixes_for(name: &str) -> Vec<RawFix> {
        build_fixes(&preset(name).unwrap()).unwrap()
    }

    #[test]
    fn runner_executes_workflow() {
        let runner = Runner::new(WorkflowConfig::default());
        let run = runner.execute("thermal", &fixes_for("single_thermal")).unwrap();
        assert!(run.flight.is_valid());
        assert_eq!(run.flight.thermals().count(), 1);
        assert!(run.progress.is_none());
        assert_eq!(runner.metrics().analyzed, 1);
        assert_eq!(runner.metrics().thermals, 1);
    }

    #[test]
    fn runner_evaluates_configured_task() {
        let config = WorkflowConfig {
            task: Some(Task::new(
                vec![Turnpoint::new("S", 46.0, 12.0, 1_000.0, TurnpointKind::StartExit)],
                0.0,
                86_400.0,
            )),
            ..Default::default()
        };
        let run = Runner::new(config)
            .execute("glide", &fixes_for("straight_glide"))
            .unwrap();
        // 300 s at 40 km/h ends about 3.3 km from the start.
        assert!(run.progress.unwrap().is_complete());
    }

    #[test]
    fn empty_input_counts_as_rejected() {
        let runner = Runner::new(WorkflowConfig::default());
        assert!(runner.execute("empty", &[]).is_err());
        assert_eq!(runner.metrics().rejected, 1);
        assert_eq!(runner.metrics().analyzed, 0);
    }

    #[test]
    fn bundled_workflow_completes_its_task() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/workflows/eastbound_task.yaml");
        let config = WorkflowConfig::load(path).unwrap();
        let fixes = build_fixes(&config.scenarios[0]).unwrap();
        let runner = Runner::new(config);
        let run = runner.execute("eastbound", &fixes).unwrap();
        assert!(run.flight.is_valid(), "{:?}", run.flight.notes());
        assert_eq!(run.flight.thermals().count(), 1);
        let progress = run.progress.unwrap();
        assert!(progress.is_complete());
        assert!(progress.speed_section_time().unwrap() > 900.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_runs_in_parallel_and_keeps_order() {
        let runner = Runner::new(WorkflowConfig::default());
        let inputs = vec![
            ("a".to_string(), fixes_for("straight_glide")),
            ("b".to_string(), fixes_for("single_thermal")),
            ("c".to_string(), fixes_for("local_soaring")),
        ];
        let runs: Vec<FlightRun> = runner
            .run_batch(inputs)
            .await
            .unwrap()
            .into_iter()
            .map(|outcome| outcome.unwrap())
            .collect();
        let names: Vec<_> = runs.iter().map(|run| run.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(runner.metrics().analyzed, 3);
        assert_eq!(runs[0].flight.thermals().count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejected_input_keeps_the_rest_of_the_batch() {
        let runner = Runner::new(WorkflowConfig::default());
        let inputs = vec![
            ("a".to_string(), fixes_for("straight_glide")),
            ("empty".to_string(), Vec::new()),
            ("c".to_string(), fixes_for("single_thermal")),
        ];
        let outcomes = runner.run_batch(inputs).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].as_ref().unwrap().name, "a");
        let rejected = outcomes[1].as_ref().err().unwrap();
        assert_eq!(rejected.name, "empty");
        assert!(rejected.reason.contains("analysing empty"));
        assert_eq!(outcomes[2].as_ref().unwrap().flight.thermals().count(), 1);
        assert_eq!(runner.metrics().analyzed, 2);
        assert_eq!(runner.metrics().rejected, 1);
    }
}
