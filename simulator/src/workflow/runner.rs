use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::warn;
use std::sync::Arc;
use trajcore::processing::{ConversionRatio, TrajectorySummary};
use trajcore::telemetry::{MetricsRecorder, MetricsSnapshot};
use trajcore::{DetectionRun, FittedTrajectory, PipelineResult, PointSet, ProjectileModel};

pub struct WorkflowResult {
    pub trajectory: FittedTrajectory,
    pub summary: TrajectorySummary,
    pub actual_path: PointSet,
    pub predicted_path: PointSet,
}

impl WorkflowResult {
    fn from_trajectory(trajectory: FittedTrajectory) -> Self {
        Self {
            summary: trajectory.summary(),
            actual_path: trajectory.actual_path(),
            predicted_path: trajectory.predicted_path(),
            trajectory,
        }
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    model: Arc<ProjectileModel>,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> anyhow::Result<Self> {
        let model =
            ProjectileModel::new(&config.pipeline).context("building projectile model")?;
        Ok(Self {
            config,
            model: Arc::new(model),
            metrics: Arc::new(MetricsRecorder::new()),
        })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reference_pixel_diameter(&self, run: &DetectionRun) -> anyhow::Result<f64> {
        self.model
            .reference_pixel_diameter(run)
            .context("measuring reference object")
    }

    pub fn execute(
        &self,
        run: &DetectionRun,
        calibration_m: f64,
    ) -> anyhow::Result<WorkflowResult> {
        let outcome = self.model.derive(run, calibration_m);
        self.finish(run, outcome)
    }

    pub fn execute_with_ratio(
        &self,
        run: &DetectionRun,
        ratio: ConversionRatio,
    ) -> anyhow::Result<WorkflowResult> {
        let outcome = self.model.derive_with_ratio(run, ratio);
        self.finish(run, outcome)
    }

    fn finish(
        &self,
        run: &DetectionRun,
        outcome: PipelineResult<FittedTrajectory>,
    ) -> anyhow::Result<WorkflowResult> {
        match outcome {
            Ok(trajectory) => {
                self.metrics
                    .record_completed(run.len(), trajectory.path().len());
                Ok(WorkflowResult::from_trajectory(trajectory))
            }
            Err(err) => {
                warn!("trajectory run failed: {}", err);
                self.metrics.record_failed();
                Err(err).context("deriving projectile trajectory")
            }
        }
    }
}
