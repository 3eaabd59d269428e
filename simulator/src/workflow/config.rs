use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use trajcore::prelude::PipelineConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub pipeline: PipelineConfig,
    /// Real-world size of the reference object in metres; prompted for when absent.
    pub calibration_m: Option<f64>,
    pub reference_object: String,
    pub report_path: PathBuf,
    pub bind_address: SocketAddr,
    pub generator: GeneratorConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            calibration_m: None,
            reference_object: "diameter of the ball".into(),
            report_path: PathBuf::from("tools/data/trajectory_report.log"),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9000)),
            generator: GeneratorConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(pipeline: PipelineConfig, calibration_m: Option<f64>, seed: u64) -> Self {
        Self {
            pipeline,
            calibration_m,
            generator: GeneratorConfig {
                seed,
                ..GeneratorConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_pipeline_settings() {
        let pipeline = PipelineConfig {
            gravity: 1.62,
            ..PipelineConfig::default()
        };
        let cfg = WorkflowConfig::from_args(pipeline, Some(0.2), 7);
        assert_eq!(cfg.pipeline.gravity, 1.62);
        assert_eq!(cfg.calibration_m, Some(0.2));
        assert_eq!(cfg.generator.seed, 7);
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"calibration_m: 0.065\npipeline:\n  gravity: 9.8\n  outlier_threshold: 3.0\ngenerator:\n  angle_deg: 30.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.calibration_m, Some(0.065));
        assert_eq!(cfg.pipeline.gravity, 9.8);
        assert_eq!(cfg.pipeline.outlier_threshold, 3.0);
        assert_eq!(cfg.pipeline.min_point_distance, 2.5);
        assert_eq!(cfg.generator.angle_deg, 30.0);
        assert_eq!(cfg.reference_object, "diameter of the ball");
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = WorkflowConfig::load("does/not/exist.yaml").unwrap_err();
        assert!(format!("{:#}", err).contains("reading workflow config"));
    }
}
