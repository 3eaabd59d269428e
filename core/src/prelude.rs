use serde::{Deserialize, Serialize};

/// Tunables shared by every stage of the trajectory pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Radii further than this many standard deviations from the mean are dropped.
    pub num_std_devs: f64,
    /// Detector-space distance under which a point counts as a duplicate.
    pub min_point_distance: f64,
    /// Width of the median/MAD acceptance band, in MADs.
    pub outlier_threshold: f64,
    pub gravity: f64,
    pub max_fit_iterations: usize,
    pub fit_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_std_devs: 3.0,
            min_point_distance: 2.5,
            outlier_threshold: 2.5,
            gravity: 9.81,
            max_fit_iterations: 200,
            fit_tolerance: 1e-10,
        }
    }
}

/// A single `(x, y)` pair. Which coordinate space it lives in is decided by
/// the stage that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

pub type PointSet = Vec<Point>;

/// Common error type for pipeline execution.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid measurement: {0}")]
    InvalidMeasurement(String),
    #[error("insufficient samples: need {required}, got {available}")]
    InsufficientSamples { required: usize, available: usize },
    #[error("fit did not converge: {0}")]
    FitDidNotConverge(String),
    #[error("no detection data")]
    NoDetectionData,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
