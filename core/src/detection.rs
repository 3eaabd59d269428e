use serde::{Deserialize, Serialize};

use crate::prelude::{PipelineError, PipelineResult, Point, PointSet};

/// One ball detection in detector space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub radius: f64,
}

impl Sample {
    pub fn new(pixel_x: f64, pixel_y: f64, radius: f64) -> Self {
        Self {
            pixel_x,
            pixel_y,
            radius,
        }
    }
}

#[derive(Deserialize)]
struct RawDetectionRun {
    centroids: Vec<(f64, f64)>,
    radii: Vec<f64>,
}

/// Frozen output of one detector run: centroids and radii aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDetectionRun")]
pub struct DetectionRun {
    centroids: Vec<(f64, f64)>,
    radii: Vec<f64>,
}

impl DetectionRun {
    pub fn new(centroids: Vec<(f64, f64)>, radii: Vec<f64>) -> PipelineResult<Self> {
        if centroids.len() != radii.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} centroids but {} radii",
                centroids.len(),
                radii.len()
            )));
        }
        Ok(Self { centroids, radii })
    }

    pub fn from_samples(samples: &[Sample]) -> Self {
        Self {
            centroids: samples.iter().map(|s| (s.pixel_x, s.pixel_y)).collect(),
            radii: samples.iter().map(|s| s.radius).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Centroids as detector-space points.
    pub fn centroids(&self) -> PointSet {
        self.centroids.iter().copied().map(Point::from).collect()
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.centroids
            .iter()
            .zip(&self.radii)
            .map(|(&(x, y), &r)| Sample::new(x, y, r))
    }
}

impl TryFrom<RawDetectionRun> for DetectionRun {
    type Error = PipelineError;

    fn try_from(raw: RawDetectionRun) -> Result<Self, Self::Error> {
        DetectionRun::new(raw.centroids, raw.radii)
    }
}
