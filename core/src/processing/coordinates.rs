use log::debug;

use crate::math::stats::StatisticalFilter;
use crate::prelude::{PipelineError, PipelineResult, Point, PointSet};

/// Converts detector-space centroids to plot space and strips duplicate and
/// stray detections.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateCleaner {
    min_distance: f64,
    outlier_threshold: f64,
}

impl CoordinateCleaner {
    pub fn new(min_distance: f64, outlier_threshold: f64) -> Self {
        Self {
            min_distance,
            outlier_threshold,
        }
    }

    /// Mirrors every point about the largest y so that y grows upward.
    pub fn flip_vertical(points: &[Point]) -> PipelineResult<PointSet> {
        let max_y = points
            .iter()
            .map(|p| p.y)
            .reduce(f64::max)
            .ok_or(PipelineError::NoDetectionData)?;
        Ok(Self::flip_about(points, max_y))
    }

    pub fn flip_about(points: &[Point], max_y: f64) -> PointSet {
        points.iter().map(|p| Point::new(p.x, max_y - p.y)).collect()
    }

    pub fn remove_close_points(&self, points: &[Point]) -> PointSet {
        Self::remove_close_points_with(points, self.min_distance)
    }

    /// Keeps a point only when no later point of the input lies closer than
    /// `min_distance`. Later points are compared against the unfiltered input.
    pub fn remove_close_points_with(points: &[Point], min_distance: f64) -> PointSet {
        points
            .iter()
            .enumerate()
            .filter(|(i, point)| {
                !points[i + 1..]
                    .iter()
                    .any(|later| point.distance(later) < min_distance)
            })
            .map(|(_, point)| *point)
            .collect()
    }

    pub fn remove_outliers(&self, points: &[Point]) -> PointSet {
        Self::remove_outliers_with(points, self.outlier_threshold)
    }

    /// Keeps points inside `median ± threshold·MAD` on both axes. An axis
    /// whose MAD is zero does not filter.
    pub fn remove_outliers_with(points: &[Point], threshold: f64) -> PointSet {
        let (xs, ys) = Self::split(points);
        let x_band = AxisBand::new(&xs, threshold);
        let y_band = AxisBand::new(&ys, threshold);
        debug!("outlier bands x {:?} y {:?}", x_band, y_band);

        points
            .iter()
            .copied()
            .filter(|p| x_band.contains(p.x) && y_band.contains(p.y))
            .collect()
    }

    pub fn scale(points: &[Point], ratio: f64) -> PointSet {
        points
            .iter()
            .map(|p| Point::new(p.x * ratio, p.y * ratio))
            .collect()
    }

    pub fn split(points: &[Point]) -> (Vec<f64>, Vec<f64>) {
        points.iter().map(|p| (p.x, p.y)).unzip()
    }

    /// Shifts the path so that its first point sits at the origin.
    pub fn translate_to_origin(points: &[Point]) -> PointSet {
        match points.first() {
            Some(&origin) => points
                .iter()
                .map(|p| Point::new(p.x - origin.x, p.y - origin.y))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Default for CoordinateCleaner {
    fn default() -> Self {
        Self::new(2.5, 2.5)
    }
}

#[derive(Debug, Clone, Copy)]
enum AxisBand {
    Unbounded,
    Within { lower: f64, upper: f64 },
}

impl AxisBand {
    fn new(values: &[f64], threshold: f64) -> Self {
        let (median, mad) = StatisticalFilter::median_absolute_deviation(values);
        if mad == 0.0 {
            return AxisBand::Unbounded;
        }
        AxisBand::Within {
            lower: median - threshold * mad,
            upper: median + threshold * mad,
        }
    }

    fn contains(&self, value: f64) -> bool {
        match *self {
            AxisBand::Unbounded => true,
            AxisBand::Within { lower, upper } => (lower..=upper).contains(&value),
        }
    }
}
