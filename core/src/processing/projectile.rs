use serde::{Deserialize, Serialize};

use crate::detection::DetectionRun;
use crate::math::fit::{CurveCoefficients, CurveFitter};
use crate::math::stats::StatisticalFilter;
use crate::prelude::{PipelineConfig, PipelineError, PipelineResult, Point, PointSet};
use crate::processing::coordinates::CoordinateCleaner;
use crate::processing::units::{ConversionRatio, UnitConverter};
use crate::telemetry::log::LogManager;

/// Launch classification taken from the slope of the first samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileType {
    Ascending,
    Horizontal,
}

impl ProjectileType {
    pub fn classify(initial_gradient: f64) -> Self {
        if initial_gradient > 0.0 {
            ProjectileType::Ascending
        } else {
            ProjectileType::Horizontal
        }
    }
}

/// Stages a run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ModelStage {
    Uninitialized,
    Calibrated,
    Cleaned,
    Fitted,
    Classified,
    Derived,
}

/// Physical quantities derived from the fitted parabola.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectileState {
    pub projectile_type: ProjectileType,
    pub launch_angle_rad: f64,
    pub initial_speed: f64,
    pub time_of_flight: f64,
    pub horizontal_range: f64,
}

impl ProjectileState {
    /// Derives launch parameters from the quadratic and linear fit terms.
    /// `max_height` is only consulted for horizontal launches.
    pub fn derive(
        projectile_type: ProjectileType,
        a: f64,
        b: f64,
        max_height: f64,
        gravity: f64,
    ) -> PipelineResult<Self> {
        let launch_angle_rad = match projectile_type {
            ProjectileType::Ascending => b.atan(),
            ProjectileType::Horizontal => 0.0,
        };
        let cos_angle = launch_angle_rad.cos();
        let initial_speed = (gravity / (2.0 * a.abs() * cos_angle * cos_angle)).sqrt();
        let time_of_flight = match projectile_type {
            ProjectileType::Horizontal => (2.0 * max_height / gravity).sqrt(),
            ProjectileType::Ascending => 2.0 * initial_speed * launch_angle_rad.sin() / gravity,
        };
        let horizontal_range = initial_speed * cos_angle * time_of_flight;

        let finite = initial_speed.is_finite()
            && time_of_flight.is_finite()
            && horizontal_range.is_finite();
        if !finite {
            return Err(PipelineError::FitDidNotConverge(format!(
                "fit (a = {}, b = {}) does not describe a projectile",
                a, b
            )));
        }

        Ok(Self {
            projectile_type,
            launch_angle_rad,
            initial_speed,
            time_of_flight,
            horizontal_range,
        })
    }

    pub fn launch_angle_deg(&self) -> f64 {
        UnitConverter::radians_to_degrees(self.launch_angle_rad)
    }
}

/// Display values, each rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    pub angle_deg: f64,
    pub initial_speed: f64,
    pub time_of_flight: f64,
    pub horizontal_range: f64,
}

/// Rounds the exact binary value to two decimals, ties to even.
fn round_2dp(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Stage trail and per-stage notes for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub stages: Vec<ModelStage>,
    pub notes: Vec<String>,
}

impl RunReport {
    fn advance(&mut self, stage: ModelStage, note: String, logger: &LogManager) {
        debug_assert!(self.stages.last().map_or(true, |last| *last < stage));
        logger.record_stage(stage, &note);
        self.stages.push(stage);
        self.notes.push(note);
    }
}

/// Frozen result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedTrajectory {
    ratio: ConversionRatio,
    path: PointSet,
    coefficients: CurveCoefficients,
    state: ProjectileState,
    gravity: f64,
    report: RunReport,
}

impl FittedTrajectory {
    pub fn ratio(&self) -> ConversionRatio {
        self.ratio
    }

    /// Cleaned plot-space path in real-world units.
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    pub fn coefficients(&self) -> &CurveCoefficients {
        &self.coefficients
    }

    pub fn state(&self) -> ProjectileState {
        self.state
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Highest cleaned point above the lowest detection.
    pub fn max_height(&self) -> f64 {
        max_height(&self.path)
    }

    /// Observed path shifted so it starts at the origin.
    pub fn actual_path(&self) -> PointSet {
        CoordinateCleaner::translate_to_origin(&self.path)
    }

    /// Closed-form trajectory sampled at as many evenly spaced instants over
    /// `[0, time_of_flight]` as there are observed points.
    pub fn predicted_path(&self) -> PointSet {
        let count = self.path.len();
        let state = &self.state;
        let (sin, cos) = state.launch_angle_rad.sin_cos();
        (0..count)
            .map(|i| {
                let t = if count > 1 {
                    state.time_of_flight * i as f64 / (count - 1) as f64
                } else {
                    0.0
                };
                Point::new(
                    state.initial_speed * cos * t,
                    state.initial_speed * sin * t - 0.5 * self.gravity * t * t,
                )
            })
            .collect()
    }

    pub fn summary(&self) -> TrajectorySummary {
        TrajectorySummary {
            angle_deg: round_2dp(self.state.launch_angle_deg()),
            initial_speed: round_2dp(self.state.initial_speed),
            time_of_flight: round_2dp(self.state.time_of_flight),
            horizontal_range: round_2dp(self.state.horizontal_range),
        }
    }
}

fn max_height(path: &[Point]) -> f64 {
    path.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max)
}

/// Runs detections through cleaning, scaling, fitting and derivation.
pub struct ProjectileModel {
    filter: StatisticalFilter,
    cleaner: CoordinateCleaner,
    fitter: CurveFitter,
    gravity: f64,
    logger: LogManager,
}

impl ProjectileModel {
    const FIT_DEGREE: usize = 2;

    pub fn new(config: &PipelineConfig) -> PipelineResult<Self> {
        if !(config.gravity.is_finite() && config.gravity > 0.0) {
            return Err(PipelineError::InvalidInput(format!(
                "gravity must be positive, got {}",
                config.gravity
            )));
        }
        Ok(Self {
            filter: StatisticalFilter::new(config.num_std_devs),
            cleaner: CoordinateCleaner::new(config.min_point_distance, config.outlier_threshold),
            fitter: CurveFitter::new(config.max_fit_iterations, config.fit_tolerance),
            gravity: config.gravity,
            logger: LogManager::new(),
        })
    }

    /// Diameter of the tracked ball in pixels: twice the mean radius after
    /// anomalous radii are discarded.
    pub fn reference_pixel_diameter(&self, run: &DetectionRun) -> PipelineResult<f64> {
        if run.is_empty() {
            return Err(PipelineError::NoDetectionData);
        }
        let radii = self.filter.remove_anomalies(run.radii());
        Ok(StatisticalFilter::average(&radii) * 2.0)
    }

    pub fn calibrate(
        &self,
        run: &DetectionRun,
        real_world_diameter: f64,
    ) -> PipelineResult<ConversionRatio> {
        let pixel_diameter = self.reference_pixel_diameter(run)?;
        UnitConverter::derive_ratio(pixel_diameter, real_world_diameter)
    }

    /// Detector-space centroids to plot-space, real-world coordinates.
    pub fn clean(&self, run: &DetectionRun, ratio: ConversionRatio) -> PipelineResult<PointSet> {
        let flipped = CoordinateCleaner::flip_vertical(&run.centroids())?;
        let deduplicated = self.cleaner.remove_close_points(&flipped);
        let filtered = self.cleaner.remove_outliers(&deduplicated);
        self.logger.record_counts(&[
            ("detected", flipped.len()),
            ("deduplicated", deduplicated.len()),
            ("inliers", filtered.len()),
        ]);
        Ok(CoordinateCleaner::scale(&filtered, ratio.value()))
    }

    pub fn derive(
        &self,
        run: &DetectionRun,
        real_world_diameter: f64,
    ) -> PipelineResult<FittedTrajectory> {
        let ratio = self.calibrate(run, real_world_diameter)?;
        self.derive_with_ratio(run, ratio)
    }

    pub fn derive_with_ratio(
        &self,
        run: &DetectionRun,
        ratio: ConversionRatio,
    ) -> PipelineResult<FittedTrajectory> {
        self.logger
            .record(&format!("deriving trajectory from {} detections", run.len()));
        let mut report = RunReport {
            stages: vec![ModelStage::Uninitialized],
            notes: vec![format!("{} detections", run.len())],
        };
        report.advance(
            ModelStage::Calibrated,
            format!("ratio {:.6} per pixel", ratio.value()),
            &self.logger,
        );

        let path = self.clean(run, ratio)?;
        report.advance(
            ModelStage::Cleaned,
            format!("{} of {} points kept", path.len(), run.len()),
            &self.logger,
        );

        let (xs, ys) = CoordinateCleaner::split(&path);
        let coefficients = self.fitter.fit_polynomial(Self::FIT_DEGREE, &xs, &ys)?;
        let (a, b, c) = coefficients.quadratic().ok_or_else(|| {
            PipelineError::FitDidNotConverge("fit did not yield a quadratic".into())
        })?;
        report.advance(
            ModelStage::Fitted,
            format!("y = {:.4}x^2 + {:.4}x + {:.4}", a, b, c),
            &self.logger,
        );

        let gradient = CurveFitter::estimate_initial_gradient(&xs, &ys)?;
        let projectile_type = ProjectileType::classify(gradient);
        report.advance(
            ModelStage::Classified,
            format!("{:?} (initial gradient {:.4})", projectile_type, gradient),
            &self.logger,
        );

        let state =
            ProjectileState::derive(projectile_type, a, b, max_height(&path), self.gravity)?;
        report.advance(
            ModelStage::Derived,
            format!(
                "angle {:.2} deg, speed {:.2} m/s, flight {:.2} s, range {:.2} m",
                state.launch_angle_deg(),
                state.initial_speed,
                state.time_of_flight,
                state.horizontal_range
            ),
            &self.logger,
        );

        Ok(FittedTrajectory {
            ratio,
            path,
            coefficients,
            state,
            gravity: self.gravity,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(got: f64, want: f64, tol: f64) {
        assert!((got - want).abs() < tol, "got {got}, want {want}");
    }

    /// Detector-space render of `y = -x^2 + 10x` at one pixel per unit with
    /// a constant 5 px radius, bottom of the frame at 300 px.
    fn parabola_run() -> DetectionRun {
        let centroids = (0..=10)
            .map(|x| {
                let x = x as f64;
                (x * 10.0, 300.0 - (-x * x + 10.0 * x) * 10.0)
            })
            .collect::<Vec<_>>();
        let radii = vec![5.0; centroids.len()];
        DetectionRun::new(centroids, radii).unwrap()
    }

    #[test]
    fn ascending_scenario_matches_closed_form() {
        let g = 9.81;
        let state =
            ProjectileState::derive(ProjectileType::Ascending, -1.0, 10.0, 24.0, g).unwrap();
        let angle = 10.0_f64.atan();
        let speed = (g / (2.0 * angle.cos().powi(2))).sqrt();
        assert_close(state.launch_angle_rad, angle, 1e-12);
        assert_close(state.initial_speed, speed, 1e-12);
        assert_close(state.time_of_flight, 2.0 * speed * angle.sin() / g, 1e-12);
        assert_close(
            state.horizontal_range,
            speed * angle.cos() * state.time_of_flight,
            1e-12,
        );
    }

    #[test]
    fn scenario_points_fit_and_classify_as_ascending() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 9.0, 16.0, 21.0, 24.0];
        let coeffs = CurveFitter::default().fit_polynomial(2, &xs, &ys).unwrap();
        let (a, b, _) = coeffs.quadratic().unwrap();
        assert!(a < 0.0);
        assert_close(b, 10.0, 1e-6);
        let gradient = CurveFitter::estimate_initial_gradient(&xs, &ys).unwrap();
        assert_eq!(ProjectileType::classify(gradient), ProjectileType::Ascending);
    }

    #[test]
    fn horizontal_launch_falls_from_peak() {
        let g = 9.81;
        let state =
            ProjectileState::derive(ProjectileType::Horizontal, -0.5, 3.0, 1.2, g).unwrap();
        assert_eq!(state.launch_angle_rad, 0.0);
        assert_close(state.initial_speed, (g / 1.0).sqrt(), 1e-12);
        assert_close(state.time_of_flight, (2.4 / g).sqrt(), 1e-12);
        assert_close(
            state.horizontal_range,
            state.initial_speed * state.time_of_flight,
            1e-12,
        );
        assert_eq!(ProjectileType::classify(0.0), ProjectileType::Horizontal);
        assert_eq!(ProjectileType::classify(-2.0), ProjectileType::Horizontal);
    }

    #[test]
    fn flat_fit_is_not_a_projectile() {
        assert!(matches!(
            ProjectileState::derive(ProjectileType::Horizontal, 0.0, 0.0, 1.0, 9.81),
            Err(PipelineError::FitDidNotConverge(_))
        ));
    }

    #[test]
    fn pipeline_recovers_rendered_parabola() {
        let model = ProjectileModel::new(&PipelineConfig::default()).unwrap();
        let run = parabola_run();
        // 10 px diameter standing for 1 m gives one unit per 10 px.
        let trajectory = model.derive(&run, 1.0).unwrap();

        assert_close(trajectory.ratio().value(), 0.1, 1e-12);
        let (a, b, _) = trajectory.coefficients().quadratic().unwrap();
        assert_close(a, -1.0, 1e-6);
        assert_close(b, 10.0, 1e-6);
        assert_eq!(trajectory.state().projectile_type, ProjectileType::Ascending);
        assert_eq!(
            trajectory.report().stages,
            vec![
                ModelStage::Uninitialized,
                ModelStage::Calibrated,
                ModelStage::Cleaned,
                ModelStage::Fitted,
                ModelStage::Classified,
                ModelStage::Derived,
            ]
        );
    }

    #[test]
    fn cleaning_dedups_before_rejecting_outliers() {
        let model = ProjectileModel::new(&PipelineConfig::default()).unwrap();
        // A five-point jitter cluster near the apex and one stray at (400, 0).
        let centroids = vec![
            (0.0, 100.0),
            (10.0, 82.0),
            (20.0, 68.0),
            (30.0, 58.0),
            (40.0, 52.0),
            (50.0, 50.0),
            (50.0, 51.0),
            (51.0, 50.0),
            (50.0, 50.0),
            (51.0, 51.0),
            (60.0, 52.0),
            (70.0, 58.0),
            (80.0, 68.0),
            (400.0, 0.0),
        ];
        let run = DetectionRun::new(centroids, vec![5.0; 14]).unwrap();
        let ratio = UnitConverter::derive_ratio(2.0, 1.0).unwrap();

        let cleaned = model.clean(&run, ratio).unwrap();
        let expected: PointSet = [
            (10.0, 16.0),
            (15.0, 21.0),
            (20.0, 24.0),
            (25.5, 24.5),
            (30.0, 24.0),
            (35.0, 21.0),
            (40.0, 16.0),
        ]
        .into_iter()
        .map(Point::from)
        .collect();
        assert_eq!(cleaned, expected);

        // Rejecting outliers first lets the cluster narrow the bands.
        let flipped = CoordinateCleaner::flip_vertical(&run.centroids()).unwrap();
        let cleaner = CoordinateCleaner::default();
        let reversed = cleaner.remove_close_points(&cleaner.remove_outliers(&flipped));
        assert_eq!(reversed.len(), 5);
    }

    #[test]
    fn rerun_is_bit_identical() {
        let model = ProjectileModel::new(&PipelineConfig::default()).unwrap();
        let run = parabola_run();
        let first = model.derive(&run, 1.0).unwrap();
        let second = model.derive(&run, 1.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn predicted_path_spans_time_of_flight() {
        let model = ProjectileModel::new(&PipelineConfig::default()).unwrap();
        let trajectory = model.derive(&parabola_run(), 1.0).unwrap();
        let predicted = trajectory.predicted_path();
        let state = trajectory.state();

        assert_eq!(predicted.len(), trajectory.path().len());
        assert_eq!(predicted[0], Point::new(0.0, 0.0));
        let last = predicted[predicted.len() - 1];
        assert_close(last.x, state.horizontal_range, 1e-9);
        assert_close(last.y, 0.0, 1e-9);

        let actual = trajectory.actual_path();
        assert_eq!(actual[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn summary_rounds_to_two_places() {
        let model = ProjectileModel::new(&PipelineConfig::default()).unwrap();
        let trajectory = model.derive(&parabola_run(), 1.0).unwrap();
        let summary = trajectory.summary();
        assert_eq!(summary.angle_deg, 84.29);
        assert_eq!(
            summary.horizontal_range,
            format!("{:.2}", trajectory.state().horizontal_range)
                .parse::<f64>()
                .unwrap()
        );
    }

    #[test]
    fn two_place_rounding_breaks_ties_to_even() {
        assert_eq!(round_2dp(0.125), 0.12);
        assert_eq!(round_2dp(0.375), 0.38);
        // 2.675 is stored just below the tie.
        assert_eq!(round_2dp(2.675), 2.67);
        assert_eq!(round_2dp(84.2894), 84.29);
        assert_eq!(round_2dp(-1.006), -1.01);
    }

    #[test]
    fn missing_preconditions_surface_as_errors() {
        let model = ProjectileModel::new(&PipelineConfig::default()).unwrap();
        let empty = DetectionRun::new(vec![], vec![]).unwrap();
        assert_eq!(model.derive(&empty, 1.0), Err(PipelineError::NoDetectionData));
        assert!(matches!(
            model.derive(&parabola_run(), 0.0),
            Err(PipelineError::InvalidMeasurement(_))
        ));

        let sparse = DetectionRun::new(
            vec![(0.0, 100.0), (10.0, 10.0), (20.0, 20.0), (30.0, 50.0)],
            vec![5.0; 4],
        )
        .unwrap();
        assert!(matches!(
            model.derive(&sparse, 1.0),
            Err(PipelineError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn non_positive_gravity_is_rejected() {
        let config = PipelineConfig {
            gravity: 0.0,
            ..PipelineConfig::default()
        };
        assert!(ProjectileModel::new(&config).is_err());
    }
}
