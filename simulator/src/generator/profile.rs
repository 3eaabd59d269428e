use anyhow::ensure;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use trajcore::DetectionRun;

/// Configuration for rendering a synthetic throw into detector-space samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub speed_mps: f64,
    pub angle_deg: f64,
    pub launch_height_m: f64,
    pub gravity: f64,
    pub pixels_per_meter: f64,
    pub frame_rate: f64,
    pub frame_height_px: f64,
    pub launch_x_px: f64,
    pub ball_radius_px: f64,
    pub jitter_px: f64,
    pub radius_jitter_px: f64,
    pub spurious_detections: usize,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            speed_mps: 8.0,
            angle_deg: 40.0,
            launch_height_m: 0.0,
            gravity: 9.81,
            pixels_per_meter: 100.0,
            frame_rate: 60.0,
            frame_height_px: 720.0,
            launch_x_px: 0.0,
            ball_radius_px: 10.0,
            jitter_px: 0.5,
            radius_jitter_px: 0.3,
            spurious_detections: 2,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    /// Real-world ball diameter implied by the rendering scale.
    pub fn reference_diameter_m(&self) -> f64 {
        2.0 * self.ball_radius_px / self.pixels_per_meter
    }

    fn landing_time(&self) -> f64 {
        let (sin, _) = self.angle_deg.to_radians().sin_cos();
        let vy = self.speed_mps * sin;
        (vy + (vy * vy + 2.0 * self.gravity * self.launch_height_m).sqrt()) / self.gravity
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.speed_mps >= 0.0, "speed must not be negative");
        ensure!(self.gravity > 0.0, "gravity must be positive");
        ensure!(self.launch_height_m >= 0.0, "launch height must not be negative");
        ensure!(self.pixels_per_meter > 0.0, "pixels per meter must be positive");
        ensure!(self.frame_rate > 0.0, "frame rate must be positive");
        ensure!(self.ball_radius_px > 0.0, "ball radius must be positive");
        ensure!(
            self.jitter_px >= 0.0 && self.radius_jitter_px >= 0.0,
            "jitter must not be negative"
        );
        Ok(())
    }
}

fn jitter(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}

pub fn build_detection_run_from_config(config: &GeneratorConfig) -> anyhow::Result<DetectionRun> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (sin, cos) = config.angle_deg.to_radians().sin_cos();
    let landing = config.landing_time();
    let frames = (landing * config.frame_rate).floor() as usize + 1;

    let mut centroids = Vec::with_capacity(frames + config.spurious_detections);
    let mut radii = Vec::with_capacity(frames + config.spurious_detections);
    for frame in 0..frames {
        let t = frame as f64 / config.frame_rate;
        let x = config.speed_mps * cos * t;
        let y =
            config.launch_height_m + config.speed_mps * sin * t - 0.5 * config.gravity * t * t;
        let pixel_x = config.launch_x_px
            + x * config.pixels_per_meter
            + jitter(&mut rng, config.jitter_px);
        let pixel_y = config.frame_height_px - y * config.pixels_per_meter
            + jitter(&mut rng, config.jitter_px);
        centroids.push((pixel_x, pixel_y));
        radii.push(config.ball_radius_px + jitter(&mut rng, config.radius_jitter_px));
    }

    let span_px = (config.launch_x_px + config.speed_mps * cos * landing * config.pixels_per_meter)
        .max(config.launch_x_px + 1.0);
    for _ in 0..config.spurious_detections {
        let index = rng.gen_range(0..=centroids.len());
        let stray = (
            rng.gen_range(config.launch_x_px..=span_px),
            rng.gen_range(0.0..=config.frame_height_px.max(1.0)),
        );
        centroids.insert(index, stray);
        radii.insert(index, config.ball_radius_px * rng.gen_range(0.5..=1.5));
    }

    Ok(DetectionRun::new(centroids, radii)?)
}
