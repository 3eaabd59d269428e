//! Detection-to-physics core for the projectile trajectory tracker.
//!
//! Raw ball detections from an external detector are cleaned, converted to
//! plot space, scaled to metres and fitted with a parabola from which the
//! launch angle, initial speed, time of flight and range are derived.

pub mod detection;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use detection::{DetectionRun, Sample};
pub use prelude::{PipelineConfig, PipelineError, PipelineResult, Point, PointSet};
pub use processing::{FittedTrajectory, ProjectileModel, ProjectileState, ProjectileType};
