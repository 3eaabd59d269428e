pub mod coordinates;
pub mod projectile;
pub mod units;

pub use coordinates::CoordinateCleaner;
pub use projectile::{
    FittedTrajectory, ModelStage, ProjectileModel, ProjectileState, ProjectileType, RunReport,
    TrajectorySummary,
};
pub use units::{ConversionRatio, UnitConverter};
