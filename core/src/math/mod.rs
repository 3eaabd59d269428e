pub mod fit;
pub mod matrix;
pub mod stats;

pub use fit::{CurveCoefficients, CurveFitter};
pub use matrix::MatrixHelper;
pub use stats::StatisticalFilter;
