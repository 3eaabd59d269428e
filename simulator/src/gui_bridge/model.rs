use crate::workflow::runner::WorkflowResult;
use serde::{Deserialize, Serialize};
use trajcore::processing::TrajectorySummary;
use trajcore::{Point, ProjectileType};

/// Everything an external plotting front end needs for one run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VisualizationModel {
    pub summary: Option<TrajectorySummary>,
    pub projectile_type: Option<ProjectileType>,
    /// Vertical distance travelled above the lowest kept detection, in metres.
    pub max_height: Option<f64>,
    pub actual_path: Vec<Point>,
    pub predicted_path: Vec<Point>,
    pub notes: Vec<String>,
}

impl From<&WorkflowResult> for VisualizationModel {
    fn from(result: &WorkflowResult) -> Self {
        Self {
            summary: Some(result.summary),
            projectile_type: Some(result.trajectory.state().projectile_type),
            max_height: Some(result.trajectory.max_height()),
            actual_path: result.actual_path.clone(),
            predicted_path: result.predicted_path.clone(),
            notes: result.trajectory.report().notes.clone(),
        }
    }
}
