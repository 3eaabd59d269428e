use crate::generator::profile::{build_detection_run_from_config, GeneratorConfig};
use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::runner::Runner;
use anyhow::{anyhow, Result};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use trajcore::DetectionRun;
use warp::{http::StatusCode, Filter};

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

/// Body of `POST /ingest`: a recorded run plus the reference object's size.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub run: DetectionRun,
    pub calibration_m: f64,
}

type SharedModel = Arc<RwLock<VisualizationModel>>;

fn store(state: &SharedModel, model: VisualizationModel) {
    match state.write() {
        Ok(mut guard) => *guard = model,
        Err(_) => error!("visualization state poisoned; dropping update"),
    }
}

/// Holds the latest trajectory for an external plotting front end and
/// optionally serves it over HTTP.
pub struct GuiBridge {
    state: SharedModel,
}

impl GuiBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(VisualizationModel::default())),
        }
    }

    /// Starts the HTTP endpoint on its own thread.
    ///
    /// * `GET /trajectory` returns the current [`VisualizationModel`].
    /// * `POST /ingest` runs the pipeline on an [`IngestRequest`].
    /// * `POST /simulate` renders a [`GeneratorConfig`] throw and runs it.
    pub fn serve(&self, runner: Arc<Runner>, address: SocketAddr) -> thread::JoinHandle<()> {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());

        let get_route = warp::path("trajectory")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| {
                let snapshot = state.read().map(|g| g.clone()).unwrap_or_default();
                warp::reply::json(&snapshot)
            });

        let ingest_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .and_then(
                |request: IngestRequest, state: SharedModel, runner: Arc<Runner>| async move {
                    match runner.execute(&request.run, request.calibration_m) {
                        Ok(result) => {
                            store(&state, VisualizationModel::from(&result));
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "summary": result.summary,
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            error!("ingest error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        let simulate_route = warp::path("simulate")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig, state: SharedModel, runner: Arc<Runner>| async move {
                    match build_detection_run_from_config(&config)
                        .and_then(|run| runner.execute(&run, config.reference_diameter_m()))
                    {
                        Ok(result) => {
                            store(&state, VisualizationModel::from(&result));
                            info!(
                                "simulated throw seed {} -> range {:.2} m",
                                config.seed, result.summary.horizontal_range
                            );
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "summary": result.summary,
                                    "points": result.actual_path.len(),
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            error!("simulate error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = get_route.or(ingest_route).or(simulate_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        })
    }

    pub fn publish(&self, model: &VisualizationModel) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("visualization state poisoned"))?;
        *guard = model.clone();
        println!(
            "[GUI] actual path points: {}, predicted path points: {}",
            guard.actual_path.len(),
            guard.predicted_path.len()
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> VisualizationModel {
        self.state.read().unwrap().clone()
    }
}

impl Default for GuiBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::WorkflowConfig;

    #[test]
    fn gui_bridge_updates_state() {
        let generator = GeneratorConfig::default();
        let runner = Runner::new(WorkflowConfig::default()).unwrap();
        let gui = GuiBridge::new();
        let run = build_detection_run_from_config(&generator).unwrap();
        let result = runner
            .execute(&run, generator.reference_diameter_m())
            .unwrap();

        gui.publish(&VisualizationModel::from(&result)).unwrap();
        let snapshot = gui.snapshot();
        assert_eq!(snapshot.summary, Some(result.summary));
        assert_eq!(snapshot.actual_path.len(), result.predicted_path.len());
        assert_eq!(snapshot.notes.len(), 6);
    }

    #[test]
    fn ingest_request_parses_detection_run() {
        let body = r#"{"run": {"centroids": [[1.0, 2.0]], "radii": [3.0]}, "calibration_m": 0.2}"#;
        let request: IngestRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.run.len(), 1);
        assert_eq!(request.calibration_m, 0.2);
    }
}
