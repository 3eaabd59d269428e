use anyhow::Context;
use clap::Parser;
use generator::input::load_detection_run;
use generator::profile::build_detection_run_from_config;
use gui_bridge::bridge::GuiBridge;
use gui_bridge::model::VisualizationModel;
use gui_bridge::quiz::RangeQuiz;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use trajcore::PipelineConfig;
use workflow::calibration::prompt_ratio;
use workflow::config::WorkflowConfig;
use workflow::runner::{Runner, WorkflowResult};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Projectile trajectory extraction driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Recorded detector output (JSON); a synthetic throw is rendered when absent
    #[arg(long)]
    detections: Option<PathBuf>,
    /// Real-world size of the reference object in metres; prompted for when absent
    #[arg(long)]
    calibration_m: Option<f64>,
    #[arg(long, default_value_t = 9.81)]
    gravity: f64,
    #[arg(long, default_value_t = 3.0)]
    std_devs: f64,
    #[arg(long, default_value_t = 2.5)]
    min_distance: f64,
    #[arg(long, default_value_t = 2.5)]
    outlier_threshold: f64,
    /// Seed for the synthetic detector
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Ask for the horizontal range before revealing it
    #[arg(long, default_value_t = false)]
    quiz: bool,
    /// Keep the GUI bridge alive for incoming detection runs
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        let pipeline = PipelineConfig {
            num_std_devs: args.std_devs,
            min_point_distance: args.min_distance,
            outlier_threshold: args.outlier_threshold,
            gravity: args.gravity,
            ..PipelineConfig::default()
        };
        WorkflowConfig::from_args(pipeline, args.calibration_m, args.seed)
    };

    let runner = Arc::new(Runner::new(workflow_config)?);
    let workflow_config = runner.config();
    let gui_bridge = GuiBridge::new();

    let (run, calibration_m) = match args.detections {
        Some(path) => (load_detection_run(path)?, workflow_config.calibration_m),
        None => {
            let generator = &workflow_config.generator;
            let run = build_detection_run_from_config(generator)
                .context("rendering synthetic throw")?;
            let calibration = workflow_config
                .calibration_m
                .unwrap_or_else(|| generator.reference_diameter_m());
            (run, Some(calibration))
        }
    };

    let result = match calibration_m {
        Some(calibration) => runner.execute(&run, calibration)?,
        None => {
            let pixel_diameter = runner.reference_pixel_diameter(&run)?;
            let stdin = io::stdin();
            let ratio = prompt_ratio(
                &mut stdin.lock(),
                &mut io::stdout(),
                pixel_diameter,
                &workflow_config.reference_object,
            )?;
            runner.execute_with_ratio(&run, ratio)?
        }
    };

    let quiz = RangeQuiz::new(result.summary, result.trajectory.state().horizontal_range);
    if args.quiz {
        let stdin = io::stdin();
        quiz.run(&mut stdin.lock(), &mut io::stdout())?;
    } else {
        println!("{}", quiz.closing_summary());
    }

    gui_bridge.publish(&VisualizationModel::from(&result))?;
    gui_bridge.publish_status("Trajectory results ready.");
    append_report(&workflow_config.report_path, &result)?;

    if args.serve {
        let handle = gui_bridge.serve(runner.clone(), workflow_config.bind_address);
        gui_bridge.publish_status(&format!(
            "HTTP bridge running on {} (Ctrl+C to stop)...",
            workflow_config.bind_address
        ));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
        drop(handle);
    }

    let metrics = runner.metrics();
    log::info!(
        "runs completed {}, failed {}, points kept {}/{}",
        metrics.completed,
        metrics.failed,
        metrics.points_kept,
        metrics.detections
    );

    Ok(())
}

fn append_report(path: &Path, result: &WorkflowResult) -> anyhow::Result<()> {
    let state = result.trajectory.state();
    let report = format!(
        "type={:?} angle_deg={:.2} speed={:.2} flight={:.2} range={:.2} height={:.2} \
         points={} notes={:?}\n",
        state.projectile_type,
        result.summary.angle_deg,
        result.summary.initial_speed,
        result.summary.time_of_flight,
        result.summary.horizontal_range,
        result.trajectory.max_height(),
        result.actual_path.len(),
        result.trajectory.report().notes
    );
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    file.write_all(report.as_bytes())?;
    Ok(())
}
