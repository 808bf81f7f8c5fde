//! sutra-sim - Simulated mapping run against the SutraSLAM backend
//!
//! Drives the mapper with a synthetic robot: an odometry producer thread
//! moves the robot around a square room while a detector thread reports
//! sightings of four corner markers. The mapper runs its dispatch loop on
//! the main thread until Ctrl-C or the scripted run completes, logging
//! every published snapshot.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sutra_slam::core::time::{TimeSource, WallClock};
use sutra_slam::core::types::{Information2D, Point2D, Pose2D};
use sutra_slam::plugins::{
    LandmarkObservation, LandmarkPlugin, OdometryMeasurement, OdometryPosePlugin, SnapshotLogger,
    TrajectoryRecorder,
};
use sutra_slam::solver::DeadReckoningSolver;
use sutra_slam::{MapperBase, MapperConfig};

struct Args {
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args { config_path: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("sutra-sim - simulated mapping run for the SutraSLAM backend");
    println!();
    println!("USAGE:");
    println!("    sutra-sim [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: built-in defaults)");
    println!("    -h, --help              Print help information");
    println!();
    println!("CONFIGURATION:");
    println!("    All settings are configured via the TOML config file:");
    println!("    - commit_window_s: pose commit delay in seconds");
    println!("    - suppress_commit_window: commit immediately (batch replay)");
    println!("    - max_pending_nodes: backlog bound before forced commits");
}

/// Waypoints of one lap around a 4x4 m square, 0.5 m per step.
fn square_lap() -> Vec<Pose2D> {
    let mut path = Vec::new();
    let step = Pose2D::new(0.5, 0.0, 0.0);
    let turn = Pose2D::new(0.0, 0.0, std::f32::consts::FRAC_PI_2);
    for _ in 0..4 {
        for _ in 0..8 {
            path.push(step);
        }
        path.push(turn);
    }
    path
}

/// Corner markers of the room, in the map frame.
const MARKERS: [Point2D; 4] = [
    Point2D { x: 4.5, y: -0.5 },
    Point2D { x: 4.5, y: 4.5 },
    Point2D { x: -0.5, y: 4.5 },
    Point2D { x: -0.5, y: -0.5 },
];

/// Maximum range at which the simulated detector sees a marker.
const DETECTION_RANGE: f32 = 3.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = parse_args();
    let config = match &args.config_path {
        Some(path) => MapperConfig::from_file(path),
        None => MapperConfig::default(),
    };

    log::info!("sutra-sim starting");
    log::info!("  Commit window: {:.1}s", config.commit_window_s);
    log::info!("  Max pending nodes: {}", config.max_pending_nodes);

    let mapper = Arc::new(MapperBase::with_wall_clock(
        &config,
        Box::new(DeadReckoningSolver::new()),
    ));

    let (odo_tx, odo_plugin) = OdometryPosePlugin::channel("sim-odometry");
    let (marker_tx, marker_plugin) = LandmarkPlugin::channel("sim-markers");
    let recorder = TrajectoryRecorder::new("trajectory");
    let log_handle = recorder.handle();

    mapper.set_primary_pose_plugin(Box::new(odo_plugin));
    mapper.add_measurement_plugin(Box::new(marker_plugin));
    mapper.add_output_plugin(Box::new(recorder));
    mapper.add_output_plugin(Box::new(SnapshotLogger::new()));

    let m = mapper.clone();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        m.request_stop();
    })
    .expect("Error setting Ctrl-C handler");

    // Simulated robot: one odometry step and one detector pass per tick.
    let producer_mapper = mapper.clone();
    let producer = std::thread::spawn(move || {
        let clock = WallClock;
        let odo_info = Information2D::from_std_dev(0.02, 0.02, 0.01);
        let marker_info = Information2D::from_std_dev(0.05, 0.05, 1.0);
        let mut truth = Pose2D::identity();

        for delta in square_lap() {
            if producer_mapper.stopped() {
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
            let timestamp = clock.now();
            truth = truth.compose(&delta);

            if odo_tx
                .send(OdometryMeasurement {
                    timestamp,
                    delta,
                    information: odo_info,
                })
                .is_err()
            {
                return;
            }

            for (id, marker) in MARKERS.iter().enumerate() {
                let offset = truth.inverse_transform_point(marker);
                let range = (offset.x * offset.x + offset.y * offset.y).sqrt();
                if range > DETECTION_RANGE {
                    continue;
                }
                let _ = marker_tx.send(LandmarkObservation {
                    timestamp,
                    landmark_id: id as u64,
                    offset,
                    information: marker_info,
                });
            }
        }

        // Let the commit window drain the tail of the run.
        std::thread::sleep(Duration::from_secs(config.commit_window_s.ceil() as u64 + 1));
        producer_mapper.request_stop();
    });

    mapper.spin();
    let _ = producer.join();

    let log = log_handle.lock().unwrap();
    log::info!(
        "run complete: {} snapshots, {} degraded cycles, {} poses in final trajectory",
        log.snapshots,
        log.failures,
        log.trajectory.len()
    );

    log::info!("sutra-sim shutdown complete");
}
