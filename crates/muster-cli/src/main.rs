use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod display;
mod ledger;
mod processor;
mod session;

use config::Config;
use display::{FrameSink, NullSink, SnapshotSink};
use muster_core::{OnnxFaceEngine, Roster};
use muster_hw::{Beeper, Camera, FrameSource};
use session::{run_session, SessionConfig, SessionEnd};

#[derive(Parser)]
#[command(name = "muster", about = "Roster-based attendance tracking from a live camera")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the attendance session until Ctrl-C or capture failure
    Run {
        /// Directory of reference images (filename stem = identity name)
        #[arg(long)]
        roster_dir: Option<PathBuf>,
        /// V4L2 device path
        #[arg(long)]
        device: Option<String>,
        /// Directory containing the ONNX model files
        #[arg(long)]
        model_dir: Option<PathBuf>,
        /// Directory the per-day attendance ledgers are written to
        #[arg(long)]
        ledger_dir: Option<PathBuf>,
        /// Cosine similarity threshold for accepting a match
        #[arg(long)]
        threshold: Option<f32>,
        /// Write every Nth annotated frame as PNG into this directory
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
        /// Snapshot interval in frames
        #[arg(long, default_value_t = 30)]
        snapshot_every: u32,
    },
    /// Encode a roster directory and list the identities
    Roster {
        #[arg(long)]
        roster_dir: Option<PathBuf>,
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// Open the camera, grab one frame and report diagnostics
    CameraTest {
        #[arg(long)]
        device: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::from_env();

    match cli.command {
        Commands::Run {
            roster_dir,
            device,
            model_dir,
            ledger_dir,
            threshold,
            snapshot_dir,
            snapshot_every,
        } => {
            if let Some(dir) = roster_dir {
                cfg.roster_dir = dir;
            }
            if let Some(dev) = device {
                cfg.camera_device = dev;
            }
            if let Some(dir) = model_dir {
                cfg.model_dir = dir;
            }
            if let Some(dir) = ledger_dir {
                cfg.ledger_dir = dir;
            }
            if let Some(t) = threshold {
                cfg.accept_threshold = t;
            }

            run_command(cfg, snapshot_dir, snapshot_every).await
        }
        Commands::Roster { roster_dir, model_dir } => {
            if let Some(dir) = roster_dir {
                cfg.roster_dir = dir;
            }
            if let Some(dir) = model_dir {
                cfg.model_dir = dir;
            }
            roster_command(&cfg)
        }
        Commands::CameraTest { device } => {
            if let Some(dev) = device {
                cfg.camera_device = dev;
            }
            camera_test_command(&cfg)
        }
    }
}

/// Start the session on a dedicated blocking thread and race it against
/// Ctrl-C; the signal only sets the stop flag, the loop exits on its own
/// at the next iteration boundary.
async fn run_command(cfg: Config, snapshot_dir: Option<PathBuf>, snapshot_every: u32) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let session_stop = stop.clone();

    let mut handle =
        tokio::task::spawn_blocking(move || attendance_session(cfg, snapshot_dir, snapshot_every, &session_stop));

    tokio::select! {
        res = &mut handle => {
            return res.context("session thread panicked")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, stopping session");
            stop.store(true, Ordering::SeqCst);
        }
    }

    handle.await.context("session thread panicked")?
}

/// Init + Running + Terminated, executed off the async runtime.
fn attendance_session(
    cfg: Config,
    snapshot_dir: Option<PathBuf>,
    snapshot_every: u32,
    stop: &AtomicBool,
) -> Result<()> {
    let mut engine = OnnxFaceEngine::load(&cfg.scrfd_model_path(), &cfg.arcface_model_path())?;

    let roster = Roster::from_image_dir(&cfg.roster_dir, &mut engine)?;
    if roster.is_empty() {
        tracing::warn!(
            dir = %cfg.roster_dir.display(),
            "roster is empty; every detected face will raise an alert"
        );
    }

    // Camera open failure is the one fatal startup error.
    let mut camera = Camera::open(&cfg.camera_device)
        .with_context(|| format!("failed to open capture device {}", cfg.camera_device))?;

    let alert = Beeper::new();

    let mut sink: Box<dyn FrameSink> = match snapshot_dir {
        Some(dir) => Box::new(
            SnapshotSink::new(dir, snapshot_every).context("failed to create snapshot directory")?,
        ),
        None => Box::new(NullSink),
    };

    let session_cfg = SessionConfig {
        ledger_dir: cfg.ledger_dir.clone(),
        accept_threshold: cfg.accept_threshold,
        detect_downscale: cfg.detect_downscale,
    };

    let end = run_session(
        &mut camera,
        &mut engine,
        &roster,
        &alert,
        sink.as_mut(),
        &session_cfg,
        stop,
        &mut || chrono::Local::now().naive_local(),
    );

    // Camera and audio handles release on drop.
    match end {
        SessionEnd::StopRequested => Ok(()),
        SessionEnd::CaptureFailed => bail!("capture device failed; session terminated"),
    }
}

fn roster_command(cfg: &Config) -> Result<()> {
    let mut engine = OnnxFaceEngine::load(&cfg.scrfd_model_path(), &cfg.arcface_model_path())?;
    let roster = Roster::from_image_dir(&cfg.roster_dir, &mut engine)?;

    println!("{} identities in {}:", roster.len(), cfg.roster_dir.display());
    for identity in roster.iter() {
        println!("  {}", identity.name);
    }
    Ok(())
}

fn camera_test_command(cfg: &Config) -> Result<()> {
    let mut camera = Camera::open(&cfg.camera_device)
        .with_context(|| format!("failed to open capture device {}", cfg.camera_device))?;

    let frame = camera.read().context("failed to capture a test frame")?;
    println!(
        "{}: {}x{}, avg brightness {:.1}",
        cfg.camera_device,
        frame.width,
        frame.height,
        frame.avg_brightness()
    );
    Ok(())
}
