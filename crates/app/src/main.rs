//! Tangent - command-line host for multi-camera surface picking
//!
//! Loads a surface and a pick store, runs one command and writes the store
//! back:
//! - `attach`: re-project a camera's picks onto a fitted tangent primitive
//! - `list`: print the stored cameras and picks
//! - `pick`: select a surface point through a stored camera

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec2;
use picking::{AttachReport, CameraId, MemoryStore, PickSession, PickStore, SurfaceModel};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod surface;

use config::{HostConfig, parse_grid};
use surface::load_surface;

#[derive(Parser, Debug)]
#[command(name = "tangent")]
#[command(about = "Pick surface points and attach them to tangent primitives", long_about = None)]
struct Cli {
    /// Pick store snapshot (created if missing)
    #[arg(long)]
    store: PathBuf,

    /// Surface JSON file
    #[arg(long)]
    surface: PathBuf,

    /// Model the picks belong to (default: TANGENT_MODEL or 0)
    #[arg(long)]
    model: Option<u64>,

    /// Attachment grid as WxH (default: TANGENT_GRID or 10x10)
    #[arg(long, value_parser = parse_grid)]
    grid: Option<(u32, u32)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attach picks to the surface's tangent primitive
    Attach {
        /// Only this camera (default: every camera of the model)
        #[arg(long)]
        camera: Option<u64>,
    },
    /// List cameras and picks
    List,
    /// Pick the surface point under a screen position
    Pick {
        #[arg(long)]
        x: f32,
        #[arg(long)]
        y: f32,
        /// Stored camera to pick through (default: the model's first camera)
        #[arg(long)]
        camera: Option<u64>,
    },
}

type Session = PickSession<MemoryStore, SurfaceModel>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = HostConfig::default().with_overrides(cli.model, cli.grid);
    info!(
        "Starting Tangent for model {} with a {}x{} grid",
        config.model, config.tangent.attach.grid_width, config.tangent.attach.grid_height
    );

    let store = MemoryStore::load_or_default(&cli.store)
        .with_context(|| format!("Failed to load pick store {}", cli.store.display()))?;
    let surface = load_surface(&cli.surface)?;
    let mut session = PickSession::open(
        store,
        surface,
        config.model,
        config.tangent.display,
        config.tangent.attach,
    )?;

    match cli.command {
        Commands::Attach { camera } => {
            run_attach(&mut session, camera)?;
            save(&session, &cli.store)?;
        }
        Commands::List => list(&session)?,
        Commands::Pick { x, y, camera } => {
            if let Some(id) = camera {
                session.select_camera(CameraId(id))?;
            }
            let outcome = session.pick(Vec2::new(x, y))?;
            match outcome.pick {
                Some(pick) => println!(
                    "pick {} on camera {}: screen ({}, {}) world {}",
                    pick.id, pick.camera, pick.screen.x, pick.screen.y, pick.world
                ),
                None => println!("no surface under ({x}, {y})"),
            }
            if let Some(report) = outcome.attachment {
                print_report(&report);
            }
            save(&session, &cli.store)?;
        }
    }

    Ok(())
}

fn run_attach(session: &mut Session, camera: Option<u64>) -> Result<()> {
    let cameras = match camera {
        Some(id) => vec![CameraId(id)],
        None => session.store().cameras_for_model(session.model())?,
    };
    if cameras.is_empty() {
        println!("model {} has no cameras", session.model());
    }

    for id in cameras {
        session
            .select_camera(id)
            .with_context(|| format!("Cannot attach camera {id}"))?;
        if let Some(report) = session.attach()? {
            print_report(&report);
        }
    }
    Ok(())
}

fn print_report(report: &AttachReport) {
    println!(
        "camera {}: {} picks, {} samples, {} hits, boundary {:?}, {} updated, {} unchanged, {} failed",
        report.camera,
        report.picks_considered,
        report.samples,
        report.hits,
        report.boundary.kind(),
        report.updated.len(),
        report.unchanged,
        report.failures.len()
    );
    for (id, error) in &report.failures {
        println!("  pick {id}: {error}");
    }
}

fn list(session: &Session) -> Result<()> {
    let store = session.store();
    for record in store.cameras().iter().filter(|c| c.model == session.model()) {
        let pose = &record.pose;
        println!(
            "camera {}: position {} target {} fovy {} {:?}",
            record.id, pose.position, pose.target, pose.fovy, pose.projection
        );
        for pick in store.picks_for_camera(record.id)? {
            println!(
                "  pick {}: screen ({}, {}) world {}",
                pick.id, pick.screen.x, pick.screen.y, pick.world
            );
        }
    }
    Ok(())
}

fn save(session: &Session, path: &std::path::Path) -> Result<()> {
    session
        .store()
        .save(path)
        .with_context(|| format!("Failed to save pick store {}", path.display()))
}
