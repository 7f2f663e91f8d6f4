use std::error::Error;
use std::path::PathBuf;

use aloft_geom::DVec3;
use aloft_world::{TerrainConfig, load_config_from_path};
use clap::{Parser, ValueEnum};

mod flight;

use flight::{FlightPlan, PathKind, fly};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PathArg {
    Straight,
    Circle,
}

#[derive(Parser, Debug)]
#[command(name = "aloft", version, about = "Headless fly-through over streamed procedural terrain")]
struct Args {
    /// Terrain config (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<i32>,
    #[arg(long)]
    view_distance: Option<i32>,
    /// Background build threads (0 builds inline)
    #[arg(long)]
    workers: Option<usize>,
    /// Fix feature scatter for reproducible runs
    #[arg(long)]
    scatter_seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = PathArg::Straight)]
    path: PathArg,
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// World units per tick
    #[arg(long, default_value_t = 8.0)]
    speed: f64,
    /// Degrees from +x toward +z
    #[arg(long, default_value_t = 0.0)]
    heading: f64,
    /// Height above ground or water
    #[arg(long, default_value_t = 120.0)]
    altitude: f64,
    #[arg(long, default_value_t = 2000.0)]
    radius: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    start_x: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    start_z: f64,
    #[arg(long, default_value_t = 60)]
    report_every: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => {
            log::info!(target: "app", "loading config from {}", path.display());
            load_config_from_path(path)?
        }
        None => TerrainConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(vd) = args.view_distance {
        cfg.stream.view_distance = vd;
    }
    if let Some(workers) = args.workers {
        cfg.runtime.workers = workers;
    }
    if args.scatter_seed.is_some() {
        cfg.runtime.scatter_seed = args.scatter_seed;
    }
    cfg.validate()?;

    let plan = FlightPlan {
        path: match args.path {
            PathArg::Straight => PathKind::Straight,
            PathArg::Circle => PathKind::Circle,
        },
        start: DVec3::new(args.start_x, 0.0, args.start_z),
        speed: args.speed,
        heading: args.heading.to_radians(),
        altitude: args.altitude,
        radius: args.radius,
        ticks: args.ticks,
        report_every: args.report_every,
    };
    log::info!(
        target: "app",
        "seed={} chunk_size={} view_distance={} workers={} path={:?}",
        cfg.seed,
        cfg.stream.chunk_size,
        cfg.stream.view_distance,
        cfg.runtime.workers,
        plan.path
    );

    let s = fly(cfg, &plan)?;
    println!(
        "ticks={} distance={:.0} constructions={} peak_resident={} evictions={} discarded={} grazes={} touchdowns={} sample_failures={}",
        s.ticks,
        s.distance,
        s.constructions,
        s.peak_resident,
        s.evictions,
        s.discarded,
        s.grazes,
        s.touchdowns,
        s.sample_failures
    );
    println!("biomes: {}", s.biomes.join(", "));
    if let Some(contact) = s.terminal {
        println!("flight ended: {:?}", contact);
    }
    Ok(())
}
