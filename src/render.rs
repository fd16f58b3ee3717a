// Clubgrid - Club Membership Visualizer
// Copyright (c) 2025 Filipe da Veiga Ventura Alves
// Licensed under MIT License

// Headless renderer: snapshot JSON in, SVG out.
// Run with: cargo run --bin clubgrid_render -- snapshot.json --out clubs.svg

use anyhow::{Context, Result};
use clap::Parser;
use clubgrid::backend::{RecordingSurface, SvgSurface};
use clubgrid::{FixedViewport, GridVisualizer, LegendState, Renderer, Snapshot, VisualizerSettings};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clubgrid_render")]
#[command(about = "Render a club membership snapshot to SVG", long_about = None)]
struct Cli {
    /// Snapshot JSON file. A demo population is generated when omitted
    snapshot: Option<PathBuf>,

    /// Output SVG file path
    #[arg(long, short, default_value = "clubs.svg")]
    out: PathBuf,

    /// Logical surface width
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Logical surface height
    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Device pixels per logical unit
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f32,

    /// Seed for member offsets and the demo population
    #[arg(long)]
    seed: Option<u64>,

    /// Settings JSON file (defaults to clubgrid_settings.json when present)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Also dump the recorded draw commands as JSON
    #[arg(long)]
    commands: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.settings {
        Some(path) => VisualizerSettings::load_from_disk(path)
            .with_context(|| format!("loading settings {}", path.display()))?,
        None => VisualizerSettings::load_or_default(&VisualizerSettings::default_path()),
    };
    if cli.seed.is_some() {
        settings.set_seed(cli.seed);
    }

    let mut rng = settings.make_rng();
    let snapshot = match &cli.snapshot {
        Some(path) => Snapshot::load_from_disk(path)?,
        None => Snapshot::random(
            settings.demo_clubs,
            settings.demo_people,
            settings.demo_memberships,
            settings.demo_r_share,
            &mut rng,
        ),
    };
    let club_count = snapshot.clubs().len();

    let viewport = FixedViewport::new(cli.width, cli.height).with_pixel_ratio(cli.pixel_ratio);
    let mut visualizer = GridVisualizer::with_rng(settings, LegendState::default(), rng);

    let mut svg = SvgSurface::new();
    visualizer.initialize(snapshot, &viewport, &mut svg);
    svg.write_to(&cli.out)?;

    if let Some(path) = &cli.commands {
        let mut recording = RecordingSurface::new();
        visualizer.resize(&viewport, &mut recording);
        visualizer.draw(&mut recording);
        fs::write(path, recording.to_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let counts = visualizer.legend().counts.unwrap_or_default();
    println!(
        "Rendered {} clubs ({} R / {} B) to {}",
        club_count,
        counts.r,
        counts.b,
        cli.out.display()
    );
    Ok(())
}

fn main() {
    use env_logger::Env;
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .init();

    if let Err(err) = run(Cli::parse()) {
        log::error!("{err:?}");
        std::process::exit(1);
    }
}
