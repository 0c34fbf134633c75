use std::{path::PathBuf, thread, time::Duration};

use clap::{Parser, Subcommand};
use infinity_comet_core::{
    compute_all_paths, AppConfig, Color, CurveKind, Display, Framebuffer, MonotonicClock, Scene,
    TickSource,
};
use tracing_subscriber::EnvFilter;

const PREVIEW_COLS: u32 = 55;
const PREVIEW_ROWS: u32 = 22;

fn main() -> infinity_comet_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "infinity comet");

    match cli.command {
        Commands::Run {
            config,
            ticks,
            preview_every,
        } => run(load_config(config.as_ref())?, ticks, preview_every),
        Commands::Paths { config, curve } => print_paths(&load_config(config.as_ref())?, curve),
    }
}

fn load_config(path: Option<&PathBuf>) -> infinity_comet_core::Result<AppConfig> {
    let config = match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::from_json_file(path)?
        }
        None => AppConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run(
    config: AppConfig,
    ticks: Option<u64>,
    preview_every: Option<u64>,
) -> infinity_comet_core::Result<()> {
    let clock = MonotonicClock::start();
    let mut display = Display::with_default_buffer(config.display.clone())
        .inspect_err(|err| tracing::error!(%err, "display initialization failed"))?;
    let (width, height) = display.size();
    let mut framebuffer = Framebuffer::new(width, height);

    let mut scene = Scene::new(&config, &mut display)?;
    scene.start(clock.now_ms(), &mut display)?;

    let interval = Duration::from_millis(config.animation.tick_interval_ms);
    let legend = preview_legend(&config);
    let preview_every = preview_every.filter(|every| *every > 0);
    let mut tick = 0u64;
    while ticks.map_or(true, |limit| tick < limit) {
        let now = clock.now_ms();
        scene.pump(now, &mut display)?;
        display.tick(now, &mut framebuffer);
        tick += 1;

        if let Some(every) = preview_every {
            if tick % every == 0 {
                println!(
                    "{}",
                    framebuffer.to_ascii(PREVIEW_COLS, PREVIEW_ROWS, &legend)
                );
            }
        }
        thread::sleep(interval);
    }

    let refreshes = display.refreshes();
    tracing::info!(ticks = tick, refreshes = refreshes, "animation stopped");
    Ok(())
}

fn print_paths(config: &AppConfig, curve: Option<CurveKind>) -> infinity_comet_core::Result<()> {
    let paths = compute_all_paths(&config.curve, config.curve_offsets());
    let stdout = std::io::stdout().lock();
    match curve {
        Some(kind) => serde_json::to_writer_pretty(stdout, paths.get(kind))?,
        None => serde_json::to_writer_pretty(
            stdout,
            &serde_json::json!({
                "base": paths.base,
                "outer": paths.outer,
                "third": paths.third,
            }),
        )?,
    }
    println!();
    Ok(())
}

fn preview_legend(config: &AppConfig) -> Vec<(Color, char)> {
    let glyphs = ['@', '+', '*'];
    CurveKind::ALL
        .iter()
        .zip(glyphs)
        .map(|(kind, glyph)| (config.style.line_style(*kind).color, glyph))
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated infinity comet for small displays", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the animation loop against the software display.
    Run {
        /// Optional JSON configuration file. Missing fields use the defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many ticks instead of running forever.
        #[arg(long)]
        ticks: Option<u64>,
        /// Print an ASCII preview of the screen every N ticks.
        #[arg(long)]
        preview_every: Option<u64>,
    },
    /// Print the sampled paths as JSON.
    Paths {
        /// Optional JSON configuration file. Missing fields use the defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Only print this curve (base, outer or third).
        #[arg(long)]
        curve: Option<CurveKind>,
    },
}
