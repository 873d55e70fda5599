//! Binary entrypoint for the image looper.
//!
//! Scans a directory, then shows each image through the library player on a
//! headless canvas, polling it the way a looper drives any player backend.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use image_looper::config::Configuration;
use image_looper::playlist::{Playlist, scan_images};
use image_looper::render::compositor::Background;
use image_looper::render::loader::Decoder;
use image_looper::render::surface::{Canvas, Surface};
use image_looper::{ImagePlayer, create_player};
use tokio::time::{MissedTickBehavior, interval, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(name = "image-looper", version, about = "Full-screen still image looper")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override the image directory from the config
    #[arg(long, value_name = "DIR")]
    path: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Write every presented frame to DIR/frame.png
    #[arg(long, value_name = "DIR")]
    frames_dir: Option<PathBuf>,

    /// Stop after showing this many images (default: loop forever)
    #[arg(long, value_name = "N")]
    iterations: Option<usize>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("image_looper={}", level).parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?
        .validated()
        .context("invalid configuration values")?;

    let root = cli.path.clone().unwrap_or_else(|| cfg.looper.path.clone());
    let photos = scan_images(&root, &cfg.image_player.extensions)
        .with_context(|| format!("scanning {}", root.display()))?;
    info!(count = photos.len(), root = %root.display(), "scanned images");

    let mut playlist = Playlist::from_paths(photos)?;
    if let Some(seed) = cfg.looper.shuffle_seed {
        playlist.shuffle_with_seed(seed);
    }

    let mut canvas = Canvas::new(cli.width, cli.height);
    if let Some(dir) = &cli.frames_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating frames directory {}", dir.display()))?;
        canvas = canvas.with_output(dir.join("frame.png"));
    }
    let background = Background::load(
        cfg.looper.bgcolor,
        cfg.looper.bgimage.as_deref(),
        canvas.size(),
    )?;
    let mut player = create_player(&cfg, canvas, background);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    run_loop(
        &mut player,
        &mut playlist,
        cfg.looper.wait_time(),
        cli.iterations,
        &cancel,
    )
    .await?;
    info!(
        frames = player.surface().presented(),
        cached = player.cache().len(),
        "looper finished"
    );
    Ok(())
}

async fn run_loop<D: Decoder>(
    player: &mut ImagePlayer<Canvas, D>,
    playlist: &mut Playlist,
    wait_time: Duration,
    iterations: Option<usize>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut tick = interval(POLL_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shown = 0usize;
    let mut consecutive_failures = 0usize;

    while iterations.is_none_or(|n| shown < n) {
        let image = playlist.advance().clone();
        shown += 1;
        if let Err(err) = player.play(&image, None) {
            warn!(path = %image.filename.display(), "skipping image: {err}");
            consecutive_failures += 1;
            if consecutive_failures >= playlist.len() {
                bail!("every image in the playlist failed to display");
            }
            continue;
        }
        consecutive_failures = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    player.stop(Duration::ZERO);
                    return Ok(());
                }
                _ = tick.tick() => {
                    if !player.is_playing() {
                        break;
                    }
                }
            }
        }

        if !wait_time.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    player.stop(Duration::ZERO);
                    return Ok(());
                }
                _ = sleep(wait_time) => {}
            }
        }
    }
    player.stop(Duration::ZERO);
    Ok(())
}
