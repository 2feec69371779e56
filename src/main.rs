// SPDX-License-Identifier: GPL-3.0-only

use camara::app::AppContext;
use camara::backends::camera::{CameraBackendType, FacingMode, get_backend};
use camara::config::{Config, default_storage_root};
use camara::constants::app_info;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camara")]
#[command(about = "Take photos and keep them in a local photo cache")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Use an image file as the camera instead of PipeWire
    #[arg(long, global = true, value_name = "IMAGE")]
    source: Option<PathBuf>,

    /// Directory holding the photo and app shell caches
    #[arg(long, global = true, value_name = "DIR")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo and store it in the photo cache
    Photo {
        /// Preferred camera facing (user or environment)
        #[arg(short, long)]
        facing: Option<FacingMode>,
    },

    /// List stored photos
    Gallery {
        /// Copy every stored photo into this directory
        #[arg(short, long, value_name = "DIR")]
        export: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The terminal UI owns the screen, so its logs go to a file
    init_logging(cli.command.is_none());

    let mut config = Config::load();
    if let Some(source) = cli.source {
        config.backend = CameraBackendType::StillImage;
        config.still_image_path = Some(source);
    }
    if let Some(storage) = cli.storage {
        config.storage_root = Some(storage);
    }

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command {
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Photo { facing }) => {
            if let Some(facing) = facing {
                config.default_facing = facing;
            }
            rt.block_on(cli::take_photo(&config))
        }
        Some(Commands::Gallery { export }) => rt.block_on(cli::gallery(&config, export.as_deref())),
        None => rt.block_on(async {
            let backend = get_backend(config.backend, config.still_image_path.clone());
            let ctx = AppContext::start(&config, backend).await;
            camara::terminal::run(ctx, config.mirror_preview).await?;
            Ok::<(), Box<dyn std::error::Error>>(())
        }),
    }
}

/// Set RUST_LOG to control the level, e.g. RUST_LOG=camara=debug
fn init_logging(to_file: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if to_file {
        let dir = default_storage_root();
        let file = std::fs::create_dir_all(&dir)
            .and_then(|_| std::fs::File::create(dir.join(app_info::LOG_FILE)));
        if let Ok(file) = file {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}
