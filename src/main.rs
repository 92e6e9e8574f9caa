mod app;
mod cafe;
mod config;
mod layout;
mod util;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cafe::DatasetSource;
use crate::layout::LayoutMode;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Café records (JSON array, or an object with a `cafes` array).
    #[arg(long, default_value = "data/cafes.json")]
    cafes: PathBuf,

    /// Event records attached to cafés by `cafeId`.
    #[arg(long)]
    events: Option<PathBuf>,

    /// Visual and physics tuning overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LayoutMode::Cluster)]
    layout: LayoutMode,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = config::load_config(args.config.as_deref())?;
    let source = DatasetSource {
        cafes_path: args.cafes,
        events_path: args.events,
    };
    let layout = args.layout;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Café orbit",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(app::CafeMapApp::new(cc, source, config, layout)))
        }),
    )
    .map_err(|error| anyhow::anyhow!("failed to start the window: {error}"))
}
