use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::shaders;

pub fn run(args: Args) -> Result<()> {
    initialise_tracing();

    let config = build_config(&args)?;
    tracing::info!(
        mode = ?config.window_mode,
        stages = config.shaders.len(),
        spirv = cfg!(feature = "spirv"),
        "starting vitore"
    );
    Renderer::new(config).run()
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> Result<RendererConfig> {
    let shaders = shaders::bundled_shaders().context("failed to load bundled shaders")?;
    Ok(RendererConfig {
        window_mode: args.window_mode(),
        shaders,
        ..RendererConfig::default()
    })
}
