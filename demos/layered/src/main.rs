//! Layered Configuration Demo
//!
//! Binds one application config from three layers, highest precedence first:
//!
//! ```text
//! LAYERED_* environment variables
//! └── layered.<profile>.{toml,yaml,yml}    (profile from --profile or LAYERED_PROFILE)
//!     └── layered.{toml,yaml,yml}
//!         └── built-in defaults
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package layered-demo -- --config-dir demos/layered
//! LAYERED_PROFILE=production cargo run --package layered-demo -- --config-dir demos/layered
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bindery::logging::{self, LoggingConfig};
use bindery::{Binder, Configurable, EnvSource, FileLocator, MapSource};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

const APP: &str = "layered";

#[derive(Parser, Debug)]
#[command(name = "layered-demo")]
#[command(about = "Binds a layered application config and prints where each value came from")]
struct Args {
    /// Directory holding layered.toml and its profile variants
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Configuration profile (overrides LAYERED_PROFILE)
    #[arg(short, long)]
    profile: Option<String>,
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Default, Configurable)]
struct Listen {
    host: String,
    port: u16,
}

#[derive(Debug, Default, Configurable)]
struct Server {
    listen: Listen,
    #[config(",optional")]
    workers: Option<usize>,
}

#[derive(Debug, Default, Configurable)]
struct Upstream {
    url: String,
    #[config(",optional")]
    weight: u32,
}

#[derive(Debug, Default, Configurable)]
struct AppConfig {
    name: String,
    server: Server,
    #[config("upstreams,optional")]
    upstreams: Vec<Upstream>,
    #[config("labels,optional")]
    labels: BTreeMap<String, String>,
    #[config("logging,optional")]
    logging: LoggingConfig,
    /// Filled in after binding.
    #[config("-")]
    started: Option<std::time::SystemTime>,
}

fn defaults() -> MapSource {
    MapSource::from_json(json!({
        "name": APP,
        "server": {
            "listen": { "host": "127.0.0.1", "port": 8080 },
        },
    }))
    .named("defaults")
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let mut locator = FileLocator::new(APP);
    if let Some(dir) = &args.config_dir {
        locator = locator.search_path(dir);
    }
    if let Some(profile) = &args.profile {
        locator = locator.profile(profile);
    }

    let binder = Binder::new()
        .source(EnvSource::new(APP))
        .sources(locator.sources().context("failed to open configuration files")?)
        .source(defaults());

    let mut config = AppConfig::default();
    let provenance = binder
        .resolve(&mut config)
        .context("invalid configuration")?;
    config.started = Some(std::time::SystemTime::now());

    logging::init_from_config(&config.logging);
    info!(
        profile = %locator.current_profile(),
        sources = ?binder.source_names(),
        "Configuration bound"
    );
    if config.upstreams.is_empty() {
        warn!("No upstreams configured");
    }

    println!("{config:#?}");
    println!();
    println!("{:<32} SOURCE", "KEY");
    for (key, origin) in provenance.iter() {
        let source = match origin {
            bindery::Origin::Source(name) => name.as_str(),
            bindery::Origin::Unset => "-",
        };
        println!("{key:<32} {source}");
    }

    Ok(())
}
