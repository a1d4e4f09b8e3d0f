//! mixid-cli - extract a tracklist from one mix on the command line
//!
//! Prints the merged tracklist as JSON on stdout and saves it to the output
//! folder. Exits non-zero when the run fails.
//!
//! ```text
//! mixid-cli -s "https://soundcloud.com/artist/mix" -c 8
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use mixid_common::config::{resolve_chunk_duration, resolve_output_dir};
use mixid_extract::config::ExtractorConfig;
use mixid_extract::types::LogProgress;
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for mixid-cli
#[derive(Parser, Debug)]
#[command(name = "mixid-cli")]
#[command(about = "Extract the tracklist of a DJ mix")]
#[command(version)]
struct Args {
    /// Mix URL (SoundCloud track page)
    #[arg(short = 's', long, alias = "soundcloud-track", visible_alias = "source")]
    source_url: String,

    /// Chunk duration in seconds (default 10)
    #[arg(short = 'c', long)]
    chunk_duration: Option<u32>,

    /// Folder for tracklists and archived downloads
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the video link lookup
    #[arg(long)]
    no_links: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let toml_config = mixid_common::config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    mixid_common::logging::init_tracing(&toml_config.logging)?;

    let chunk_duration = resolve_chunk_duration(args.chunk_duration, &toml_config)?;
    let output_dir = resolve_output_dir(args.output_dir.as_deref(), &toml_config);

    let workflow = ExtractorConfig::resolve(&toml_config, output_dir, args.no_links)?
        .build_workflow()?;

    info!(
        "Processing {} with chunk duration {}s...",
        args.source_url, chunk_duration
    );

    let output = workflow
        .extract(&args.source_url, chunk_duration, &LogProgress)
        .await
        .context("Extraction failed")?;

    println!("{}", serde_json::to_string_pretty(&output.tracklist)?);
    info!("Saved tracklist to {}", output.output_location.display());
    Ok(())
}
