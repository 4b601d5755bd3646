//! `physio-inspect`: run the physio-timeline pipeline over a JSON stream dump.

use anyhow::{Context, Result};
use clap::Parser;
use physio_core::{load_streams, Config, StreamRole};
use physio_timeline::{AlignedRecording, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Inspect a multi-stream physiological recording on a shared timeline.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON array of streams (`metadata`, `timestamps`, `samples`).
    recording: PathBuf,

    /// Optional JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the aligned recording as JSON instead of a text report.
    #[arg(long)]
    json: bool,
}

fn print_report(recording: &AlignedRecording) {
    for role in [StreamRole::SignalB, StreamRole::SignalA] {
        if let Some(summary) = recording.summary(role) {
            println!("{summary}");
        }
    }

    println!();
    for role in StreamRole::ALL {
        let assigned = recording.classification.assignment.get(role);
        match (assigned, recording.classification.rule_for(role)) {
            (Some(index), Some(rule)) => println!("{role:<8} stream {index} ({rule:?})"),
            _ => println!("{role:<8} unassigned"),
        }
    }

    if recording.markers.is_empty() {
        println!("\nNo markers");
        return;
    }
    println!("\nMarkers (s, aligned to first sample):");
    for ((t, label), rank) in recording.markers.iter().zip(recording.marker_positions()) {
        println!("  {t:>10.3}  [{rank}] {label}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let streams = load_streams(&cli.recording)
        .with_context(|| format!("failed to load recording {}", cli.recording.display()))?;
    tracing::info!(streams = streams.len(), path = %cli.recording.display(), "recording loaded");

    let recording = Pipeline::new(&config).run(&streams);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&recording)?);
    } else {
        print_report(&recording);
    }

    Ok(())
}
