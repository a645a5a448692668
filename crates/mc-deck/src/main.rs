//! MemCue Deck - console harness
//!
//! Drives one simulated deck's memory markers from stdin:
//!   pos 0.25                    - move the playhead (normalized)
//!   memory_create_at_current 1  - fire a trigger control
//!   load / unload               - (re)load or eject the track
//!   rate 44100                  - report a new sample rate
//!   list                        - print cached memory markers
//!   quit

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;

use mc_core::{FramePos, Marker, MarkerKind, SampleRate};
use mc_engine::{MarkerDeck, PositionSource, marker_at_position};
use mc_state::{MarkerPreferences, Track};

#[derive(Parser)]
#[command(name = "mc-deck", about = "Memory marker deck harness")]
struct Cli {
    /// Preferences file (defaults to the per-user location)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// JSON file with the track's markers
    #[arg(short, long)]
    markers: Option<PathBuf>,

    /// Track duration in seconds
    #[arg(short, long, default_value_t = 300.0)]
    duration: f64,

    /// Engine sample rate (Hz)
    #[arg(short, long)]
    sample_rate: Option<u32>,
}

/// One entry of a marker file
#[derive(Debug, Deserialize)]
struct MarkerEntry {
    #[serde(default)]
    kind: MarkerKind,
    #[serde(default)]
    index: Option<u32>,
    /// Start position in seconds
    start: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let prefs = match &cli.prefs {
        Some(path) => MarkerPreferences::load_from(path),
        None => MarkerPreferences::load(),
    }
    .sanitized();

    let sample_rate = cli.sample_rate.unwrap_or(prefs.default_sample_rate);
    if sample_rate == 0 {
        bail!("Sample rate must be positive");
    }
    if SampleRate::from_hz(sample_rate).is_none() {
        log::warn!("Non-standard sample rate {} Hz", sample_rate);
    }

    let entries = match &cli.markers {
        Some(path) => read_markers(path)?,
        None => Vec::new(),
    };

    let deck = MarkerDeck::new(&prefs);
    deck.lifecycle.on_sample_rate_changed(sample_rate);
    deck.position.set_duration_secs(cli.duration);

    let track = Arc::new(build_track(&entries, sample_rate));
    deck.lifecycle.on_track_loaded(Some(track.clone()));
    log::info!("Deck ready: '{}', {} markers", track.title(), track.len());

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next();

        if matches!(command, "quit" | "exit") {
            break;
        }
        if let Err(e) = run_command(&mut out, &deck, &track, command, arg) {
            writeln!(out, "error: {:#}", e)?;
        }

        let rate = deck.navigator().deck().sample_rate();
        apply_seeks(&mut out, &deck, rate)?;
        print_probe(&mut out, &deck, &track, &prefs, rate)?;
    }

    Ok(())
}

fn run_command(
    out: &mut impl Write,
    deck: &MarkerDeck,
    track: &Arc<Track>,
    command: &str,
    arg: Option<&str>,
) -> Result<()> {
    match command {
        "pos" => deck.position.set_play_position(parse_arg(arg, "pos")?),
        "load" => deck.lifecycle.on_track_loaded(Some(track.clone())),
        "unload" => deck.lifecycle.on_track_unloaded(),
        "rate" => deck.lifecycle.on_sample_rate_changed(parse_arg(arg, "rate")?),
        "list" => print_markers(out, deck, deck.navigator().deck().sample_rate())?,
        control => {
            let value: f64 = match arg {
                Some(_) => parse_arg(arg, control)?,
                None => 1.0,
            };
            let changed = deck.controls.trigger_by_name(control, value)?;
            writeln!(out, "{} -> {}", control, if changed { "ok" } else { "no-op" })?;
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(arg: Option<&str>, command: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let arg = arg.with_context(|| format!("'{}' needs a value", command))?;
    arg.parse()
        .with_context(|| format!("Invalid value for '{}': {}", command, arg))
}

fn read_markers(path: &Path) -> Result<Vec<MarkerEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid marker file {}", path.display()))
}

fn build_track(entries: &[MarkerEntry], sample_rate: u32) -> Track {
    Track::with_markers(
        "Deck 1",
        entries.iter().map(|e| {
            let start = FramePos::from_seconds(e.start, sample_rate);
            Marker::new(e.kind, e.index, start, start)
        }),
    )
}

/// Apply pending seeks to the simulated transport
fn apply_seeks(out: &mut impl Write, deck: &MarkerDeck, sample_rate: u32) -> Result<()> {
    if let Some(target) = deck.seeks.latest() {
        deck.position.set_frame(target, sample_rate);
        writeln!(out, "seek -> {:.3} s", target.to_seconds(sample_rate))?;
    }
    Ok(())
}

fn print_markers(out: &mut impl Write, deck: &MarkerDeck, sample_rate: u32) -> Result<()> {
    let markers = deck.navigator().memory_markers();
    if markers.is_empty() {
        writeln!(out, "(no memory markers)")?;
    }
    for marker in markers {
        let index = marker
            .index
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(out, "[{}] {:.3} s", index, marker.start.to_seconds(sample_rate))?;
    }
    Ok(())
}

/// Report whether the playhead sits on a memory marker
fn print_probe(
    out: &mut impl Write,
    deck: &MarkerDeck,
    track: &Track,
    prefs: &MarkerPreferences,
    sample_rate: u32,
) -> Result<()> {
    if deck.lifecycle.loaded_track().is_none() {
        return Ok(());
    }
    let track_samples =
        FramePos::from_seconds(deck.position.duration_secs(), sample_rate).to_engine_sample_pos();
    let play_position = deck.position.play_position();
    if let Some(marker) = marker_at_position(track, play_position, track_samples, prefs.probe_tolerance) {
        writeln!(out, "on marker at {:.3} s", marker.start.to_seconds(sample_rate))?;
    }
    Ok(())
}
