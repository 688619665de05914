//! SonicScan - record a clip, find similar songs and manage the song library
//!
//! This is the main entry point for the SonicScan command-line client.

mod app;
mod audio;
mod backend;
mod cli;
mod client;
mod error;
mod models;
mod notify;
mod settings;
mod state;
mod tokio_runtime;
mod view;

use anyhow::{bail, Context};
use app::SonicScan;
use audio::{CaptureConfig, ClipArchive};
use backend::{HttpBackend, DEFAULT_TIMEOUT};
use clap::Parser;
use cli::{Args, Command};
use client::IngestOutcome;
use log::{debug, info};
use state::ActiveView;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments and initialize logging
    let args = Args::parse();
    cli::init_logging(&args);

    info!("Starting SonicScan");

    tokio_runtime::block_on(run(args)).context("Failed to start the async runtime")?
}

async fn run(args: Args) -> anyhow::Result<()> {
    if let Command::Config { backend_url, archive_clips } = &args.command {
        return configure(backend_url.as_deref(), *archive_clips);
    }
    if let Command::Clips = args.command {
        return list_clips();
    }

    let base_url = settings::resolve_backend_url(args.backend_url.clone(), settings::get_backend_url());
    let backend = HttpBackend::new(&base_url, DEFAULT_TIMEOUT).context("Invalid backend URL")?;
    debug!("Using backend at {}", backend.base_url());
    let app = SonicScan::new(Arc::new(backend), app::pipewire_sources());

    let printer = spawn_printer(&app);
    let result = dispatch(&app, args.command).await;

    // Let the printer show the last message before exiting
    tokio::task::yield_now().await;
    app.notifier().clear();
    printer.abort();
    result
}

async fn dispatch(app: &SonicScan, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ping => {
            app.health_check().await?;
            println!("Backend is reachable");
        }
        Command::Identify { seconds, file, keep, raw } => {
            app.startup();
            let mut app = app.clone();
            if keep || settings::get_archive_clips() {
                app = app.with_archive(ClipArchive::new());
            }
            if raw {
                app = app.with_capture_config(CaptureConfig {
                    echo_cancellation: false,
                    noise_suppression: false,
                    auto_gain: false,
                    ..CaptureConfig::default()
                });
            }
            identify(&app, seconds, file.as_deref()).await?;
        }
        Command::Add { input, pick } => {
            app.startup();
            add(app, &input, &pick).await?;
        }
        Command::Library => {
            app.startup();
            app.navigate_to(ActiveView::Library);
            app.refresh_library().await?;
            print!("{}", view::library_table(app.snapshot().library.tracks()));
        }
        Command::Delete { id } => {
            app.startup();
            app.navigate_to(ActiveView::Library);
            app.delete_song(&id).await?;
        }
        Command::Clips | Command::Config { .. } => {}
    }
    Ok(())
}

async fn identify(app: &SonicScan, seconds: Option<u64>, file: Option<&Path>) -> anyhow::Result<()> {
    // Matches from an earlier clip are dismissed before the new query
    app.clear_similar();

    match file {
        Some(path) => {
            let clip = ClipArchive::load(path).map_err(anyhow::Error::msg)?;
            app.identify(clip).await?;
        }
        None => record(app, seconds).await?,
    }

    let state = app.snapshot();
    if !state.similar.is_empty() {
        print!("{}", view::candidate_list(state.similar.tracks()));
    }
    Ok(())
}

/// Record until Enter, Ctrl-C or the time limit, then query with the clip
async fn record(app: &SonicScan, seconds: Option<u64>) -> anyhow::Result<()> {
    app.toggle_recording().await?;

    match seconds {
        Some(secs) => {
            eprintln!("Recording for {} seconds...", secs);
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
        None => {
            eprintln!("Recording... press Enter to stop");
            let mut line = String::new();
            let mut stdin = BufReader::new(tokio::io::stdin());
            tokio::select! {
                read = stdin.read_line(&mut line) => {
                    read.context("Failed to read from stdin")?;
                }
                _ = tokio::signal::ctrl_c() => {
                    debug!("Interrupted, stopping recording");
                }
            }
        }
    }

    app.toggle_recording().await?;
    Ok(())
}

async fn add(app: &SonicScan, input: &str, picks: &[usize]) -> anyhow::Result<()> {
    match app.submit_url(input).await? {
        IngestOutcome::Ingested => {
            if !picks.is_empty() {
                debug!("Ignoring --pick for a direct link");
            }
        }
        IngestOutcome::Candidates(candidates) => {
            if picks.is_empty() {
                print!("{}", view::candidate_list(&candidates));
                return Ok(());
            }

            // Picking removes added tracks from the list, so resolve ids first
            let mut chosen = Vec::with_capacity(picks.len());
            for &pick in picks {
                match pick.checked_sub(1).and_then(|i| candidates.get(i)) {
                    Some(track) => chosen.push(track.clone()),
                    None => bail!("No candidate number {} (found {})", pick, candidates.len()),
                }
            }
            for track in &chosen {
                app.add_to_library(track).await?;
                tokio::task::yield_now().await;
            }
        }
    }
    Ok(())
}

fn configure(backend_url: Option<&str>, archive_clips: Option<bool>) -> anyhow::Result<()> {
    if let Some(url) = backend_url {
        HttpBackend::new(url, DEFAULT_TIMEOUT).context("Invalid backend URL")?;
        settings::set_backend_url(url);
    }
    if let Some(archive) = archive_clips {
        settings::set_archive_clips(archive);
    }

    println!(
        "backend-url: {}",
        settings::resolve_backend_url(None, settings::get_backend_url())
    );
    println!("archive-clips: {}", settings::get_archive_clips());
    Ok(())
}

fn list_clips() -> anyhow::Result<()> {
    let archive = ClipArchive::new();
    let clips = archive.list_clips().map_err(anyhow::Error::msg)?;
    if clips.is_empty() {
        println!("No clips in {}", archive.dir().display());
    }
    for clip in &clips {
        println!("{}", view::clip_line(clip));
    }
    Ok(())
}

/// Print every notification as it appears
fn spawn_printer(app: &SonicScan) -> tokio::task::JoinHandle<()> {
    let mut notifications = app.notifier().subscribe();
    tokio::spawn(async move {
        while notifications.changed().await.is_ok() {
            let current = notifications.borrow_and_update().clone();
            if let Some(notification) = current {
                eprintln!("{}", notification.message);
            }
        }
    })
}
