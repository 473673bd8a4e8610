//! Watch paths and stream events to stdout

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::info;
use watchmux_watcher::{platform, Event, EventInfo, Watcher, WatcherConfig};

pub fn run(paths: &[PathBuf], events: &str, recursive: bool, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => WatcherConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => WatcherConfig::default(),
    };

    let vocabulary = platform::vocabulary();
    let mut mask = vocabulary
        .parse_list(events)
        .with_context(|| format!("Invalid event list '{}'", events))?;
    if recursive {
        mask |= Event::RECURSIVE;
    }

    let watcher = Watcher::new(config).context("Failed to start watcher")?;
    let (handle, rx) = watcher.channel();

    for path in paths {
        let diff = watcher
            .subscribe(path, &handle, mask)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        info!(path = %path.display(), diff = %diff, "watching");
    }

    eprintln!(
        "{} {} path(s) for {}",
        "Watching".green(),
        watcher.watched().len(),
        vocabulary.describe(mask.strip_control())
    );

    for raw in rx.iter() {
        println!(
            "{}\t{}",
            vocabulary.describe(raw.event()).yellow(),
            raw.path().display()
        );
    }
    Ok(())
}
