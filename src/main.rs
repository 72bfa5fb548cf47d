use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use window_crc32::checkpoint::EncodedStore;
use window_crc32::scan::find_matches;
use window_crc32::{CheckpointStore, Config, WindowCrc32};

#[derive(Parser, Debug)]
#[clap(version, about)]
/// Searches a file for a range of --size bytes whose CRC-32 is --hash
struct Cli {
    #[clap(long)]
    /// The file to search in
    file: PathBuf,
    #[clap(long)]
    /// Size in bytes of the moving CRC window
    size: usize,
    #[clap(long)]
    /// CRC-32 to search for, in hex
    hash: String,
    #[clap(long, default_value_t = 0)]
    /// Checkpoint the roll table every N steps into a new --checkpoint-file; 0 resumes from an existing one
    checkpoint: usize,
    #[clap(long)]
    /// Roll table checkpoint file to (re)store state with
    checkpoint_file: PathBuf,
    #[clap(long, default_value_t = 1)]
    /// Number of threads computing the roll table
    threads: usize,
    #[clap(long)]
    /// Report every match instead of stopping at the first one
    all: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli: Cli = Cli::parse();

    if cli.size == 0 {
        bail!("--size must be greater than 0");
    }
    let target = u32::from_str_radix(cli.hash.trim_start_matches("0x"), 16)
        .with_context(|| format!("{} is not a hex CRC-32", cli.hash))?;

    let store = if cli.checkpoint == 0 {
        info!(
            "Resuming roll table checkpoints from {}",
            cli.checkpoint_file.display()
        );
        let mut checkpoint_file = File::open(&cli.checkpoint_file)?;
        EncodedStore::read_from(&mut checkpoint_file)?
    } else {
        info!(
            "Creating a new checkpoint file {} with a checkpoint every {} steps",
            cli.checkpoint_file.display(),
            cli.checkpoint
        );
        EncodedStore::new(cli.checkpoint)?
    };

    let config = Config {
        window: cli.size,
        threads: cli.threads,
        ..Config::default()
    };
    let scanned = scan(&cli, &config, &store, target);

    // the checkpoints are worth keeping even if the scan itself failed
    save_store(&store, &cli.checkpoint_file)?;
    scanned
}

fn scan(cli: &Cli, config: &Config, store: &EncodedStore, target: u32) -> anyhow::Result<()> {
    let mut roller = WindowCrc32::with_config(config, Some(store))?;

    info!(
        "Searching {} for {} bytes with CRC-32 {:08x}",
        cli.file.display(),
        config.window,
        target
    );
    let file = File::open(&cli.file)?;
    let progress = ProgressBar::new(file.metadata()?.len());
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")?
            .progress_chars("=>-"),
    );

    let matches = find_matches(&mut progress.wrap_read(file), &mut roller, target, cli.all)?;
    progress.finish_and_clear();

    if matches.is_empty() {
        info!("No {} byte range of {} matches", config.window, cli.file.display());
    }
    for found in matches {
        println!("found data at {} to {}", found.start, found.end);
        println!(
            "dd if={} of=test skip={} bs=1 count={}",
            cli.file.display(),
            found.start,
            found.len()
        );
        println!();
    }
    Ok(())
}

fn save_store(store: &EncodedStore, path: &Path) -> anyhow::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    store.write_to(&mut out)?;
    out.flush()?;
    info!(
        "Saved {} byte window checkpoints to {}",
        store.window(),
        path.display()
    );
    Ok(())
}
