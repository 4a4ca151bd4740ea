//! cleanup-lite: find large files and duplicates, clean them up reversibly.
//!
//! The core is a streaming walk ([`scanner`]), a size filter on top of it,
//! a chunked cancellable hasher, a size-bucketed duplicate grouper
//! ([`duplicates`]) and a manifest-backed recycle area ([`recycle`]). Scans
//! run in the background ([`jobs`]) and honor a shared stop/pause handle
//! ([`control`]).
//!
//! [`run_app`] ties the pieces to the command line.

pub mod cli;
pub mod config;
pub mod control;
pub mod duplicates;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod output;
pub mod progress;
pub mod recycle;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use yansi::Paint;

use crate::cli::{
    Cli, Commands, ConfigArgs, DupesArgs, LargeArgs, OutputFormat, RecycleCommand, RecycleTargets,
};
use crate::config::Config;
use crate::control::ScanControl;
use crate::duplicates::{build_hash_pool, DuplicateGroup, FinderStats};
use crate::error::{ExitCode, InterruptedError};
use crate::jobs::{spawn_duplicate_search, spawn_large_file_scan, JobHandle, ScanEvent};
use crate::output::{text, write_json, DuplicatesOutput, LargeFilesOutput, RecycleListOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::recycle::{BatchOutcome, RecycleEntry, RecycleStore, RECYCLE_DIR_NAME};
use crate::scanner::validate_root;

/// Run the command described by `cli`.
///
/// Returns the exit code for a completed command. A command ended by Ctrl+C
/// prints what it found so far and returns [`InterruptedError`].
///
/// # Errors
///
/// Returns an error if the root is invalid, a worker cannot be started, a
/// batch fails entirely, or output cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let control = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{e}");
        ScanControl::new()
    });
    let config = Config::load();
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Large(args) => run_large(args, &config, control, cli.quiet),
        Commands::Dupes(args) => run_dupes(args, config, control, cli.quiet),
        Commands::Recycle(command) => run_recycle(command, cli.quiet),
        Commands::Config(args) => run_config(&args, &config),
    }
}

fn run_large(
    args: LargeArgs,
    config: &Config,
    control: ScanControl,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let root = validate_root(&args.path).context("Invalid scan root")?;
    let min_size = args.min_size.unwrap_or(config.min_size);
    let walker_config = config
        .walker_config()
        .with_follow_symlinks(config.follow_symlinks || args.follow_symlinks);
    let json = args.output == OutputFormat::Json;

    log::info!("Scanning {} for files >= {} bytes", root.display(), min_size);
    let progress = Progress::new(quiet || json);
    let job = spawn_large_file_scan(&root, min_size, walker_config, control)
        .context("Failed to start scan")?;

    let mut files = Vec::new();
    let mut interrupted = false;
    for event in job.receiver().iter() {
        match event {
            ScanEvent::LargeFile(entry) => {
                if !json {
                    progress.suspend(|| println!("{}", text::large_file_line(&entry)));
                }
                files.push(entry);
            }
            ScanEvent::Finished { interrupted: stopped } => interrupted = stopped,
            other => forward_progress(&progress, other),
        }
    }
    progress.finish();
    job.join()?;

    let code = if files.is_empty() {
        ExitCode::NothingFound
    } else {
        ExitCode::Success
    };

    if json {
        let output = LargeFilesOutput::new(&files, min_size, interrupted, code);
        write_json(&output, &mut io::stdout().lock(), true)?;
    } else if !quiet {
        println!("{}", text::large_summary(&files, min_size));
    }

    finish(code, interrupted)
}

fn run_dupes(
    args: DupesArgs,
    mut config: Config,
    control: ScanControl,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let root = validate_root(&args.path).context("Invalid scan root")?;
    apply_dupes_overrides(&mut config, &args);
    let json = args.output == OutputFormat::Json;

    let finder_config = config.finder_config();
    let pool = build_hash_pool(finder_config.io_threads).context("Failed to start hash workers")?;

    log::info!(
        "Searching {} for duplicates >= {} bytes ({}, {} threads)",
        root.display(),
        config.min_size,
        config.algorithm,
        config.io_threads
    );
    let progress = Progress::new(quiet || json);
    let job = spawn_duplicate_search(&root, finder_config, Arc::new(pool), control)
        .context("Failed to start duplicate search")?;

    let (groups, stats, interrupted) = collect_groups(&job, &progress, json);
    progress.finish();
    job.join()?;

    let mut recycled = Vec::new();
    let mut failures = 0;
    if args.recycle_extras && !groups.is_empty() {
        if interrupted {
            log::warn!("Search was interrupted; not recycling anything");
        } else {
            let store = RecycleStore::open(&root).context("Failed to open recycle area")?;
            for group in &groups {
                let outcome = store.move_batch(group.extras());
                failures += outcome.failure_count();
                recycled.extend(outcome.succeeded.into_iter().map(|(original, recycled)| {
                    RecycleEntry { recycled, original }
                }));
            }
        }
    }

    let code = if groups.is_empty() {
        ExitCode::NothingFound
    } else if failures > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    if json {
        let output = DuplicatesOutput::new(&groups, &recycled, &stats, code);
        write_json(&output, &mut io::stdout().lock(), true)?;
    } else if !quiet {
        println!("{}", text::dupes_summary(&groups, &stats));
        if args.recycle_extras && !recycled.is_empty() {
            println!(
                "Moved {} file(s) to {}",
                recycled.len(),
                root.join(RECYCLE_DIR_NAME).display()
            );
        }
    }

    finish(code, interrupted)
}

fn apply_dupes_overrides(config: &mut Config, args: &DupesArgs) {
    if let Some(min_size) = args.min_size {
        config.min_size = min_size;
    }
    if let Some(threads) = args.io_threads {
        config.io_threads = usize::from(threads);
    }
    if let Some(cap) = args.bucket_cap {
        config.bucket_cap = usize::try_from(cap).unwrap_or(usize::MAX);
    }
    if let Some(chunk) = args.chunk_size {
        config.chunk_size = usize::try_from(chunk).unwrap_or(usize::MAX);
    }
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    config.follow_symlinks |= args.follow_symlinks;
}

fn collect_groups(
    job: &JobHandle<ScanEvent>,
    progress: &Progress,
    json: bool,
) -> (Vec<DuplicateGroup>, FinderStats, bool) {
    let mut groups = Vec::new();
    let mut stats = FinderStats::default();
    let mut interrupted = false;

    for event in job.receiver().iter() {
        match event {
            ScanEvent::DuplicateGroup { id, group } => {
                if !json {
                    progress.suspend(|| println!("{}", text::group_block(id, &group)));
                }
                groups.push(group);
            }
            ScanEvent::Stats(s) => stats = s,
            ScanEvent::Finished { interrupted: stopped } => interrupted = stopped,
            other => forward_progress(progress, other),
        }
    }
    (groups, stats, interrupted)
}

fn forward_progress(progress: &Progress, event: ScanEvent) {
    match event {
        ScanEvent::Phase { name, total } => progress.on_phase_start(&name, total),
        ScanEvent::Progress { done, path } => {
            progress.on_progress(done, &path.to_string_lossy());
        }
        ScanEvent::Total(total) => log::debug!("{} files to scan", total),
        _ => {}
    }
}

fn run_recycle(command: RecycleCommand, quiet: bool) -> anyhow::Result<ExitCode> {
    match command {
        RecycleCommand::List { root, output } => {
            let store = RecycleStore::at(&root.join(RECYCLE_DIR_NAME));
            let entries = store.entries();

            if output == OutputFormat::Json {
                write_json(&RecycleListOutput::new(&entries), &mut io::stdout().lock(), true)?;
            } else {
                let mut out = io::stdout().lock();
                for entry in &entries {
                    writeln!(out, "{}", text::recycle_entry_line(entry))?;
                }
                if !quiet {
                    writeln!(out, "{} item(s) in {}", entries.len(), store.dir().display())?;
                }
            }

            Ok(if entries.is_empty() {
                ExitCode::NothingFound
            } else {
                ExitCode::Success
            })
        }
        RecycleCommand::Move { root, paths } => {
            let root = validate_root(&root).context("Invalid recycle root")?;
            let store = RecycleStore::open(&root).context("Failed to open recycle area")?;
            report_batch(&store.move_batch(&paths), "Moved", quiet)
        }
        RecycleCommand::Restore(targets) => {
            let store = existing_store(&targets)?;
            let outcome = if targets.all {
                store.restore_all()
            } else {
                store.restore_batch(&targets.items)
            };
            report_batch(&outcome, "Restored", quiet)
        }
        RecycleCommand::Purge(targets) => {
            let store = existing_store(&targets)?;
            let outcome = if targets.all {
                store.purge_all()
            } else {
                store.purge_batch(&targets.items)
            };
            report_batch(&outcome, "Deleted", quiet)
        }
    }
}

fn existing_store(targets: &RecycleTargets) -> anyhow::Result<RecycleStore> {
    let dir = targets.root.join(RECYCLE_DIR_NAME);
    if !dir.is_dir() {
        anyhow::bail!("No recycle area under {}", targets.root.display());
    }
    Ok(RecycleStore::at(&dir))
}

fn report_batch(outcome: &BatchOutcome, verb: &str, quiet: bool) -> anyhow::Result<ExitCode> {
    if !quiet {
        for (input, result) in &outcome.succeeded {
            println!("{} -> {}", input.display(), result.display());
        }
    }
    for (input, err) in &outcome.failed {
        eprintln!("{} {}: {}", "failed".red().bold(), input.display(), err);
    }

    let summary = outcome.summary(verb);
    if outcome.total_count() == 0 {
        if !quiet {
            println!("Nothing to do");
        }
        return Ok(ExitCode::NothingFound);
    }
    if outcome.success_count() == 0 {
        anyhow::bail!(summary);
    }
    if !quiet {
        println!("{summary}");
    }

    Ok(if outcome.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    })
}

fn run_config(args: &ConfigArgs, config: &Config) -> anyhow::Result<ExitCode> {
    if args.init {
        let path = Config::config_path().context("No configuration directory on this platform")?;
        if path.exists() {
            println!("Configuration already exists at {}", path.display());
        } else {
            Config::default()
                .save_to(&path)
                .context("Failed to write configuration")?;
            println!("Wrote default configuration to {}", path.display());
        }
        return Ok(ExitCode::Success);
    }

    if let Some(path) = Config::config_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(ExitCode::Success)
}

fn finish(code: ExitCode, interrupted: bool) -> anyhow::Result<ExitCode> {
    if interrupted {
        return Err(InterruptedError.into());
    }
    Ok(code)
}
