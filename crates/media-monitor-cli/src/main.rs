mod commands;
mod input;
mod logging;
mod progress;

use std::io::{self, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use input::Input;
use media_monitor_core::catalog::snapshot;
use media_monitor_core::dispatcher::approve_all;
use media_monitor_core::{
    AppConfig, ApprovalGate, DirectoryWatcher, Engine, Event, LocalFilesystem, MediaRecord,
    Pattern, RescanSummary, SharedCatalog, TaskQueue,
};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config =
        media_monitor_core::config::load_configuration().context("loading configuration")?;

    let args = Cli::parse();

    if let Err(e) = dispatch(args, &config) {
        error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}

fn dispatch(args: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match args.command {
        Some(Commands::Run) => run_monitor(config)?,
        Some(Commands::Rescan) => run_rescan(config)?,
        Some(Commands::Dump) => {
            let catalog = load_catalog(config)?;
            dump_catalog(&catalog)?;
        }
        Some(Commands::Query { terms }) => run_query(config, &terms)?,
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        Some(Commands::InitConfig { path }) => {
            config.save(&path)?;
            info!("Configuration written to {}", path.display());
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn load_catalog(config: &AppConfig) -> anyhow::Result<SharedCatalog> {
    let path = config.catalog_path();
    let catalog = snapshot::load(&path)
        .with_context(|| format!("loading catalog snapshot {}", path.display()))?;
    Ok(SharedCatalog::new(catalog))
}

fn build_engine(config: &AppConfig, catalog: SharedCatalog) -> anyhow::Result<Engine> {
    let engine = Engine::new(config.clone(), catalog, Arc::new(LocalFilesystem))
        .with_context(|| format!("opening watch root {:?}", config.watch_paths.first()))?
        .with_gate(approval_gate(config));
    Ok(engine)
}

fn approval_gate(config: &AppConfig) -> ApprovalGate {
    if !config.dry_run {
        return approve_all();
    }
    let gate: ApprovalGate = Arc::new(|event: &Event| {
        info!("{} {}", "[dry run]".yellow(), event);
        false
    });
    gate
}

fn run_monitor(config: &AppConfig) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel();
    input::spawn_interrupt_listener(tx.clone()).context("installing Ctrl-C handler")?;
    input::spawn_line_reader(BufReader::new(io::stdin()), tx)?;
    monitor(config, rx)
}

/// Watch and serve interactive commands until `q`, end of input or Ctrl-C,
/// then stop the watcher, drain the worker and save the snapshot.
fn monitor(config: &AppConfig, inputs: Receiver<Input>) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let catalog_path = config.catalog_path();
    let engine = Arc::new(build_engine(config, catalog.clone())?);
    let queue = TaskQueue::spawn(catalog.clone())?;
    let watcher = DirectoryWatcher::start(engine.watch_root(), engine.clone())?;

    info!("Commands: d = dump, u = rescan, s = save, f <field=value>... = query, q = quit");

    for input in inputs.iter() {
        let line = match input {
            Input::Line(line) => line,
            Input::EndOfInput => break,
            Input::Interrupt => {
                warn!("Interrupted");
                break;
            }
        };
        match line.trim() {
            "" => {}
            "d" => dump_catalog(&catalog)?,
            "u" => match engine.rescan(&CliReporter::new()) {
                Ok(summary) => print_summary(&summary),
                Err(e) => error!("Rescan aborted: {}", e),
            },
            "s" => save_catalog(&catalog, &catalog_path)?,
            "q" => break,
            other => match other.strip_prefix("f ") {
                Some(terms) => {
                    let terms: Vec<&str> = terms.split_whitespace().collect();
                    match Pattern::parse_terms(&terms) {
                        Ok(pattern) => queue.query(pattern, print_records)?,
                        Err(e) => warn!("{}", e),
                    }
                }
                None => warn!("Unknown command '{}'", other),
            },
        }
    }

    info!("Shutting down...");
    drop(watcher);
    let executed = queue.shutdown()?;
    info!("Catalog worker drained after {} tasks", executed);
    save_catalog(&catalog, &catalog_path)?;

    Ok(())
}

fn run_rescan(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let engine = build_engine(config, catalog.clone())?;
    let summary = engine.rescan(&CliReporter::new())?;
    print_summary(&summary);
    if !config.dry_run {
        save_catalog(&catalog, &config.catalog_path())?;
    }
    Ok(())
}

fn run_query(config: &AppConfig, terms: &[String]) -> anyhow::Result<()> {
    let pattern = Pattern::parse_terms(terms)?;
    let catalog = load_catalog(config)?;
    let queue = TaskQueue::spawn(catalog)?;

    let (tx, rx) = mpsc::channel();
    queue.query(pattern, move |records| {
        let _ = tx.send(records);
    })?;
    queue.shutdown()?;

    let records = rx.recv().context("query produced no result")?;
    print_records(records);
    Ok(())
}

fn save_catalog(catalog: &SharedCatalog, path: &Path) -> anyhow::Result<()> {
    catalog
        .save(path)
        .with_context(|| format!("saving catalog snapshot {}", path.display()))?;
    info!("Catalog saved to {}", path.display());
    Ok(())
}

fn dump_catalog(catalog: &SharedCatalog) -> anyhow::Result<()> {
    let catalog = catalog.snapshot()?;
    println!("{} {}", "Root:".bold(), catalog.root_dir());
    println!("{}", "Tags:".bold());
    for (tag, count) in catalog.tags() {
        println!("  {} {}", tag.cyan(), count);
    }
    print_records(catalog.records().to_vec());
    Ok(())
}

fn print_records(records: Vec<MediaRecord>) {
    println!("{} {}", "Records:".bold(), records.len());
    for record in &records {
        println!("  {}", record);
    }
}

fn print_summary(summary: &RescanSummary) {
    info!(
        "Rescan: {} entries, {} applied in {}",
        format!("{}", summary.observed).green(),
        format!("{}", summary.applied).green(),
        format!("{:.2}s", summary.duration.as_secs_f64()).green(),
    );
    for (action, count) in &summary.actions {
        info!("  {:?}: {}", action, format!("{}", count).cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> AppConfig {
        let root = dir.join("watch");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("photo.jpg"), "pixels").unwrap();
        AppConfig {
            watch_paths: vec![root.to_string_lossy().into_owned()],
            catalog_path: dir.join("catalog.db").to_string_lossy().into_owned(),
            dry_run: false,
        }
    }

    #[test]
    fn test_interrupt_saves_catalog() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path());

        let (tx, rx) = mpsc::channel();
        tx.send(Input::Line("u".to_string())).unwrap();
        tx.send(Input::Interrupt).unwrap();
        tx.send(Input::Line("unreachable".to_string())).unwrap();
        monitor(&config, rx).unwrap();

        let saved = snapshot::load(&config.catalog_path()).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved.records()[0].file, "photo.jpg");
    }

    #[test]
    fn test_end_of_input_saves_catalog() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path());

        let (tx, rx) = mpsc::channel();
        input::spawn_line_reader(io::Cursor::new("u\n"), tx).unwrap();
        monitor(&config, rx).unwrap();

        assert_eq!(snapshot::load(&config.catalog_path()).unwrap().len(), 1);
    }
}
