//! Chatlens — collects chat messages from captured pages of supported sites.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatlens_core::ScanConfig;
use chatlens_runtime::{ExportReport, ScanEngine, Scanner};
use chatlens_store::render_table;

mod replay;

use replay::SnapshotFile;

fn print_help() {
    println!("Chatlens — heuristic chat-log extraction");
    println!();
    println!("Usage: chatlens <command> [options]");
    println!();
    println!("Commands:");
    println!("  replay <host> <dir> [--json]   Scan every *.html frame in <dir> in name order");
    println!("  watch <host> <file> [--json]   Re-scan <file> each interval until Ctrl-C");
    println!("  help                           Show this help message");
    println!();
    println!("Options:");
    println!("  --config <path>   JSON scan configuration (default: environment)");
    println!("  --json            Print the export as JSON after the summary");
}

/// Positional arguments plus the two flags.
struct Args {
    positional: Vec<String>,
    json: bool,
    config: Option<PathBuf>,
}

fn parse_args(raw: &[String]) -> anyhow::Result<Args> {
    let mut args = Args {
        positional: Vec::new(),
        json: false,
        config: None,
    };
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            other if other.starts_with("--") => anyhow::bail!("Unknown option: {}", other),
            _ => args.positional.push(arg.clone()),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ScanConfig> {
    let config = match path {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ScanConfig::from_env()?,
    };
    Ok(config)
}

fn print_export(report: &ExportReport, json: bool) -> anyhow::Result<()> {
    let stats = &report.stats;
    println!("{}", render_table(&report.records));
    println!("Platform: {}", report.platform);
    if let Some(name) = &report.partner_name {
        println!("Partner: {}", name);
    }
    if let Some(handle) = &report.own_handle {
        println!("Me: {}", handle);
    }
    println!("Total: {}", stats.total);
    println!("My messages: {} ({:.1}%)", stats.me, stats.percent(stats.me));
    println!(
        "Other messages: {} ({:.1}%)",
        stats.other,
        stats.percent(stats.other)
    );
    println!("Text: {}", stats.text);
    println!("Images: {}", stats.image);
    println!("With timestamp: {}", stats.with_timestamp);
    println!("Without timestamp: {}", stats.without_timestamp);

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = raw.first() else {
        print_help();
        return Ok(());
    };
    let args = parse_args(&raw[1..])?;

    match command.as_str() {
        "replay" => {
            let [host, dir] = args.positional.as_slice() else {
                eprintln!("Usage: chatlens replay <host> <dir> [--json] [--config <path>]");
                std::process::exit(1);
            };
            let config = load_config(args.config.as_ref())?;
            let report = replay::replay(host, &PathBuf::from(dir), config)?;
            print_export(&report, args.json)?;
        }
        "watch" => {
            let [host, file] = args.positional.as_slice() else {
                eprintln!("Usage: chatlens watch <host> <file> [--json] [--config <path>]");
                std::process::exit(1);
            };
            let config = load_config(args.config.as_ref())?;
            let engine = ScanEngine::start(host, config)?;
            let handle = Scanner::start(engine, SnapshotFile::new(PathBuf::from(file)));

            let mut status = handle.subscribe();
            loop {
                tokio::select! {
                    changed = status.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        info!("{}", *status.borrow_and_update());
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            let report = handle.stop().await;
            print_export(&report, args.json)?;
        }
        "--help" | "-h" | "help" => print_help(),
        other => {
            eprintln!("Unknown command: {}. Use 'chatlens help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
