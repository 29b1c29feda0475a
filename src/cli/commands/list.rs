//! List command - show cached entries

use super::with_store;
use crate::cache::EntryInfo;
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::CacheResult;
use console::style;
use serde_json::json;

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> CacheResult<()> {
    let entries = with_store(config, |store| store.entries()).await?;

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => println!("{}", style("No cached entries").dim()),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[EntryInfo]) {
    println!(
        "{:<30} {:<16} {:>7} {:>12}",
        style("KEY").bold(),
        style("BACKEND").bold(),
        style("CHUNKS").bold(),
        style("SIZE").bold()
    );
    println!("{}", "-".repeat(68));

    let mut total = 0;
    for entry in entries {
        let chunks = if entry.manifest {
            style(entry.chunks.to_string()).green()
        } else {
            style(entry.chunks.to_string())
        };
        println!(
            "{:<30} {:<16} {:>7} {:>12}",
            entry.key,
            entry.backend,
            chunks,
            format_size(entry.bytes)
        );
        total += entry.bytes;
    }

    println!();
    println!("{} entr(ies), {}", entries.len(), format_size(total));
}

fn print_json(entries: &[EntryInfo]) -> CacheResult<()> {
    let rows: Vec<_> = entries
        .iter()
        .map(|e| {
            json!({
                "key": e.key,
                "backend": e.backend,
                "chunks": e.chunks,
                "bytes": e.bytes,
                "manifest": e.manifest,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_plain(entries: &[EntryInfo]) {
    for entry in entries {
        println!("{}", entry.key);
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
