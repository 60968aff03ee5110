use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytestream::CodecConfig;
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use litewire_tools::{
    decode_table_json, encode_table_json, format_decode_pretty, inspect_table, load_config,
    parse_columns, InspectReport,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "litewire-tools",
    version,
    about = "litewire table inspection, decoding and encoding tools"
)]
struct Cli {
    /// JSON file overriding codec limits.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect table headers and sizes.
    Inspect {
        /// A table file, or a directory of them.
        path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected files.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected files (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode table rows.
    Decode {
        /// Path to the table bytes.
        file: PathBuf,
        /// Comma-separated column kinds, e.g. `int32,string,enum`.
        #[arg(long)]
        columns: String,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Encode JSON rows into a table file.
    Encode {
        /// Comma-separated column kinds.
        #[arg(long)]
        columns: String,
        /// JSON file holding an array of row arrays.
        #[arg(long)]
        input: PathBuf,
        /// Destination file.
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CodecConfig::default(),
    };

    match cli.command {
        Command::Inspect {
            path,
            glob,
            sort,
            limit,
        } => {
            if path.is_dir() {
                let entries = collect_table_entries(&path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    let bytes = fs::read(&entry.path)
                        .with_context(|| format!("read table {}", entry.path.display()))?;
                    match inspect_table(&bytes, &config) {
                        Ok(report) => print_inspect_report(&report),
                        Err(err) => warn!(path = %entry.path.display(), error = %err, "not a table"),
                    }
                }
            } else {
                let bytes =
                    fs::read(&path).with_context(|| format!("read table {}", path.display()))?;
                let report = inspect_table(&bytes, &config)?;
                print_inspect_report(&report);
            }
        }
        Command::Decode {
            file,
            columns,
            format,
        } => {
            let columns = parse_columns(&columns).context("parse columns")?;
            let bytes =
                fs::read(&file).with_context(|| format!("read table {}", file.display()))?;
            let output = decode_table_json(&bytes, &columns, &config)?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&output).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_decode_pretty(&output));
                }
            }
        }
        Command::Encode {
            columns,
            input,
            output,
        } => {
            let columns = parse_columns(&columns).context("parse columns")?;
            let contents = fs::read_to_string(&input)
                .with_context(|| format!("read rows {}", input.display()))?;
            let rows: serde_json::Value =
                serde_json::from_str(&contents).context("parse rows json")?;
            let bytes = encode_table_json(&rows, &columns, &config)?;
            fs::write(&output, &bytes)
                .with_context(|| format!("write table {}", output.display()))?;
            info!(path = %output.display(), bytes = bytes.len(), "table written");
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct TableEntry {
    path: PathBuf,
    size: u64,
}

fn collect_table_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<TableEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(TableEntry { path, size });
    }
    Ok(entries)
}

fn maybe_sort_entries(mut entries: Vec<TableEntry>, sort: Option<InspectSort>) -> Vec<TableEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => entries.sort_by(|a, b| a.path.cmp(&b.path)),
    }
    entries
}

fn print_inspect_report(report: &InspectReport) {
    let header = &report.header;
    println!(
        "version: {} flags: 0x{:02x} rows: {}",
        header.version,
        header.flags.raw(),
        header.row_count
    );
    println!(
        "header: {} bytes body: {} bytes total: {} bytes",
        report.header_len, report.body_len, report.total_len
    );
    if header.row_count > 0 {
        println!(
            "average row: {:.1} bytes",
            report.body_len as f64 / header.row_count as f64
        );
    }
}
