//! tabulado CLI - tabular ingestion and normalization tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tabulado::prelude::*;

const DEFAULT_DATA_DIR: &str = "archivos_subidos/datos";

#[derive(Parser)]
#[command(name = "tabulado")]
#[command(
    author,
    version,
    about = "Decode tabular uploads, clean and type them, persist as Parquet"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a file decodes to: shape, columns, warnings
    Info {
        /// Input file (csv, tsv, txt, json, parquet, feather, dta, sav, sas7bdat, rds, rda)
        input: PathBuf,

        /// Force a field delimiter for text files (a single character, or "tab")
        #[arg(long)]
        delimiter: Option<String>,

        /// Object to pick from an R workspace (default: first)
        #[arg(long)]
        r_object: Option<String>,

        /// Keep rows and columns that are entirely blank
        #[arg(long)]
        keep_blank: bool,

        /// Use the first data row as column names
        #[arg(long)]
        header_row: bool,

        /// Skip automatic numeric inference
        #[arg(long)]
        no_infer: bool,

        /// Numeric inference threshold (0.40 to 0.95)
        #[arg(long, default_value_t = 0.70)]
        threshold: f64,
    },

    /// Decode, clean and infer, then write CSV to stdout or a file
    Convert {
        /// Input file
        input: PathBuf,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force a field delimiter for text files (a single character, or "tab")
        #[arg(long)]
        delimiter: Option<String>,

        /// Object to pick from an R workspace (default: first)
        #[arg(long)]
        r_object: Option<String>,

        /// Keep rows and columns that are entirely blank
        #[arg(long)]
        keep_blank: bool,

        /// Use the first data row as column names
        #[arg(long)]
        header_row: bool,

        /// Skip automatic numeric inference
        #[arg(long)]
        no_infer: bool,

        /// Numeric inference threshold (0.40 to 0.95)
        #[arg(long, default_value_t = 0.70)]
        threshold: f64,
    },

    /// Run the full pipeline and persist the dataset with a pointer update
    Save {
        /// Input file
        input: PathBuf,

        /// Directory for the Parquet files and the pointer
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Force a field delimiter for text files (a single character, or "tab")
        #[arg(long)]
        delimiter: Option<String>,

        /// Object to pick from an R workspace (default: first)
        #[arg(long)]
        r_object: Option<String>,

        /// Keep rows and columns that are entirely blank
        #[arg(long)]
        keep_blank: bool,

        /// Use the first data row as column names
        #[arg(long)]
        header_row: bool,

        /// Skip automatic numeric inference
        #[arg(long)]
        no_infer: bool,

        /// Numeric inference threshold (0.40 to 0.95)
        #[arg(long, default_value_t = 0.70)]
        threshold: f64,
    },

    /// Show the active dataset pointer and its shape
    Active {
        /// Directory holding the pointer
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info {
            input,
            delimiter,
            r_object,
            keep_blank,
            header_row,
            no_infer,
            threshold,
        } => {
            let (outcome, table) = run_pipeline(
                &input, delimiter, r_object, keep_blank, header_row, no_infer, threshold,
            )?;
            show_info(&input, &outcome, &table)
        }
        Commands::Convert {
            input,
            output,
            delimiter,
            r_object,
            keep_blank,
            header_row,
            no_infer,
            threshold,
        } => {
            let (_, table) = run_pipeline(
                &input, delimiter, r_object, keep_blank, header_row, no_infer, threshold,
            )?;
            write_csv(&table, output.as_deref())
        }
        Commands::Save {
            input,
            data_dir,
            delimiter,
            r_object,
            keep_blank,
            header_row,
            no_infer,
            threshold,
        } => {
            let (outcome, table) = run_pipeline(
                &input, delimiter, r_object, keep_blank, header_row, no_infer, threshold,
            )?;
            save_dataset(&input, &data_dir, &outcome, &table)
        }
        Commands::Active { data_dir } => show_active(&data_dir),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_pipeline(
    input: &Path,
    delimiter: Option<String>,
    r_object: Option<String>,
    keep_blank: bool,
    header_row: bool,
    no_infer: bool,
    threshold: f64,
) -> Result<(ReadOutcome, Table)> {
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let upload = Upload::new(name, bytes);

    let read_options = ReadOptions {
        delimiter: delimiter.as_deref().map(parse_delimiter).transpose()?,
        r_object,
    };
    let outcome = read_upload(&upload, &read_options)
        .with_context(|| format!("Failed to decode '{}'", input.display()))?;
    for warning in &outcome.warnings {
        eprintln!("Warning: {warning}");
    }

    let table = process(
        &outcome.table,
        &ProcessOptions {
            drop_blank: !keep_blank,
            header_row,
            infer: !no_infer,
            threshold,
        },
    );
    Ok((outcome, table))
}

fn parse_delimiter(s: &str) -> Result<u8> {
    if s.eq_ignore_ascii_case("tab") || s == "\\t" {
        return Ok(b'\t');
    }
    match s.as_bytes() {
        [b] => Ok(*b),
        _ => bail!("delimiter must be a single ASCII character or \"tab\", got {s:?}"),
    }
}

fn show_info(input: &Path, outcome: &ReadOutcome, table: &Table) -> Result<()> {
    println!("File: {}", input.display());
    println!("Format: {}", outcome.format);
    if let Some(encoding) = outcome.encoding {
        println!("Encoding: {encoding}");
    }
    if let Some(delimiter) = outcome.delimiter {
        println!("Delimiter: {:?}", delimiter as char);
    }
    if !outcome.r_objects.is_empty() {
        println!("R objects: {}", outcome.r_objects.join(", "));
        if let Some(selected) = &outcome.r_selected {
            println!("Selected: {selected}");
        }
    }
    println!("Shape: {} rows x {} columns", table.n_rows(), table.n_cols());
    println!();
    for column in table.columns() {
        println!(
            "  {}: {} ({} non-null)",
            column.name(),
            column_kind(column),
            column.non_null_count()
        );
    }
    Ok(())
}

/// A human label for what a column holds after processing.
fn column_kind(column: &Column) -> &'static str {
    let mut numbers = 0usize;
    let mut texts = 0usize;
    let mut dates = 0usize;
    for cell in column.cells() {
        match cell {
            CellValue::Number(_) => numbers += 1,
            CellValue::Text(_) => texts += 1,
            CellValue::Date(_) => dates += 1,
            CellValue::Null => {}
        }
    }
    match (numbers, texts, dates) {
        (0, 0, 0) => "empty",
        (_, 0, 0) => "numeric",
        (0, _, 0) => "text",
        (0, 0, _) => "date",
        _ => "mixed",
    }
}

fn write_csv(table: &Table, output: Option<&Path>) -> Result<()> {
    let mut writer: csv::Writer<Box<dyn io::Write>> = match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            csv::Writer::from_writer(Box::new(file))
        }
        None => csv::Writer::from_writer(Box::new(io::stdout())),
    };

    writer.write_record(table.column_names())?;
    for idx in 0..table.n_rows() {
        let Some(row) = table.row(idx) else { break };
        let record: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    if let Some(path) = output {
        eprintln!("Wrote {} rows to '{}'", table.n_rows(), path.display());
    }
    Ok(())
}

fn save_dataset(input: &Path, data_dir: &Path, outcome: &ReadOutcome, table: &Table) -> Result<()> {
    let store = DatasetStore::new(data_dir);
    let meta = serde_json::json!({
        "ext": input.extension().map(|e| format!(".{}", e.to_string_lossy())),
        "delimiter": outcome.delimiter.map(|d| (d as char).to_string()),
        "encoding": outcome.encoding,
        "r_object": outcome.r_selected,
    });
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let receipt = store
        .save(table, &name, meta)
        .with_context(|| format!("Failed to save under '{}'", data_dir.display()))?;

    println!("Saved: {}", receipt.path.display());
    println!("Pointer: {}", receipt.pointer_path.display());
    println!("Shape: {} rows x {} columns", table.n_rows(), table.n_cols());
    Ok(())
}

fn show_active(data_dir: &Path) -> Result<()> {
    let store = DatasetStore::new(data_dir);
    let Some(pointer) = store.pointer() else {
        println!("no active dataset");
        return Ok(());
    };
    println!("File: {}", pointer.last_file);
    println!("Path: {}", pointer.last_path.display());
    println!("Original: {}", pointer.original_name);
    println!("Saved at: {}", pointer.saved_at);
    match store.load_active() {
        Some(table) => {
            println!("Shape: {} rows x {} columns", table.n_rows(), table.n_cols());
        }
        None => println!("(backing file is missing or unreadable)"),
    }
    Ok(())
}
