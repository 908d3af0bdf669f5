//! Command-line interface.
//!
//! Parses arguments using clap and runs one store operation per invocation.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::logging;
use crate::record::{AverageScale, Marks, StudentRecord};
use crate::store::MarksStore;
use crate::table::Delimiter;

/// Edit student exam marks stored in spreadsheet and CSV files
#[derive(Parser, Debug)]
#[command(name = "marksheet", version, about)]
pub struct CliArgs {
    /// JSON store configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read unparsable cells as 0 instead of failing
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every student with derived marks
    List { file: PathBuf },

    /// Show one student
    Show {
        file: PathBuf,
        /// Data row, 1 is the first student
        #[arg(long, default_value_t = 1)]
        row: usize,
    },

    /// Set a student's marks and save the file
    Set {
        file: PathBuf,
        #[arg(long)]
        row: usize,
        #[arg(long, num_args = 3, required = true, value_names = ["EXAM1", "EXAM2", "EXAM3"])]
        marks: Vec<f64>,
        #[arg(long)]
        aat: Option<f64>,
        /// Copy the file before writing
        #[arg(long)]
        backup: bool,
    },

    /// Check every row and report all problems
    Check { file: PathBuf },

    /// Class totals and averages
    Summary { file: PathBuf },

    /// Write the table to a delimited text file
    Export {
        file: PathBuf,
        output: PathBuf,
        /// Defaults to the output file's extension
        #[arg(long, value_enum)]
        delimiter: Option<DelimiterArg>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DelimiterArg {
    Comma,
    Tab,
    Pipe,
    Semicolon,
}

impl From<DelimiterArg> for Delimiter {
    fn from(arg: DelimiterArg) -> Self {
        match arg {
            DelimiterArg::Comma => Delimiter::Comma,
            DelimiterArg::Tab => Delimiter::Tab,
            DelimiterArg::Pipe => Delimiter::Pipe,
            DelimiterArg::Semicolon => Delimiter::Semicolon,
        }
    }
}

/// A record with its derived values, as printed
#[derive(Debug, Serialize)]
struct RecordView {
    row: usize,
    name: String,
    usn: String,
    exams: [f64; 3],
    aat: f64,
    total: f64,
    average: f64,
    scaled_average: f64,
    final_marks: f64,
}

impl RecordView {
    fn new(row: usize, record: &StudentRecord, scale: AverageScale) -> Self {
        Self {
            row,
            name: record.name().to_string(),
            usn: record.usn().to_string(),
            exams: record.exams(),
            aat: record.aat(),
            total: record.total(),
            average: record.average(),
            scaled_average: record.scaled_average(scale),
            final_marks: record.final_marks(scale),
        }
    }

    fn line(&self) -> String {
        format!(
            "{:>4}  {:<12} {:<24} {:>6.2} {:>6.2} {:>6.2}  \
             total {:>7.2}  avg {:>6.2}  final {:>6.2}",
            self.row,
            self.usn,
            self.name,
            self.exams[0],
            self.exams[1],
            self.exams[2],
            self.total,
            self.average,
            self.final_marks
        )
    }
}

pub fn run() -> Result<()> {
    let args = CliArgs::parse();
    logging::init(args.verbose);
    execute(args)
}

fn load_config(args: &CliArgs) -> Result<StoreConfig> {
    let mut config = match args.config {
        Some(ref path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if args.lenient {
        config = config.lenient();
    }
    Ok(config)
}

fn open_store(file: &Path, config: StoreConfig) -> Result<MarksStore> {
    MarksStore::open(file, config).with_context(|| format!("Failed to open {}", file.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn execute(args: CliArgs) -> Result<()> {
    let mut config = load_config(&args)?;
    let scale = config.average_scale;

    match args.command {
        Command::List { ref file } => {
            let store = open_store(file, config)?;
            let mut views = Vec::new();
            for (row, record) in store.records() {
                match record {
                    Ok(record) => views.push(RecordView::new(row, &record, scale)),
                    Err(e) => eprintln!("row {}: {}", row, e),
                }
            }
            if args.json {
                print_json(&views)?;
            } else {
                for view in &views {
                    println!("{}", view.line());
                }
            }
        }
        Command::Show { ref file, row } => {
            let store = open_store(file, config)?;
            let record = store.get_record(row)?;
            let view = RecordView::new(row, &record, scale);
            if args.json {
                print_json(&view)?;
            } else {
                println!("{}", view.line());
                println!(
                    "      previous: {}  next: {}",
                    store.has_previous(row),
                    store.has_next(row)
                );
            }
        }
        Command::Set {
            ref file,
            row,
            ref marks,
            aat,
            backup,
        } => {
            let [exam1, exam2, exam3] = marks.as_slice() else {
                bail!("--marks takes exactly three values");
            };
            let mut new_marks = Marks::new(*exam1, *exam2, *exam3);
            if let Some(aat) = aat {
                new_marks = new_marks.with_aat(aat);
            }

            config.backup_on_save |= backup;
            let mut store = open_store(file, config)?;
            store.update_marks(row, &new_marks)?;
            store
                .save()
                .with_context(|| format!("Failed to save {}", file.display()))?;

            let view = RecordView::new(row, &store.get_record(row)?, scale);
            if args.json {
                print_json(&view)?;
            } else {
                println!("saved {}", view.line());
            }
        }
        Command::Check { ref file } => {
            let store = open_store(file, config)?;
            let report = store.validate();
            if args.json {
                print_json(&report)?;
            } else {
                for issue in &report.issues {
                    println!("row {} {}: {}", issue.row, issue.column_name, issue.message);
                }
                for warning in &report.warnings {
                    println!(
                        "row {} {} (warning): {}",
                        warning.row, warning.column_name, warning.message
                    );
                }
                println!("{} rows checked", report.rows_checked);
            }
            if !report.is_valid {
                bail!("{} problems found in {}", report.issues.len(), file.display());
            }
        }
        Command::Summary { ref file } => {
            let store = open_store(file, config)?;
            let summary = store.summary();
            if args.json {
                print_json(&summary)?;
            } else {
                let show = |value: Option<f64>| {
                    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
                };
                println!("students:   {}", summary.students);
                println!("skipped:    {}", summary.skipped);
                println!("mean total: {}", show(summary.mean_total));
                println!("min total:  {}", show(summary.min_total));
                println!("max total:  {}", show(summary.max_total));
                println!("mean final: {}", show(summary.mean_final));
            }
        }
        Command::Export {
            ref file,
            ref output,
            delimiter,
        } => {
            let delimiter = delimiter.map(Delimiter::from).unwrap_or_else(|| {
                let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("");
                Delimiter::from_extension(ext)
            });
            let store = open_store(file, config)?;
            let written = store
                .export_csv(output, delimiter)
                .with_context(|| format!("Failed to export to {}", output.display()))?;
            println!("exported {} rows to {}", store.data_row_count(), written.display());
        }
    }

    Ok(())
}
