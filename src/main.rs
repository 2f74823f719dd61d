// Command-line entry point.
//
// Reads an inventory workbook, writes the Results/Alerts/Formulas report
// next to it (or to --output), and prints a short Markdown preview of each
// table. Optional side outputs: a JSON run summary and CSV copies of the
// tables.
use anyhow::{Context, Result};
use clap::Parser;
use inventory_report::output::{preview_table, write_csv_dir, write_json};
use inventory_report::util::format_int;
use inventory_report::{default_output_path, run_analysis, AnalysisConfig, AnalyzerKind};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "inventory-report",
    version,
    about = "Monthly inventory metrics and risk alerts from multi-sheet workbooks"
)]
struct Args {
    /// Input workbook (.xlsx, .xlsm, .xls, .xlsb, .ods or .csv)
    input: PathBuf,

    /// Output workbook; defaults to results_<input>.xlsx next to the input
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON configuration file (analyzer, column aliases, parallelism)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Analyzer to run: inventory or generic
    #[arg(long)]
    analyzer: Option<AnalyzerKind>,

    /// Sheet used by the generic analyzer
    #[arg(long, value_name = "NAME")]
    sheet: Option<String>,

    /// Process sheets in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Also export every table as CSV into this directory
    #[arg(long, value_name = "DIR")]
    csv_dir: Option<PathBuf>,

    /// Rows shown per table in the console preview
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,

    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(kind) = args.analyzer {
        config.analyzer = kind;
    }
    if args.sheet.is_some() {
        config.sheet = args.sheet.clone();
    }
    config.parallel |= args.parallel;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    let report = run_analysis(&args.input, &output, &config)
        .with_context(|| format!("analysing {}", args.input.display()))?;

    if let Some(dir) = &args.csv_dir {
        write_csv_dir(dir, &report).with_context(|| format!("exporting CSV to {}", dir.display()))?;
    }
    if let Some(path) = &args.summary {
        write_json(path, &report.summary)
            .with_context(|| format!("writing summary {}", path.display()))?;
    }

    for table in &report.tables {
        println!(
            "{} ({} rows)\n",
            table.name,
            format_int(table.rows.len())
        );
        println!("{}\n", preview_table(table, args.preview_rows));
    }
    for skipped in &report.summary.skipped {
        println!("Skipped sheet '{}' ({}): {}", skipped.sheet, skipped.stage, skipped.reason);
    }
    println!("Report written to {}", output.display());
    Ok(())
}
