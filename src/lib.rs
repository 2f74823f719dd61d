// Inventory report library.
//
// Reads multi-sheet inventory workbooks (one row per product per day) and
// produces a report workbook with three sheets: Results (monthly totals and
// derived metrics per sheet, product and month), Alerts (threshold breaches)
// and Formulas (a fixed reference of every formula and threshold).
//
// Sheets that do not look like inventory data, or that fail while being
// processed, are skipped and listed in the run summary; the rest of the
// workbook is still reported. `run_analysis` is the single entry point the
// binary uses.

pub mod aggregate;
pub mod alerts;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod generic;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod processor;
pub mod reports;
pub mod types;
pub mod util;
pub mod validate;

pub use analyzer::{analyzer_for, default_output_path, run_analysis, Analyzer, InventoryAnalyzer};
pub use config::{AnalysisConfig, AnalyzerKind, ColumnMapping};
pub use error::{ReportError, Result, SheetFailure};
pub use generic::GenericAnalyzer;
pub use loader::{open_workbook, Sheet, Workbook, WorkbookEntry};
pub use reports::{Report, RunSummary, Table};
pub use types::{Alert, AlertKind, Cell, MetricRecord, MonthlyAggregate};
