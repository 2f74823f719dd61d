use crate::config::{AnalysisConfig, AnalyzerKind, ColumnMapping};
use crate::error::Result;
use crate::generic::GenericAnalyzer;
use crate::loader::{open_workbook, Workbook};
use crate::output::write_xlsx;
use crate::processor::{run_sheet, SheetOutcome};
use crate::reports::{Report, ReportBuilder};
use crate::util::format_int;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Turns a loaded workbook into a report.
pub trait Analyzer {
    fn name(&self) -> &'static str;

    fn analyze(&self, workbook: &Workbook) -> Result<Report>;
}

/// Monthly inventory metrics and alerts over every sheet of the workbook.
#[derive(Debug, Clone, Default)]
pub struct InventoryAnalyzer {
    pub columns: ColumnMapping,
    pub parallel: bool,
}

impl InventoryAnalyzer {
    pub fn new(columns: ColumnMapping) -> Self {
        Self {
            columns,
            parallel: false,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Outcomes in workbook sheet order, however the sheets were scheduled.
    pub fn sheet_outcomes(&self, workbook: &Workbook) -> Vec<SheetOutcome> {
        if self.parallel {
            workbook
                .entries
                .par_iter()
                .map(|e| run_sheet(e, &self.columns))
                .collect()
        } else {
            workbook
                .entries
                .iter()
                .map(|e| run_sheet(e, &self.columns))
                .collect()
        }
    }
}

impl Analyzer for InventoryAnalyzer {
    fn name(&self) -> &'static str {
        "inventory"
    }

    fn analyze(&self, workbook: &Workbook) -> Result<Report> {
        let mut builder = ReportBuilder::new();
        for outcome in self.sheet_outcomes(workbook) {
            builder.add_outcome(outcome);
        }
        Ok(builder.finish())
    }
}

pub fn analyzer_for(config: &AnalysisConfig) -> Box<dyn Analyzer> {
    match config.analyzer {
        AnalyzerKind::Inventory => {
            Box::new(InventoryAnalyzer::new(config.columns.clone()).parallel(config.parallel))
        }
        AnalyzerKind::Generic => Box::new(GenericAnalyzer::new(config.sheet.clone())),
    }
}

/// `results_<input stem>.xlsx` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("workbook");
    input.with_file_name(format!("results_{}.xlsx", stem))
}

/// Open, analyze, write. Opening the input or writing the output are the
/// only fatal steps; sheet-level problems end up in the report summary.
pub fn run_analysis(input: &Path, output: &Path, config: &AnalysisConfig) -> Result<Report> {
    let analyzer = analyzer_for(config);
    info!(input = %input.display(), analyzer = analyzer.name(), "analysis started");

    let workbook = open_workbook(input)?;
    let mut report = analyzer.analyze(&workbook)?;
    report.summary.input = Some(input.display().to_string());

    write_xlsx(output, &report)?;
    info!(
        "Analysis complete. Processed {} sheets ({} contributed). Results in '{}'",
        format_int(report.summary.sheets_seen),
        format_int(report.summary.sheets_contributing),
        output.display()
    );
    Ok(report)
}
