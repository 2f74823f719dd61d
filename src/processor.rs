use crate::aggregate::aggregate_sheet;
use crate::alerts::evaluate_all;
use crate::config::ColumnMapping;
use crate::error::{ProcessingFailure, SheetFailure};
use crate::loader::WorkbookEntry;
use crate::metrics::compute_sheet_metrics;
use crate::types::{Alert, MetricRecord};
use crate::validate::{validate_sheet, ValidatedSheet};

/// One sheet's full contribution to the report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetResult {
    pub metrics: Vec<MetricRecord>,
    pub alerts: Vec<Alert>,
    pub rows_used: usize,
    pub rows_without_date: usize,
    pub rows_without_product: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetOutcome {
    pub sheet: String,
    pub result: Result<SheetResult, SheetFailure>,
}

/// Aggregate, derive and evaluate one validated sheet. Either the whole
/// sheet succeeds or nothing from it is kept.
pub fn process_sheet(v: &ValidatedSheet<'_>) -> Result<SheetResult, ProcessingFailure> {
    let aggregated = aggregate_sheet(v)?;
    let metrics = compute_sheet_metrics(aggregated.aggregates);
    let alerts = evaluate_all(&metrics);
    Ok(SheetResult {
        metrics,
        alerts,
        rows_used: aggregated.rows_used,
        rows_without_date: aggregated.rows_without_date,
        rows_without_product: aggregated.rows_without_product,
    })
}

/// Validate then process one workbook entry, folding every failure into
/// the outcome.
pub fn run_sheet(entry: &WorkbookEntry, mapping: &ColumnMapping) -> SheetOutcome {
    let result = match entry {
        WorkbookEntry::Unreadable { reason, .. } => Err(SheetFailure::Unreadable(reason.clone())),
        WorkbookEntry::Loaded(sheet) => validate_sheet(sheet, mapping)
            .map_err(SheetFailure::from)
            .and_then(|v| process_sheet(&v).map_err(SheetFailure::from)),
    };
    SheetOutcome {
        sheet: entry.name().to_string(),
        result,
    }
}
