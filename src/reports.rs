use crate::error::SheetFailure;
use crate::processor::SheetOutcome;
use crate::types::{Alert, AlertKind, Cell, MetricRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

pub const RESULTS_SHEET: &str = "Results";
pub const ALERTS_SHEET: &str = "Alerts";
pub const FORMULAS_SHEET: &str = "Formulas";

pub const RESULTS_HEADERS: [&str; 16] = [
    "Sheet",
    "Product",
    "Year",
    "Month",
    "MonthlySales",
    "MonthlyPurchases",
    "OpeningStock",
    "ClosingStock",
    "TankCapacity",
    "UnitPublicPrice",
    "NetVariation",
    "Turnover",
    "ShrinkagePct",
    "ShrinkageValue",
    "DeviationPct",
    "TankUtilizationPct",
];

pub const ALERTS_HEADERS: [&str; 5] = ["Sheet", "Product", "Month", "Alert", "Value"];

pub const FORMULAS_HEADERS: [&str; 2] = ["Name", "Definition"];

/// In-report documentation. Constant, never derived from data.
pub const FORMULAS: [(&str, &str); 14] = [
    ("MonthlySales", "SUM(DailySales) over the days of the month"),
    ("MonthlyPurchases", "SUM(DailyPurchases) over the days of the month"),
    ("OpeningStock", "First OpeningStock value of the month"),
    ("ClosingStock", "Last ClosingPhysicalStock value of the month"),
    ("NetVariation", "ClosingStock - OpeningStock"),
    ("Turnover", "MonthlySales / ((OpeningStock + ClosingStock) / 2)"),
    ("ShrinkagePct", "(NetVariation / MonthlyPurchases) * 100"),
    ("ShrinkageValue", "NetVariation * UnitPublicPrice"),
    (
        "DeviationPct",
        "((MonthlySales - mean MonthlySales of the product) / mean MonthlySales of the product) * 100",
    ),
    (
        "TankUtilizationPct",
        "((OpeningStock + ClosingStock) / 2) / TankCapacity * 100",
    ),
    ("Alert: Excessive shrinkage", "ShrinkagePct < -0.5"),
    ("Alert: Tank underutilization", "TankUtilizationPct < 20"),
    ("Alert: Excessive turnover", "Turnover > 5"),
    (
        "Alert: Unjustified increase",
        "ClosingStock > OpeningStock + MonthlyPurchases - MonthlySales",
    ),
];

/// A named output table. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Table {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetDiagnostic {
    pub sheet: String,
    pub stage: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RunSummary {
    pub input: Option<String>,
    pub analyzer: String,
    pub sheets_seen: usize,
    pub sheets_contributing: usize,
    pub skipped: Vec<SheetDiagnostic>,
    pub result_rows: usize,
    pub alerts: BTreeMap<AlertKind, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub tables: Vec<Table>,
    pub summary: RunSummary,
}

impl Report {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Everything one run keeps across sheets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisResult {
    pub metrics: Vec<MetricRecord>,
    pub alerts: Vec<Alert>,
}

/// Accumulates sheet outcomes in workbook order and renders the final report.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    result: AnalysisResult,
    sheets_seen: usize,
    sheets_contributing: usize,
    skipped: Vec<SheetDiagnostic>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_outcome(&mut self, outcome: SheetOutcome) {
        self.sheets_seen += 1;
        match outcome.result {
            Ok(result) => {
                info!(
                    sheet = %outcome.sheet,
                    months = result.metrics.len(),
                    alerts = result.alerts.len(),
                    "sheet processed"
                );
                let dropped = result.rows_without_date + result.rows_without_product;
                if dropped > 0 {
                    warn!(
                        sheet = %outcome.sheet,
                        without_date = result.rows_without_date,
                        without_product = result.rows_without_product,
                        "rows left out of monthly totals"
                    );
                }
                self.sheets_contributing += 1;
                self.result.metrics.extend(result.metrics);
                self.result.alerts.extend(result.alerts);
            }
            Err(failure) => {
                // A sheet that simply isn't inventory data is expected; anything else is an error.
                match failure {
                    SheetFailure::Validation(_) => {
                        warn!(sheet = %outcome.sheet, %failure, "sheet skipped")
                    }
                    _ => error!(sheet = %outcome.sheet, %failure, "sheet skipped"),
                }
                self.skipped.push(SheetDiagnostic {
                    sheet: outcome.sheet,
                    stage: failure.stage().to_string(),
                    reason: failure.to_string(),
                });
            }
        }
    }

    pub fn finish(self) -> Report {
        let mut alert_counts: BTreeMap<AlertKind, usize> = BTreeMap::new();
        for a in &self.result.alerts {
            *alert_counts.entry(a.kind).or_default() += 1;
        }
        let summary = RunSummary {
            input: None,
            analyzer: "inventory".to_string(),
            sheets_seen: self.sheets_seen,
            sheets_contributing: self.sheets_contributing,
            skipped: self.skipped,
            result_rows: self.result.metrics.len(),
            alerts: alert_counts,
        };
        Report {
            tables: vec![
                results_table(&self.result.metrics),
                alerts_table(&self.result.alerts),
                formulas_table(),
            ],
            summary,
        }
    }
}

pub fn results_table(metrics: &[MetricRecord]) -> Table {
    let mut table = Table::new(RESULTS_SHEET, &RESULTS_HEADERS);
    for m in metrics {
        let a = &m.aggregate;
        table.rows.push(vec![
            Cell::Text(a.sheet.clone()),
            Cell::Text(a.product.clone()),
            Cell::Number(a.year as f64),
            Cell::Number(a.month as f64),
            Cell::Number(a.monthly_sales),
            Cell::Number(a.monthly_purchases),
            Cell::from_opt(a.opening_stock),
            Cell::from_opt(a.closing_stock),
            Cell::from_opt(a.tank_capacity),
            Cell::from_opt(a.unit_public_price),
            Cell::from_opt(m.net_variation),
            Cell::from_opt(m.turnover),
            Cell::from_opt(m.shrinkage_pct),
            Cell::from_opt(m.shrinkage_value),
            Cell::from_opt(m.deviation_pct),
            Cell::from_opt(m.tank_utilization_pct),
        ]);
    }
    table
}

pub fn alerts_table(alerts: &[Alert]) -> Table {
    let mut table = Table::new(ALERTS_SHEET, &ALERTS_HEADERS);
    for a in alerts {
        table.rows.push(vec![
            Cell::Text(a.sheet.clone()),
            Cell::Text(a.product.clone()),
            Cell::Text(a.month_label()),
            Cell::Text(a.kind.label().to_string()),
            Cell::Number(a.value),
        ]);
    }
    table
}

pub fn formulas_table() -> Table {
    let mut table = Table::new(FORMULAS_SHEET, &FORMULAS_HEADERS);
    for (name, definition) in FORMULAS {
        table
            .rows
            .push(vec![Cell::Text(name.to_string()), Cell::Text(definition.to_string())]);
    }
    table
}
