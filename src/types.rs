use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// One spreadsheet cell after loading. Everything downstream works on these,
/// independent of whether the sheet came from xlsx, ods or csv.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn from_opt(v: Option<f64>) -> Cell {
        v.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A daily record for one product, typed from a validated sheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based spreadsheet row number (header is row 1).
    pub row_number: usize,
    pub product: String,
    pub date: NaiveDate,
    pub daily_sales: Option<f64>,
    pub daily_purchases: Option<f64>,
    pub opening_stock: Option<f64>,
    pub closing_physical_stock: Option<f64>,
    pub tank_capacity: Option<f64>,
    pub unit_public_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    pub sheet: String,
    pub product: String,
    pub year: i32,
    pub month: u32,
    pub monthly_sales: f64,
    pub monthly_purchases: f64,
    /// First value of the month; `None` when no row in the month carries one.
    pub opening_stock: Option<f64>,
    /// Last value of the month.
    pub closing_stock: Option<f64>,
    pub tank_capacity: Option<f64>,
    pub unit_public_price: Option<f64>,
}

impl MonthlyAggregate {
    pub fn month_label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn average_stock(&self) -> Option<f64> {
        Some((self.opening_stock? + self.closing_stock?) / 2.0)
    }
}

/// Derived metrics for one (sheet, product, year, month). `None` means the
/// metric is undefined for the month and carries no alert signal.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub aggregate: MonthlyAggregate,
    pub net_variation: Option<f64>,
    pub turnover: Option<f64>,
    pub shrinkage_pct: Option<f64>,
    pub shrinkage_value: Option<f64>,
    pub deviation_pct: Option<f64>,
    pub tank_utilization_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AlertKind {
    ExcessiveShrinkage,
    TankUnderutilization,
    ExcessiveTurnover,
    UnjustifiedIncrease,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::ExcessiveShrinkage,
        AlertKind::TankUnderutilization,
        AlertKind::ExcessiveTurnover,
        AlertKind::UnjustifiedIncrease,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AlertKind::ExcessiveShrinkage => "Excessive shrinkage",
            AlertKind::TankUnderutilization => "Tank underutilization",
            AlertKind::ExcessiveTurnover => "Excessive turnover",
            AlertKind::UnjustifiedIncrease => "Unjustified increase",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub sheet: String,
    pub product: String,
    pub year: i32,
    pub month: u32,
    pub kind: AlertKind,
    pub value: f64,
}

impl Alert {
    pub fn month_label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}
