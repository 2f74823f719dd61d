use crate::types::{Alert, AlertKind, MetricRecord};

/// Shrinkage percentages below this are flagged.
pub const SHRINKAGE_PCT_THRESHOLD: f64 = -0.5;
/// Tank utilization percentages below this are flagged.
pub const TANK_UTILIZATION_PCT_THRESHOLD: f64 = 20.0;
/// Turnover ratios above this are flagged.
pub const TURNOVER_THRESHOLD: f64 = 5.0;

/// Slack for float noise when comparing closing stock to the expected balance.
const STOCK_TOLERANCE: f64 = 1e-9;

/// All alerts that fire for one month. Missing metrics never fire.
pub fn evaluate(record: &MetricRecord) -> Vec<Alert> {
    let a = &record.aggregate;
    let mut fired: Vec<(AlertKind, f64)> = Vec::new();

    if let Some(pct) = record.shrinkage_pct.filter(|p| *p < SHRINKAGE_PCT_THRESHOLD) {
        fired.push((AlertKind::ExcessiveShrinkage, pct));
    }
    if let Some(pct) = record
        .tank_utilization_pct
        .filter(|p| *p < TANK_UTILIZATION_PCT_THRESHOLD)
    {
        fired.push((AlertKind::TankUnderutilization, pct));
    }
    if let Some(t) = record.turnover.filter(|t| *t > TURNOVER_THRESHOLD) {
        fired.push((AlertKind::ExcessiveTurnover, t));
    }
    if let (Some(open), Some(close)) = (a.opening_stock, a.closing_stock) {
        // Stock can only grow through purchases; anything above the
        // expected balance is unexplained.
        let expected = open + a.monthly_purchases - a.monthly_sales;
        let excess = close - expected;
        if excess > STOCK_TOLERANCE {
            fired.push((AlertKind::UnjustifiedIncrease, excess));
        }
    }

    fired
        .into_iter()
        .map(|(kind, value)| Alert {
            sheet: a.sheet.clone(),
            product: a.product.clone(),
            year: a.year,
            month: a.month,
            kind,
            value,
        })
        .collect()
}

pub fn evaluate_all(records: &[MetricRecord]) -> Vec<Alert> {
    records.iter().flat_map(evaluate).collect()
}
