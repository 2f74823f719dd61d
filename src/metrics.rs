use crate::types::{MetricRecord, MonthlyAggregate};
use crate::util::{mean, ratio};
use std::collections::HashMap;

/// Derive the per-month metrics. `mean_sales` is the product's average
/// monthly sales over the same sheet; deviation is undefined without it.
pub fn compute_metrics(aggregate: MonthlyAggregate, mean_sales: Option<f64>) -> MetricRecord {
    let net_variation = match (aggregate.opening_stock, aggregate.closing_stock) {
        (Some(open), Some(close)) => Some(close - open),
        _ => None,
    };
    // Average of opening and closing stock feeds both turnover and tank use.
    let average_stock = aggregate.average_stock();

    let turnover = average_stock.and_then(|avg| ratio(aggregate.monthly_sales, avg));
    let shrinkage_pct = net_variation
        .and_then(|nv| ratio(nv, aggregate.monthly_purchases))
        .map(|r| r * 100.0);
    let shrinkage_value = net_variation
        .zip(aggregate.unit_public_price)
        .map(|(nv, price)| nv * price);
    let deviation_pct = mean_sales
        .and_then(|m| ratio(aggregate.monthly_sales - m, m))
        .map(|r| r * 100.0);
    let tank_utilization_pct = average_stock
        .zip(aggregate.tank_capacity)
        .and_then(|(avg, cap)| ratio(avg, cap))
        .map(|r| r * 100.0);

    MetricRecord {
        aggregate,
        net_variation,
        turnover,
        shrinkage_pct,
        shrinkage_value,
        deviation_pct,
        tank_utilization_pct,
    }
}

/// Two passes over one sheet's aggregates: collect each product's monthly
/// sales, then derive every month against that product's mean.
pub fn compute_sheet_metrics(aggregates: Vec<MonthlyAggregate>) -> Vec<MetricRecord> {
    // Pass 1: every month's sales per product.
    let mut sales_by_product: HashMap<String, Vec<f64>> = HashMap::new();
    for a in &aggregates {
        sales_by_product
            .entry(a.product.clone())
            .or_default()
            .push(a.monthly_sales);
    }
    let means: HashMap<String, f64> = sales_by_product
        .into_iter()
        .filter_map(|(product, sales)| mean(&sales).map(|m| (product, m)))
        .collect();

    // Pass 2: each month against its product's mean.
    aggregates
        .into_iter()
        .map(|a| {
            let m = means.get(&a.product).copied();
            compute_metrics(a, m)
        })
        .collect()
}
