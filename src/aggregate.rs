use crate::error::ProcessingFailure;
use crate::types::{Cell, MonthlyAggregate, RawRow};
use crate::util::{cell_to_date, cell_to_f64, cell_to_label};
use crate::validate::ValidatedSheet;
use chrono::Datelike;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedSheet {
    /// Sorted by product, then year, then month.
    pub aggregates: Vec<MonthlyAggregate>,
    pub rows_used: usize,
    pub rows_without_date: usize,
    pub rows_without_product: usize,
}

/// Type every data row of a validated sheet. Empty date or product cells
/// drop the row; text that is neither a number nor a date fails the sheet.
pub fn parse_rows(v: &ValidatedSheet<'_>) -> Result<(Vec<RawRow>, usize, usize), ProcessingFailure> {
    let sheet = v.sheet;
    let cols = &v.columns;
    let mut rows = Vec::with_capacity(sheet.rows.len());
    let mut without_date = 0usize;
    let mut without_product = 0usize;

    for (i, cells) in sheet.rows.iter().enumerate() {
        // Spreadsheet numbering: row 1 is the header.
        let row_number = i + 2;

        let date_cell = &cells[cols.date];
        if date_cell.is_empty() {
            without_date += 1;
            continue;
        }
        let Some(product) = cell_to_label(&cells[cols.product]) else {
            without_product += 1;
            continue;
        };
        let date = cell_to_date(date_cell).ok_or_else(|| ProcessingFailure::InvalidDate {
            row: row_number,
            value: date_cell.to_string(),
        })?;

        // Quantities must be numbers when present. Capacity and price are
        // informational, so anything unparseable there just reads as missing.
        let required = |col: usize| required_number(&cells[col], row_number, &sheet.headers[col]);
        let optional = |col: Option<usize>| col.and_then(|c| cell_to_f64(&cells[c]));

        rows.push(RawRow {
            row_number,
            product,
            date,
            daily_sales: required(cols.daily_sales)?,
            daily_purchases: required(cols.daily_purchases)?,
            opening_stock: required(cols.opening_stock)?,
            closing_physical_stock: required(cols.closing_physical_stock)?,
            tank_capacity: optional(cols.tank_capacity),
            unit_public_price: optional(cols.unit_public_price),
        });
    }

    Ok((rows, without_date, without_product))
}

fn required_number(cell: &Cell, row: usize, column: &str) -> Result<Option<f64>, ProcessingFailure> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell_to_f64(cell)
        .map(Some)
        .ok_or_else(|| ProcessingFailure::InvalidNumber {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        })
}

/// Group rows by (product, year, month). Within a group rows are taken in
/// ascending date order; rows sharing a date keep their sheet order.
pub fn group_monthly(sheet_name: &str, rows: &[RawRow]) -> Vec<MonthlyAggregate> {
    let mut groups: BTreeMap<(String, i32, u32), Vec<&RawRow>> = BTreeMap::new();
    for r in rows {
        groups
            .entry((r.product.clone(), r.date.year(), r.date.month()))
            .or_default()
            .push(r);
    }

    groups
        .into_iter()
        .map(|((product, year, month), mut group)| {
            // Stable sort, so same-day rows stay in sheet order.
            group.sort_by_key(|r| r.date);
            MonthlyAggregate {
                sheet: sheet_name.to_string(),
                product,
                year,
                month,
                monthly_sales: group.iter().filter_map(|r| r.daily_sales).sum(),
                monthly_purchases: group.iter().filter_map(|r| r.daily_purchases).sum(),
                // First opening and last closing that actually carry a value.
                opening_stock: group.iter().find_map(|r| r.opening_stock),
                closing_stock: group.iter().rev().find_map(|r| r.closing_physical_stock),
                tank_capacity: group.iter().find_map(|r| r.tank_capacity),
                unit_public_price: group.iter().find_map(|r| r.unit_public_price),
            }
        })
        .collect()
}

pub fn aggregate_sheet(v: &ValidatedSheet<'_>) -> Result<AggregatedSheet, ProcessingFailure> {
    let (rows, rows_without_date, rows_without_product) = parse_rows(v)?;
    Ok(AggregatedSheet {
        aggregates: group_monthly(&v.sheet.name, &rows),
        rows_used: rows.len(),
        rows_without_date,
        rows_without_product,
    })
}
