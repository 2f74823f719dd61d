use crate::config::{Column, ColumnMapping};
use crate::error::ValidationFailure;
use crate::loader::Sheet;
use crate::util::{cell_to_date, cell_to_f64};
use tracing::debug;

/// Header positions of the logical columns in one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub product: usize,
    pub date: usize,
    pub daily_sales: usize,
    pub daily_purchases: usize,
    pub opening_stock: usize,
    pub closing_physical_stock: usize,
    pub tank_capacity: Option<usize>,
    pub unit_public_price: Option<usize>,
}

impl ResolvedColumns {
    pub fn index(&self, column: Column) -> Option<usize> {
        match column {
            Column::Product => Some(self.product),
            Column::Date => Some(self.date),
            Column::DailySales => Some(self.daily_sales),
            Column::DailyPurchases => Some(self.daily_purchases),
            Column::OpeningStock => Some(self.opening_stock),
            Column::ClosingPhysicalStock => Some(self.closing_physical_stock),
            Column::TankCapacity => self.tank_capacity,
            Column::UnitPublicPrice => self.unit_public_price,
        }
    }
}

/// A sheet that passed validation, with what the aggregator needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSheet<'a> {
    pub sheet: &'a Sheet,
    pub columns: ResolvedColumns,
    /// Rows whose date cell is empty; they are left out of the monthly groups.
    pub undated_rows: usize,
}

/// Check that `sheet` has the inventory shape before any processing.
pub fn validate_sheet<'a>(
    sheet: &'a Sheet,
    mapping: &ColumnMapping,
) -> Result<ValidatedSheet<'a>, ValidationFailure> {
    if sheet.is_empty() {
        return Err(ValidationFailure::EmptySheet);
    }

    let missing: Vec<String> = Column::REQUIRED
        .iter()
        .filter(|c| mapping.resolve(**c, &sheet.headers).is_none())
        .map(|c| c.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationFailure::MissingColumns(missing));
    }

    let idx = |c: Column| mapping.resolve(c, &sheet.headers).unwrap_or_default();
    let columns = ResolvedColumns {
        product: idx(Column::Product),
        date: idx(Column::Date),
        daily_sales: idx(Column::DailySales),
        daily_purchases: idx(Column::DailyPurchases),
        opening_stock: idx(Column::OpeningStock),
        closing_physical_stock: idx(Column::ClosingPhysicalStock),
        tank_capacity: mapping.resolve(Column::TankCapacity, &sheet.headers),
        unit_public_price: mapping.resolve(Column::UnitPublicPrice, &sheet.headers),
    };
    debug!(sheet = %sheet.name, ?columns, "columns resolved");

    // One numeric cell is enough; stray text in a column is judged per row
    // later, when the sheet is processed.
    for column in Column::REQUIRED_NUMERIC {
        let col = columns.index(column).unwrap_or_default();
        let any_numeric = sheet.rows.iter().any(|r| cell_to_f64(&r[col]).is_some());
        if !any_numeric {
            return Err(ValidationFailure::NonNumericColumn(
                sheet.headers[col].clone(),
            ));
        }
    }

    // Dates that fail to parse are neither dated nor undated here; the
    // aggregator reports them with their row number.
    let mut dated = 0usize;
    let mut undated_rows = 0usize;
    for row in &sheet.rows {
        let cell = &row[columns.date];
        if cell.is_empty() {
            undated_rows += 1;
        } else if cell_to_date(cell).is_some() {
            dated += 1;
        }
    }
    if dated == 0 {
        return Err(ValidationFailure::NoDatedRows);
    }

    Ok(ValidatedSheet {
        sheet,
        columns,
        undated_rows,
    })
}
