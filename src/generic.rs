// Fallback analysis for workbooks that are not inventory sheets: derived
// columns, a monthly roll-up and a per-column profile of one sheet.

use crate::analyzer::Analyzer;
use crate::error::{ReportError, Result};
use crate::loader::{Sheet, Workbook, WorkbookEntry};
use crate::reports::{Report, RunSummary, Table};
use crate::types::Cell;
use crate::util::{cell_to_date, cell_to_f64, mean, ratio, sample_std_dev, std_dev};
use chrono::Datelike;
use std::collections::{BTreeMap, HashSet};

const MAX_SUMMED_COLUMNS: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct GenericAnalyzer {
    sheet: Option<String>,
}

impl GenericAnalyzer {
    pub fn new(sheet: Option<String>) -> Self {
        Self { sheet }
    }

    fn pick<'a>(&self, workbook: &'a Workbook) -> Result<&'a Sheet> {
        let entry = match &self.sheet {
            Some(name) => workbook
                .entry(name)
                .ok_or_else(|| ReportError::Config(format!("sheet '{}' not found", name)))?,
            None => workbook
                .entries
                .first()
                .ok_or_else(|| ReportError::Config("workbook has no sheets".to_string()))?,
        };
        match entry {
            WorkbookEntry::Loaded(sheet) => Ok(sheet),
            WorkbookEntry::Unreadable { name, reason } => Err(ReportError::Config(format!(
                "sheet '{}' cannot be read: {}",
                name, reason
            ))),
        }
    }
}

impl Analyzer for GenericAnalyzer {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn analyze(&self, workbook: &Workbook) -> Result<Report> {
        let sheet = self.pick(workbook)?;
        let date_col = find_date_column(&sheet.headers);
        let numeric = numeric_columns(sheet, date_col);

        let calculations = calculations_table(sheet, date_col, &numeric);
        let mut tables = vec![calculations];
        if let Some(dc) = date_col {
            if !numeric.is_empty() {
                tables.push(monthly_summary_table(sheet, dc, &numeric));
            }
        }
        tables.push(profile_table(sheet, &numeric));

        let summary = RunSummary {
            analyzer: self.name().to_string(),
            sheets_seen: 1,
            sheets_contributing: 1,
            result_rows: sheet.rows.len(),
            ..RunSummary::default()
        };
        Ok(Report { tables, summary })
    }
}

fn find_date_column(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.to_lowercase();
        h.contains("date") || h.contains("fecha")
    })
}

/// Columns whose non-empty cells are all numbers (at least one present).
fn numeric_columns(sheet: &Sheet, date_col: Option<usize>) -> Vec<usize> {
    (0..sheet.headers.len())
        .filter(|c| Some(*c) != date_col)
        .filter(|&c| {
            let mut seen = false;
            for row in &sheet.rows {
                let cell = &row[c];
                if cell.is_empty() {
                    continue;
                }
                if cell_to_f64(cell).is_none() {
                    return false;
                }
                seen = true;
            }
            seen
        })
        .collect()
}

fn column_values(sheet: &Sheet, col: usize) -> Vec<Option<f64>> {
    sheet.rows.iter().map(|r| cell_to_f64(&r[col])).collect()
}

fn calculations_table(sheet: &Sheet, date_col: Option<usize>, numeric: &[usize]) -> Table {
    let mut headers = sheet.headers.clone();
    let mut extra: Vec<Vec<Cell>> = vec![Vec::new(); sheet.rows.len()];

    match date_col {
        Some(dc) => {
            headers.push("Year".to_string());
            headers.push("Month".to_string());
            for (i, row) in sheet.rows.iter().enumerate() {
                let date = cell_to_date(&row[dc]);
                extra[i].push(Cell::from_opt(date.map(|d| d.year() as f64)));
                extra[i].push(Cell::from_opt(date.map(|d| d.month() as f64)));
            }
        }
        None => {
            headers.push("SeqIndex".to_string());
            for (i, cells) in extra.iter_mut().enumerate() {
                cells.push(Cell::Number((i + 1) as f64));
            }
        }
    }

    if let [a, b, ..] = numeric {
        let (an, bn) = (&sheet.headers[*a], &sheet.headers[*b]);
        headers.push(format!("{}_plus_{}", an, bn));
        headers.push(format!("{}_minus_{}", an, bn));
        headers.push(format!("{}_over_{}", an, bn));
        let (av, bv) = (column_values(sheet, *a), column_values(sheet, *b));
        for (i, cells) in extra.iter_mut().enumerate() {
            let pair = av[i].zip(bv[i]);
            cells.push(Cell::from_opt(pair.map(|(x, y)| x + y)));
            cells.push(Cell::from_opt(pair.map(|(x, y)| x - y)));
            cells.push(Cell::from_opt(pair.and_then(|(x, y)| ratio(x, y))));
        }
    }

    if let Some(&first) = numeric.first() {
        headers.push(format!("{}_zscore", sheet.headers[first]));
        let values = column_values(sheet, first);
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let m = mean(&present).unwrap_or(0.0);
        let sd = std_dev(&present).filter(|s| *s != 0.0).unwrap_or(1.0);
        for (i, cells) in extra.iter_mut().enumerate() {
            cells.push(Cell::from_opt(values[i].map(|x| (x - m) / sd)));
        }
    }

    let rows: Vec<Vec<Cell>> = sheet
        .rows
        .iter()
        .zip(extra)
        .map(|(row, more)| row.iter().cloned().chain(more).collect::<Vec<_>>())
        .collect();
    Table {
        name: "Calculations".to_string(),
        headers,
        rows,
    }
}

fn monthly_summary_table(sheet: &Sheet, date_col: usize, numeric: &[usize]) -> Table {
    let summed: Vec<usize> = numeric.iter().copied().take(MAX_SUMMED_COLUMNS).collect();
    let mut groups: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for row in &sheet.rows {
        let Some(date) = cell_to_date(&row[date_col]) else {
            continue;
        };
        let sums = groups
            .entry((date.year(), date.month()))
            .or_insert_with(|| vec![0.0; summed.len()]);
        for (slot, &c) in sums.iter_mut().zip(&summed) {
            *slot += cell_to_f64(&row[c]).unwrap_or(0.0);
        }
    }

    let mut headers = vec!["Year".to_string(), "Month".to_string()];
    headers.extend(summed.iter().map(|&c| sheet.headers[c].clone()));
    let rows = groups
        .into_iter()
        .map(|((year, month), sums)| {
            let mut row = vec![Cell::Number(year as f64), Cell::Number(month as f64)];
            row.extend(sums.into_iter().map(Cell::Number));
            row
        })
        .collect();
    Table {
        name: "Monthly_Summary".to_string(),
        headers,
        rows,
    }
}

fn profile_table(sheet: &Sheet, numeric: &[usize]) -> Table {
    let mut table = Table::new(
        "Data_Profile",
        &["Column", "count", "unique", "mean", "std", "min", "max"],
    );
    for (c, header) in sheet.headers.iter().enumerate() {
        let non_empty: Vec<&Cell> = sheet.rows.iter().map(|r| &r[c]).filter(|x| !x.is_empty()).collect();
        let unique: HashSet<String> = non_empty.iter().map(|x| x.to_string()).collect();
        let mut row = vec![
            Cell::Text(header.clone()),
            Cell::Number(non_empty.len() as f64),
            Cell::Number(unique.len() as f64),
        ];
        if numeric.contains(&c) {
            let values: Vec<f64> = non_empty.iter().filter_map(|x| cell_to_f64(x)).collect();
            row.push(Cell::from_opt(mean(&values)));
            // Profile std is the sample deviation; z-scores above use the population one.
            row.push(Cell::from_opt(sample_std_dev(&values)));
            row.push(Cell::from_opt(values.iter().copied().reduce(f64::min)));
            row.push(Cell::from_opt(values.iter().copied().reduce(f64::max)));
        } else {
            row.extend(std::iter::repeat(Cell::Empty).take(4));
        }
        table.rows.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_sheet() -> Sheet {
        Sheet::new(
            "Ventas",
            vec!["Fecha".into(), "Tienda".into(), "Unidades".into(), "Precio".into()],
            vec![
                vec![Cell::Text("2024-01-10".into()), Cell::Text("Norte".into()), Cell::Number(2.0), Cell::Number(4.0)],
                vec![Cell::Text("2024-01-20".into()), Cell::Text("Sur".into()), Cell::Number(4.0), Cell::Number(0.0)],
                vec![Cell::Text("2024-02-01".into()), Cell::Text("Norte".into()), Cell::Number(6.0), Cell::Empty],
            ],
        )
    }

    fn analyze(sheet: Sheet, name: Option<&str>) -> Result<Report> {
        GenericAnalyzer::new(name.map(String::from)).analyze(&Workbook::from_sheets(vec![sheet]))
    }

    #[test]
    fn calculations_add_date_parts_and_pairwise_columns() {
        let report = analyze(sales_sheet(), None).unwrap();
        let calc = report.table("Calculations").unwrap();
        assert_eq!(
            calc.headers[4..].to_vec(),
            vec![
                "Year",
                "Month",
                "Unidades_plus_Precio",
                "Unidades_minus_Precio",
                "Unidades_over_Precio",
                "Unidades_zscore"
            ]
        );
        let over = calc.column("Unidades_over_Precio").unwrap();
        assert_eq!(calc.rows[0][over], Cell::Number(0.5));
        assert_eq!(calc.rows[1][over], Cell::Empty);
        assert_eq!(calc.rows[2][over], Cell::Empty);
        let z = calc.column("Unidades_zscore").unwrap();
        assert_eq!(calc.rows[1][z], Cell::Number(0.0));
    }

    #[test]
    fn monthly_summary_sums_by_year_month() {
        let report = analyze(sales_sheet(), None).unwrap();
        let monthly = report.table("Monthly_Summary").unwrap();
        assert_eq!(monthly.headers, vec!["Year", "Month", "Unidades", "Precio"]);
        assert_eq!(monthly.rows.len(), 2);
        assert_eq!(monthly.rows[0][2], Cell::Number(6.0));
        assert_eq!(monthly.rows[1][1], Cell::Number(2.0));
    }

    #[test]
    fn profile_has_one_row_per_column() {
        let report = analyze(sales_sheet(), None).unwrap();
        let profile = report.table("Data_Profile").unwrap();
        assert_eq!(profile.rows.len(), 4);
        let tienda = &profile.rows[1];
        assert_eq!(tienda[1], Cell::Number(3.0));
        assert_eq!(tienda[2], Cell::Number(2.0));
        assert_eq!(tienda[3], Cell::Empty);
        let unidades = &profile.rows[2];
        assert_eq!(unidades[3], Cell::Number(4.0));
        // 2, 4, 6: squared deviations 4 + 0 + 4 over n - 1 = 2.
        assert_eq!(unidades[4], Cell::Number(2.0));
        assert_eq!(unidades[5], Cell::Number(2.0));
        assert_eq!(unidades[6], Cell::Number(6.0));
    }

    #[test]
    fn without_dates_rows_get_a_sequence_index() {
        let sheet = Sheet::new(
            "Lista",
            vec!["Codigo".into()],
            vec![vec![Cell::Text("A".into())], vec![Cell::Text("B".into())]],
        );
        let report = analyze(sheet, None).unwrap();
        let calc = report.table("Calculations").unwrap();
        assert_eq!(calc.headers, vec!["Codigo", "SeqIndex"]);
        assert_eq!(calc.rows[1][1], Cell::Number(2.0));
        assert!(report.table("Monthly_Summary").is_none());
    }

    #[test]
    fn configured_sheet_is_picked_by_name() {
        let other = Sheet::new("Notas", vec!["Texto".into()], vec![vec![Cell::Text("x".into())]]);
        let workbook = Workbook::from_sheets(vec![other, sales_sheet()]);
        let report = GenericAnalyzer::new(Some("Ventas".into()))
            .analyze(&workbook)
            .unwrap();
        assert_eq!(report.table("Data_Profile").unwrap().rows.len(), 4);

        let unreadable = Workbook {
            entries: vec![WorkbookEntry::Unreadable {
                name: "Rota".into(),
                reason: "bad xml".into(),
            }],
        };
        assert!(matches!(
            GenericAnalyzer::new(Some("Rota".into())).analyze(&unreadable),
            Err(ReportError::Config(_))
        ));
    }

    #[test]
    fn unknown_sheet_is_a_config_error() {
        assert!(matches!(
            analyze(sales_sheet(), Some("Otra")),
            Err(ReportError::Config(_))
        ));
    }
}
