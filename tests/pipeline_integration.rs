use calamine::{open_workbook_auto, Data, Reader};
use inventory_report::{run_analysis, AnalysisConfig, AnalyzerKind, ReportError};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::path::{Path, PathBuf};

const HEADERS: [&str; 8] = [
    "Producto",
    "Fecha",
    "Ventas",
    "Compras",
    "Existencia_Inicial",
    "Final_Físico",
    "Capacidad_Tanque",
    "PRECIO PÚBLICO (M3)",
];

enum V {
    S(&'static str),
    N(f64),
    /// Native spreadsheet date (year, month, day).
    D(u16, u8, u8),
    E,
}

fn write_input(path: &Path, sheets: &[(&str, &[&str], Vec<Vec<V>>)]) {
    let mut wb = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    for (name, headers, rows) in sheets {
        let ws = wb.add_worksheet();
        ws.set_name(*name).unwrap();
        for (c, h) in headers.iter().enumerate() {
            ws.write_string(0, c as u16, *h).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                let (r, c) = ((r + 1) as u32, c as u16);
                match v {
                    V::S(s) => {
                        ws.write_string(r, c, *s).unwrap();
                    }
                    V::N(n) => {
                        ws.write_number(r, c, *n).unwrap();
                    }
                    V::D(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
                        ws.write_datetime_with_format(r, c, &date, &date_format).unwrap();
                    }
                    V::E => {}
                }
            }
        }
    }
    wb.save(path).unwrap();
}

fn widget_rows() -> Vec<Vec<V>> {
    vec![
        vec![V::S("Widget"), V::S("2024-01-01"), V::N(10.0), V::N(5.0), V::N(100.0), V::E, V::E, V::E],
        vec![V::S("Widget"), V::S("2024-01-02"), V::N(20.0), V::N(5.0), V::E, V::N(115.0), V::E, V::E],
    ]
}

fn diesel_rows() -> Vec<Vec<V>> {
    vec![
        vec![V::S("Diesel"), V::S("2024-01-01"), V::N(50.0), V::N(100.0), V::N(400.0), V::N(440.0), V::N(5000.0), V::N(22.5)],
        vec![V::S("Diesel"), V::S("2024-01-31"), V::N(50.0), V::N(0.0), V::N(440.0), V::N(390.0), V::N(5000.0), V::N(22.5)],
        vec![V::S("Diesel"), V::S("2024-02-01"), V::N(30.0), V::N(20.0), V::N(390.0), V::N(380.0), V::N(5000.0), V::N(22.5)],
    ]
}

fn read_table(path: &Path, sheet: &str) -> Vec<Vec<Data>> {
    let mut wb = open_workbook_auto(path).unwrap();
    let range = wb.worksheet_range(sheet).unwrap();
    range.rows().map(|r| r.to_vec()).collect()
}

fn col(rows: &[Vec<Data>], name: &str) -> usize {
    rows[0]
        .iter()
        .position(|h| h.to_string() == name)
        .unwrap_or_else(|| panic!("missing column {}", name))
}

fn num(d: &Data) -> f64 {
    match d {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        other => panic!("expected a number, got {:?}", other),
    }
}

fn paths(dir: &Path) -> (PathBuf, PathBuf) {
    (dir.join("inventarios.xlsx"), dir.join("results.xlsx"))
}

#[test]
fn widget_scenario_produces_results_alerts_and_formulas() {
    let dir = tempfile::tempdir().unwrap();
    let (input, output) = paths(dir.path());
    write_input(&input, &[("Almacen1", &HEADERS[..], widget_rows())]);

    let report = run_analysis(&input, &output, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.summary.sheets_contributing, 1);

    let wb = open_workbook_auto(&output).unwrap();
    assert_eq!(wb.sheet_names(), vec!["Results", "Alerts", "Formulas"]);
    drop(wb);

    let results = read_table(&output, "Results");
    assert_eq!(results.len(), 2);
    let row = &results[1];
    assert_eq!(row[col(&results, "Sheet")].to_string(), "Almacen1");
    assert_eq!(row[col(&results, "Product")].to_string(), "Widget");
    assert_eq!(num(&row[col(&results, "MonthlySales")]), 30.0);
    assert_eq!(num(&row[col(&results, "MonthlyPurchases")]), 10.0);
    assert_eq!(num(&row[col(&results, "NetVariation")]), 15.0);
    assert!((num(&row[col(&results, "ShrinkagePct")]) - 150.0).abs() < 1e-9);
    assert!((num(&row[col(&results, "Turnover")]) - 30.0 / 107.5).abs() < 1e-9);
    assert_eq!(row[col(&results, "TankUtilizationPct")], Data::Empty);

    let alerts = read_table(&output, "Alerts");
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1][col(&alerts, "Alert")].to_string(), "Unjustified increase");
    assert_eq!(alerts[1][col(&alerts, "Month")].to_string(), "2024-01");

    let formulas = read_table(&output, "Formulas");
    assert_eq!(formulas.len(), 15);
}

#[test]
fn sheet_without_product_is_skipped_while_others_report() {
    let dir = tempfile::tempdir().unwrap();
    let (input, output) = paths(dir.path());
    let no_product: Vec<&str> = HEADERS[1..].to_vec();
    let rows: Vec<Vec<V>> = diesel_rows()
        .into_iter()
        .map(|r| r.into_iter().skip(1).collect())
        .collect();
    write_input(
        &input,
        &[
            ("SinProducto", &no_product[..], rows),
            ("Estacion", &HEADERS[..], diesel_rows()),
        ],
    );

    let report = run_analysis(&input, &output, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.summary.sheets_seen, 2);
    assert_eq!(report.summary.skipped.len(), 1);
    assert_eq!(report.summary.skipped[0].sheet, "SinProducto");

    let results = read_table(&output, "Results");
    let sheet_col = col(&results, "Sheet");
    assert_eq!(results.len(), 3);
    assert!(results[1..].iter().all(|r| r[sheet_col].to_string() == "Estacion"));

    let jan = &results[1];
    // avg stock (400 + 390) / 2 = 395 of a 5000 tank.
    assert!((num(&jan[col(&results, "TankUtilizationPct")]) - 7.9).abs() < 1e-9);
    assert!((num(&jan[col(&results, "ShrinkageValue")]) - (-10.0 * 22.5)).abs() < 1e-9);
    // mean monthly sales (100 + 30) / 2 = 65.
    assert!((num(&jan[col(&results, "DeviationPct")]) - (35.0 / 65.0 * 100.0)).abs() < 1e-9);

    let alerts = read_table(&output, "Alerts");
    let kinds: Vec<String> = alerts[1..]
        .iter()
        .map(|r| r[col(&alerts, "Alert")].to_string())
        .collect();
    assert!(kinds.contains(&"Excessive shrinkage".to_string()));
    assert!(kinds.contains(&"Tank underutilization".to_string()));
}

#[test]
fn native_date_cells_group_by_month() {
    let dir = tempfile::tempdir().unwrap();
    let (input, output) = paths(dir.path());
    let rows = vec![
        vec![V::S("Diesel"), V::D(2024, 1, 5), V::N(8.0), V::N(0.0), V::N(100.0), V::N(92.0), V::E, V::E],
        vec![V::S("Diesel"), V::D(2024, 1, 20), V::N(12.0), V::N(0.0), V::N(92.0), V::N(80.0), V::E, V::E],
        vec![V::S("Diesel"), V::D(2024, 2, 3), V::N(10.0), V::N(0.0), V::N(80.0), V::N(70.0), V::E, V::E],
    ];
    write_input(&input, &[("Estacion", &HEADERS[..], rows)]);

    let report = run_analysis(&input, &output, &AnalysisConfig::default()).unwrap();
    assert!(report.summary.skipped.is_empty());

    let results = read_table(&output, "Results");
    assert_eq!(results.len(), 3);
    let (year, month, sales) = (
        col(&results, "Year"),
        col(&results, "Month"),
        col(&results, "MonthlySales"),
    );
    let keyed: Vec<(f64, f64, f64)> = results[1..]
        .iter()
        .map(|r| (num(&r[year]), num(&r[month]), num(&r[sales])))
        .collect();
    assert_eq!(keyed, vec![(2024.0, 1.0, 20.0), (2024.0, 2.0, 10.0)]);
    assert_eq!(num(&results[1][col(&results, "OpeningStock")]), 100.0);
    assert_eq!(num(&results[1][col(&results, "ClosingStock")]), 80.0);
}

#[test]
fn no_valid_sheet_still_writes_an_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let (input, output) = paths(dir.path());
    write_input(&input, &[("Notas", &["Comentario"][..], vec![vec![V::S("hola")]])]);

    let report = run_analysis(&input, &output, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.summary.sheets_contributing, 0);

    let results = read_table(&output, "Results");
    assert_eq!(results.len(), 1);
    let alerts = read_table(&output, "Alerts");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].len(), 5);
}

#[test]
fn corrupt_workbook_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (input, output) = paths(dir.path());
    std::fs::write(&input, b"this is not a spreadsheet at all").unwrap();

    let err = run_analysis(&input, &output, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::WorkbookOpen { .. }));
    assert!(!output.exists());
}

#[test]
fn repeated_runs_give_identical_tables() {
    let dir = tempfile::tempdir().unwrap();
    let (input, _) = paths(dir.path());
    write_input(
        &input,
        &[
            ("Almacen1", &HEADERS[..], widget_rows()),
            ("Estacion", &HEADERS[..], diesel_rows()),
        ],
    );
    let first = dir.path().join("a.xlsx");
    let second = dir.path().join("b.xlsx");
    let mut parallel = AnalysisConfig::default();
    parallel.parallel = true;

    let r1 = run_analysis(&input, &first, &AnalysisConfig::default()).unwrap();
    let r2 = run_analysis(&input, &second, &parallel).unwrap();
    assert_eq!(r1.tables, r2.tables);
    for sheet in ["Results", "Alerts"] {
        assert_eq!(read_table(&first, sheet), read_table(&second, sheet));
    }
}

#[test]
fn csv_input_is_a_single_sheet_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("almacen.csv");
    let output = dir.path().join("out.xlsx");
    std::fs::write(
        &input,
        "Product,Date,Sales,Purchases,Opening_Stock,Closing_Stock\n\
         Widget,2024-01-01,10,5,100,\n\
         Widget,2024-01-02,20,5,,115\n",
    )
    .unwrap();

    let report = run_analysis(&input, &output, &AnalysisConfig::default()).unwrap();
    let results = report.table("Results").unwrap();
    assert_eq!(results.rows.len(), 1);
    assert_eq!(results.rows[0][0].to_string(), "almacen");
    assert_eq!(report.summary.alerts.values().sum::<usize>(), 1);
}

#[test]
fn generic_analyzer_writes_its_own_tables() {
    let dir = tempfile::tempdir().unwrap();
    let (input, output) = paths(dir.path());
    write_input(
        &input,
        &[(
            "Ventas",
            &["Fecha", "Unidades", "Precio"][..],
            vec![
                vec![V::S("2024-01-01"), V::N(2.0), V::N(4.0)],
                vec![V::S("2024-02-01"), V::N(3.0), V::N(6.0)],
            ],
        )],
    );
    let mut config = AnalysisConfig::default();
    config.analyzer = AnalyzerKind::Generic;

    run_analysis(&input, &output, &config).unwrap();
    let mut wb = open_workbook_auto(&output).unwrap();
    assert_eq!(
        wb.sheet_names(),
        vec!["Calculations", "Monthly_Summary", "Data_Profile"]
    );
    let monthly = wb.worksheet_range("Monthly_Summary").unwrap();
    assert_eq!(monthly.height(), 3);
}
