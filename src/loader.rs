use crate::error::{ReportError, Result};
use crate::types::Cell;
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One sheet as a header row plus data rows. Rows are padded to the header width.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, mut rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Sheet {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.iter().all(|h| h.trim().is_empty()) || self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }
}

/// A sheet that was listed by the workbook, readable or not.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkbookEntry {
    Loaded(Sheet),
    Unreadable { name: String, reason: String },
}

impl WorkbookEntry {
    pub fn name(&self) -> &str {
        match self {
            WorkbookEntry::Loaded(sheet) => &sheet.name,
            WorkbookEntry::Unreadable { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub entries: Vec<WorkbookEntry>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Workbook {
            entries: sheets.into_iter().map(WorkbookEntry::Loaded).collect(),
        }
    }

    /// Entry listed under `name`, readable or not.
    pub fn entry(&self, name: &str) -> Option<&WorkbookEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }
}

/// Open a workbook. Failing to open the file is fatal; a single sheet that
/// cannot be read is recorded as `Unreadable` and left to the analyzer.
pub fn open_workbook(path: &Path) -> Result<Workbook> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        return open_csv(path);
    }

    let mut wb = open_workbook_auto(path).map_err(|e| ReportError::WorkbookOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut entries = Vec::new();
    for name in wb.sheet_names() {
        match wb.worksheet_range(&name) {
            Ok(range) => {
                let sheet = sheet_from_range(&name, &range);
                debug!(sheet = %name, rows = sheet.rows.len(), "sheet loaded");
                entries.push(WorkbookEntry::Loaded(sheet));
            }
            Err(e) => entries.push(WorkbookEntry::Unreadable {
                name,
                reason: e.to_string(),
            }),
        }
    }
    Ok(Workbook { entries })
}

fn open_csv(path: &Path) -> Result<Workbook> {
    let file = std::fs::File::open(path).map_err(|e| ReportError::WorkbookOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();
    let sheet = read_csv_sheet(&name, file).map_err(|e| ReportError::WorkbookOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Workbook::from_sheets(vec![sheet]))
}

/// Read a CSV stream as a single sheet. Cells stay text; numbers and dates
/// are parsed later by the consumers that need them.
pub fn read_csv_sheet<R: Read>(name: &str, reader: R) -> std::result::Result<Sheet, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: Vec<Cell> = record
            .iter()
            .map(|v| {
                if v.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(v.to_string())
                }
            })
            .collect();
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        rows.push(row);
    }
    Ok(Sheet::new(name, headers, rows))
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(first) => first.iter().map(|c| convert_cell(c).to_string()).collect(),
        None => Vec::new(),
    };
    let rows: Vec<Vec<Cell>> = iter
        .map(|r| r.iter().map(convert_cell).collect::<Vec<_>>())
        .filter(|r| !r.iter().all(Cell::is_empty))
        .collect();
    Sheet::new(name, headers, rows)
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::Date(ndt.date()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => crate::util::parse_date_safe(Some(s))
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
    }
}
