// Run configuration: which analyzer to use and how sheet headers map onto
// the logical inventory columns.
//
// Everything is optional in the JSON file; omitted fields fall back to the
// defaults below, and a partial `columns` object only replaces the aliases
// of the columns it names.

use crate::error::{ReportError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Logical columns the inventory pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Product,
    Date,
    DailySales,
    DailyPurchases,
    OpeningStock,
    ClosingPhysicalStock,
    TankCapacity,
    UnitPublicPrice,
}

impl Column {
    pub const REQUIRED: [Column; 6] = [
        Column::Product,
        Column::Date,
        Column::DailySales,
        Column::DailyPurchases,
        Column::OpeningStock,
        Column::ClosingPhysicalStock,
    ];

    /// Required columns that must hold numbers.
    pub const REQUIRED_NUMERIC: [Column; 4] = [
        Column::DailySales,
        Column::DailyPurchases,
        Column::OpeningStock,
        Column::ClosingPhysicalStock,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Product => "Product",
            Column::Date => "Date",
            Column::DailySales => "DailySales",
            Column::DailyPurchases => "DailyPurchases",
            Column::OpeningStock => "OpeningStock",
            Column::ClosingPhysicalStock => "ClosingPhysicalStock",
            Column::TankCapacity => "TankCapacity",
            Column::UnitPublicPrice => "UnitPublicPrice",
        }
    }
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

static DEFAULT_COLUMNS: Lazy<ColumnMapping> = Lazy::new(|| ColumnMapping {
    product: aliases(&["Producto", "Product"]),
    date: aliases(&["Fecha", "Date", "Dia", "Day"]),
    daily_sales: aliases(&["Ventas", "Ventas_Diarias", "Venta", "Daily_Sales", "Sales"]),
    daily_purchases: aliases(&[
        "Compras",
        "Compras_Diarias",
        "Compra",
        "Daily_Purchases",
        "Purchases",
    ]),
    opening_stock: aliases(&["Existencia_Inicial", "Inventario_Inicial", "Opening_Stock"]),
    closing_physical_stock: aliases(&[
        "Final_Físico",
        "Existencia_Final",
        "Final_Fisica",
        "Closing_Physical_Stock",
        "Closing_Stock",
    ]),
    tank_capacity: aliases(&["Capacidad_Tanque", "Capacidad", "Tank_Capacity"]),
    unit_public_price: aliases(&[
        "PRECIO PÚBLICO (M3)",
        "Precio_Publico",
        "Precio",
        "Unit_Public_Price",
        "Unit_Price",
    ]),
});

/// Accepted header aliases per logical column, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub product: Vec<String>,
    pub date: Vec<String>,
    pub daily_sales: Vec<String>,
    pub daily_purchases: Vec<String>,
    pub opening_stock: Vec<String>,
    pub closing_physical_stock: Vec<String>,
    pub tank_capacity: Vec<String>,
    pub unit_public_price: Vec<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        DEFAULT_COLUMNS.clone()
    }
}

impl ColumnMapping {
    pub fn aliases(&self, column: Column) -> &[String] {
        match column {
            Column::Product => &self.product,
            Column::Date => &self.date,
            Column::DailySales => &self.daily_sales,
            Column::DailyPurchases => &self.daily_purchases,
            Column::OpeningStock => &self.opening_stock,
            Column::ClosingPhysicalStock => &self.closing_physical_stock,
            Column::TankCapacity => &self.tank_capacity,
            Column::UnitPublicPrice => &self.unit_public_price,
        }
    }

    /// Index of the header that matches `column`. Aliases are tried in
    /// order; for a given alias the leftmost matching header wins.
    pub fn resolve(&self, column: Column, headers: &[String]) -> Option<usize> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        self.aliases(column).iter().find_map(|alias| {
            let alias = normalize_header(alias);
            normalized.iter().position(|h| !h.is_empty() && *h == alias)
        })
    }
}

/// Case-insensitive, accent-folded header key; spaces, underscores, dashes
/// and dots are interchangeable.
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars().flat_map(char::to_lowercase) {
        let c = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            ' ' | '_' | '-' | '.' => {
                pending_sep = true;
                continue;
            }
            other => other,
        };
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    #[default]
    Inventory,
    Generic,
}

impl FromStr for AnalyzerKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inventory" => Ok(AnalyzerKind::Inventory),
            "generic" => Ok(AnalyzerKind::Generic),
            other => Err(ReportError::Config(format!(
                "unknown analyzer '{}', expected 'inventory' or 'generic'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub analyzer: AnalyzerKind,
    pub columns: ColumnMapping,
    /// Process sheets on the rayon pool.
    pub parallel: bool,
    /// Sheet used by the generic analyzer; the first sheet when absent.
    pub sheet: Option<String>,
}

impl AnalysisConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| ReportError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }
}
