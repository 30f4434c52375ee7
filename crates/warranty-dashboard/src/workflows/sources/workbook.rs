//! Worksheet loading into a row-oriented [`RawTable`].

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveTime;
use std::path::{Path, PathBuf};

/// A single worksheet cell after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(value) if value.time() == NaiveTime::MIN => {
                    Cell::Text(value.format("%Y-%m-%d").to_string())
                }
                Some(value) => Cell::Text(value.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => Cell::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text form of the cell. Whole numbers render without a fractional part
    /// so numeric division or month cells compare like their typed text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// Numeric coercion: anything that is not a finite number counts as zero.
    pub fn as_amount(&self) -> f64 {
        let value = match self {
            Cell::Empty => 0.0,
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Cell::Bool(true) => 1.0,
            Cell::Bool(false) => 0.0,
        };

        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Header plus data rows of one worksheet. Every row has exactly one cell per
/// column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    sheet: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(sheet: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self {
            sheet: sheet.into(),
            columns,
            rows,
        }
    }

    /// Treats the first row of the range as the header.
    pub fn from_range(sheet: impl Into<String>, range: &Range<Data>) -> Self {
        let mut rows = range.rows();
        let columns = match rows.next() {
            Some(header) => header
                .iter()
                .map(|cell| Cell::from_data(cell).as_text().unwrap_or_default().trim().to_string())
                .collect(),
            None => Vec::new(),
        };

        let body = rows
            .map(|row| row.iter().map(Cell::from_data).collect())
            .filter(|row: &Vec<Cell>| row.iter().any(|cell| !cell.is_missing()))
            .collect();

        Self::new(sheet, columns, body)
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Required column names absent from the header, in the order given.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Copy of the table keeping only rows accepted by `keep`.
    pub fn filtered<F>(&self, mut keep: F) -> RawTable
    where
        F: FnMut(&[Cell]) -> bool,
    {
        RawTable {
            sheet: self.sheet.clone(),
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("unable to open workbook {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("unable to read sheet '{sheet}' of {}: {source}", .path.display())]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("workbook {} has no worksheets", .path.display())]
    NoSheets { path: PathBuf },
}

/// Reads `sheet` (or the first worksheet) of the workbook at `path`.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<RawTable, WorkbookError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| WorkbookError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| WorkbookError::NoSheets {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|source| WorkbookError::Sheet {
            path: path.to_path_buf(),
            sheet: sheet_name.clone(),
            source,
        })?;

    Ok(RawTable::from_range(sheet_name, &range))
}
