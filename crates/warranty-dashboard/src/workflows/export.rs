//! Excel re-export of the summary tables.

use crate::workflows::reports::{ReportKind, WarrantyReports};
use crate::workflows::sources::{Cell, RawTable};
use crate::workflows::summaries::{SummaryTable, ALL_DIVISIONS, DIVISION_COLUMN};
use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, Workbook, XlsxError};
use serde::Deserialize;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADER_COLOR: u32 = 0xFF8C00;
const AMOUNT_FORMAT: &str = "#,##0.00";
const SHEET_NAME_LIMIT: usize = 20;
const DETAIL_SHEET: &str = "Detail";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportRequest {
    #[serde(default = "default_division")]
    pub division: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ReportKind,
    /// Adds a sheet with the raw source rows behind the summary.
    #[serde(default)]
    pub include_detail: bool,
}

fn default_division() -> String {
    ALL_DIVISIONS.to_string()
}

fn default_kind() -> ReportKind {
    ReportKind::Credit
}

impl ExportRequest {
    pub fn new(kind: ReportKind, division: impl Into<String>) -> Self {
        Self {
            division: division.into(),
            kind,
            include_detail: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The requested summary could not be built. A summary without division
    /// rows still exports its Grand Total row.
    #[error("No data")]
    NoData,
    #[error("failed to write workbook: {0}")]
    Workbook(#[from] XlsxError),
}

/// Builds the export workbook for `request` in memory.
pub fn export_workbook(
    request: &ExportRequest,
    reports: &WarrantyReports,
    today: NaiveDate,
) -> Result<ExportFile, ExportError> {
    let table = reports.summary(request.kind).ok_or(ExportError::NoData)?;
    let selected = table.for_division(&request.division);

    let mut workbook = Workbook::new();
    let sheet_name: String = request.kind.as_str().chars().take(SHEET_NAME_LIMIT).collect();
    write_summary_sheet(&mut workbook, &sheet_name, &selected)?;

    if request.include_detail {
        if let Some(detail) = reports.detail(request.kind, &request.division) {
            write_detail_sheet(&mut workbook, &detail)?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    Ok(ExportFile {
        file_name: export_file_name(request, today),
        bytes,
    })
}

pub fn export_file_name(request: &ExportRequest, today: NaiveDate) -> String {
    format!(
        "{}_{}_{}.xlsx",
        request.kind.as_str(),
        sanitize(&request.division),
        today.format("%Y%m%d")
    )
}

/// Keeps file names header-safe.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_COLOR))
}

fn write_summary_sheet(
    workbook: &mut Workbook,
    name: &str,
    table: &SummaryTable,
) -> Result<(), XlsxError> {
    let header = header_format();
    let amount = Format::new().set_num_format(AMOUNT_FORMAT);

    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;

    sheet.write_string_with_format(0, 0, DIVISION_COLUMN, &header)?;
    for (index, column) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, (index + 1) as u16, &column.name, &header)?;
    }

    for (index, row) in table.rows().enumerate() {
        let row_number = (index + 1) as u32;
        sheet.write_string(row_number, 0, row.division())?;
        for (col, value) in row.values().iter().enumerate() {
            sheet.write_number_with_format(row_number, (col + 1) as u16, value.as_f64(), &amount)?;
        }
    }

    sheet.autofit();
    Ok(())
}

fn write_detail_sheet(workbook: &mut Workbook, table: &RawTable) -> Result<(), XlsxError> {
    let header = header_format();
    let amount = Format::new().set_num_format(AMOUNT_FORMAT);

    let sheet = workbook.add_worksheet();
    sheet.set_name(DETAIL_SHEET)?;

    for (index, column) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, index as u16, column, &header)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let row_number = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    sheet.write_string(row_number, col, text)?;
                }
                Cell::Number(number) => {
                    sheet.write_number_with_format(row_number, col, *number, &amount)?;
                }
                Cell::Bool(flag) => {
                    sheet.write_boolean(row_number, col, *flag)?;
                }
            }
        }
    }

    sheet.autofit();
    Ok(())
}
