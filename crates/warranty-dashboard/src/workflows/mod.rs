pub mod export;
pub mod reports;
pub mod sources;
pub mod summaries;

pub use export::{export_workbook, ExportError, ExportFile, ExportRequest, XLSX_CONTENT_TYPE};
pub use reports::{DatasetStatus, ReportKind, ReportStatus, UnknownReportKind, WarrantyReports};
