mod normalizer;
mod records;
mod workbook;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

pub use normalizer::{clean_division, dealer_division, is_arbitration_id, is_blank_division, month_key};
pub use records::{
    columns, parse_records, ClaimRecord, CompensationRecord, CompensationSheet, MissingColumns,
    PendingClaimRecord, PrApprovalRecord, PrApprovalSheet, SourceRecords,
};
pub use workbook::{load_table, Cell, RawTable, WorkbookError};

/// The workbooks the dashboard knows how to summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Warranty,
    CurrentMonth,
    Compensation,
    PrApproval,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Warranty,
        DatasetKind::CurrentMonth,
        DatasetKind::Compensation,
        DatasetKind::PrApproval,
    ];

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Warranty => "Warranty Debit.xlsx",
            Self::CurrentMonth => "Pending Warranty Claim Details.xlsx",
            Self::Compensation => "Transit_Claims_Merged.xlsx",
            Self::PrApproval => "Pr_Approval_Claims_Merged.xlsx",
        }
    }

    /// Worksheet to read; `None` means the first sheet.
    pub const fn sheet(self) -> Option<&'static str> {
        match self {
            Self::Warranty => Some("Sheet1"),
            Self::CurrentMonth => Some("Pending Warranty Claim Details"),
            Self::Compensation | Self::PrApproval => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Warranty => "Warranty",
            Self::CurrentMonth => "Current Month",
            Self::Compensation => "Compensation",
            Self::PrApproval => "PR Approval",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a dataset, or a summary derived from it, has nothing to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unavailable {
    #[error("{file_name} was not found in any data directory")]
    NotFound { file_name: String },
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("missing columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },
}

impl From<MissingColumns> for Unavailable {
    fn from(value: MissingColumns) -> Self {
        Self::MissingColumns {
            columns: value.columns,
        }
    }
}

/// Outcome of a load or summarize step, consumed explicitly by callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    Available(T),
    Unavailable(Unavailable),
}

impl<T> Availability<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&Unavailable> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(reason) => Some(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn map<U, F>(self, f: F) -> Availability<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Available(value) => Availability::Available(f(value)),
            Self::Unavailable(reason) => Availability::Unavailable(reason),
        }
    }
}

/// Finds workbooks by file name across an ordered list of directories.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    dirs: Vec<PathBuf>,
}

impl SourceLocator {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// First directory holding a regular file called `file_name`.
    pub fn find(&self, file_name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.is_file())
    }
}

/// A worksheet together with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub path: PathBuf,
    pub table: RawTable,
}

/// Locates and reads one dataset. Failures are logged and reported as
/// `Unavailable`, never raised.
pub fn load_dataset(locator: &SourceLocator, dataset: DatasetKind) -> Availability<SourceTable> {
    let file_name = dataset.file_name();
    let Some(path) = locator.find(file_name) else {
        warn!(%dataset, file_name, "workbook not found");
        return Availability::Unavailable(Unavailable::NotFound {
            file_name: file_name.to_string(),
        });
    };

    match load_table(&path, dataset.sheet()) {
        Ok(table) => {
            info!(
                %dataset,
                path = %path.display(),
                sheet = table.sheet(),
                rows = table.len(),
                "workbook loaded"
            );
            Availability::Available(SourceTable { path, table })
        }
        Err(err) => {
            warn!(%dataset, error = %err, "workbook could not be read");
            Availability::Unavailable(Unavailable::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            })
        }
    }
}
