use crate::config::DataConfig;
use crate::workflows::sources::{
    clean_division, columns, dealer_division, load_dataset, parse_records, Availability, Cell,
    DatasetKind, RawTable, SourceLocator, SourceRecords, Unavailable,
};
use crate::workflows::summaries::{
    summarize_compensation, summarize_current_month, summarize_pr_approval, summarize_warranty,
    SummaryTable, ALL_DIVISIONS, GRAND_TOTAL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// The six summary tables the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportKind {
    #[serde(rename = "credit")]
    Credit,
    #[serde(rename = "debit")]
    Debit,
    #[serde(rename = "arbitration")]
    Arbitration,
    #[serde(rename = "currentmonth", alias = "currentMonth")]
    CurrentMonth,
    #[serde(rename = "compensation")]
    Compensation,
    #[serde(rename = "pr_approval", alias = "prApproval")]
    PrApproval,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Credit,
        ReportKind::Debit,
        ReportKind::Arbitration,
        ReportKind::CurrentMonth,
        ReportKind::Compensation,
        ReportKind::PrApproval,
    ];

    /// Identifier used by the export API and in file names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Arbitration => "arbitration",
            Self::CurrentMonth => "currentmonth",
            Self::Compensation => "compensation",
            Self::PrApproval => "pr_approval",
        }
    }

    /// Key of the table in the `/api/data` payload.
    pub const fn json_key(self) -> &'static str {
        match self {
            Self::CurrentMonth => "currentMonth",
            Self::PrApproval => "prApproval",
            other => other.as_str(),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
            Self::Arbitration => "Arbitration",
            Self::CurrentMonth => "Current Month",
            Self::Compensation => "Compensation",
            Self::PrApproval => "PR Approval",
        }
    }

    pub const fn dataset(self) -> DatasetKind {
        match self {
            Self::Credit | Self::Debit | Self::Arbitration => DatasetKind::Warranty,
            Self::CurrentMonth => DatasetKind::CurrentMonth,
            Self::Compensation => DatasetKind::Compensation,
            Self::PrApproval => DatasetKind::PrApproval,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report type '{0}'")]
pub struct UnknownReportKind(pub String);

impl FromStr for ReportKind {
    type Err = UnknownReportKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        ReportKind::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str().eq_ignore_ascii_case(trimmed)
                    || kind.json_key().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownReportKind(value.to_string()))
    }
}

/// Load outcome of one dataset and the reports derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStatus {
    pub dataset: DatasetKind,
    pub file_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Unavailable>,
    pub reports: Vec<ReportStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStatus {
    pub kind: ReportKind,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Unavailable>,
}

/// Summaries built once at startup and shared read-only with every request.
#[derive(Debug, Clone)]
pub struct WarrantyReports {
    summaries: BTreeMap<ReportKind, Availability<SummaryTable>>,
    sources: BTreeMap<DatasetKind, Availability<RawTable>>,
    paths: BTreeMap<DatasetKind, PathBuf>,
}

impl WarrantyReports {
    /// Locates, reads and summarizes every dataset. A dataset that fails
    /// degrades to unavailable without affecting the others.
    pub fn load(config: &DataConfig) -> Self {
        let locator = SourceLocator::new(config.search_dirs.clone());
        let mut reports = Self::empty();

        for dataset in DatasetKind::ALL {
            let source = load_dataset(&locator, dataset).map(|loaded| {
                reports.paths.insert(dataset, loaded.path);
                loaded.table
            });
            reports.insert_source(dataset, source, &config.fiscal_months);
        }

        reports
    }

    /// Builds the snapshot from tables already in memory. Datasets not
    /// supplied are reported as not found.
    pub fn from_tables<I>(tables: I, fiscal_months: &[String]) -> Self
    where
        I: IntoIterator<Item = (DatasetKind, RawTable)>,
    {
        let mut supplied: BTreeMap<DatasetKind, RawTable> = tables.into_iter().collect();
        let mut reports = Self::empty();

        for dataset in DatasetKind::ALL {
            let source = match supplied.remove(&dataset) {
                Some(table) => Availability::Available(table),
                None => Availability::Unavailable(Unavailable::NotFound {
                    file_name: dataset.file_name().to_string(),
                }),
            };
            reports.insert_source(dataset, source, fiscal_months);
        }

        reports
    }

    fn empty() -> Self {
        Self {
            summaries: BTreeMap::new(),
            sources: BTreeMap::new(),
            paths: BTreeMap::new(),
        }
    }

    fn insert_source(
        &mut self,
        dataset: DatasetKind,
        source: Availability<RawTable>,
        fiscal_months: &[String],
    ) {
        for (kind, summary) in summarize_source(dataset, &source, fiscal_months) {
            match &summary {
                Availability::Available(table) => {
                    info!(report = %kind, divisions = table.division_rows().len(), "summary ready");
                }
                Availability::Unavailable(reason) => {
                    warn!(report = %kind, %reason, "summary unavailable");
                }
            }
            self.summaries.insert(kind, summary);
        }
        self.sources.insert(dataset, source);
    }

    pub fn summary(&self, kind: ReportKind) -> Option<&SummaryTable> {
        self.summaries.get(&kind).and_then(Availability::available)
    }

    pub fn source(&self, dataset: DatasetKind) -> Option<&RawTable> {
        self.sources.get(&dataset).and_then(Availability::available)
    }

    /// Division codes offered by the dashboard filter, taken from the credit table.
    pub fn divisions(&self) -> Vec<String> {
        self.summary(ReportKind::Credit)
            .map(|table| table.divisions().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Raw source rows behind `kind`, restricted to `division` unless it is
    /// `All` or `Grand Total`.
    pub fn detail(&self, kind: ReportKind, division: &str) -> Option<RawTable> {
        let dataset = kind.dataset();
        let table = self.source(dataset)?;
        if division == ALL_DIVISIONS || division == GRAND_TOTAL {
            return Some(table.clone());
        }

        let filtered = match dataset {
            DatasetKind::Warranty => {
                let location = table.column_index(columns::DEALER_LOCATION)?;
                table.filtered(|row| {
                    row[location]
                        .as_text()
                        .map(|value| dealer_division(&value) == division)
                        .unwrap_or(false)
                })
            }
            _ => {
                let column = table.column_index(columns::DIVISION)?;
                table.filtered(|row| division_matches(&row[column], division))
            }
        };
        Some(filtered)
    }

    pub fn statuses(&self) -> Vec<DatasetStatus> {
        DatasetKind::ALL
            .into_iter()
            .map(|dataset| {
                let source = self.sources.get(&dataset);
                let reports = ReportKind::ALL
                    .into_iter()
                    .filter(|kind| kind.dataset() == dataset)
                    .map(|kind| {
                        let summary = self.summaries.get(&kind);
                        ReportStatus {
                            kind,
                            available: summary.map(Availability::is_available).unwrap_or(false),
                            divisions: summary
                                .and_then(Availability::available)
                                .map(|table| table.division_rows().len()),
                            error: summary.and_then(Availability::reason).cloned(),
                        }
                    })
                    .collect();

                DatasetStatus {
                    dataset,
                    file_name: dataset.file_name(),
                    path: self.paths.get(&dataset).cloned(),
                    rows: source.and_then(Availability::available).map(RawTable::len),
                    error: source.and_then(Availability::reason).cloned(),
                    reports,
                }
            })
            .collect()
    }
}

fn division_matches(cell: &Cell, division: &str) -> bool {
    cell.as_text()
        .as_deref()
        .and_then(clean_division)
        .map(|value| value == division)
        .unwrap_or(false)
}

fn summarize_source(
    dataset: DatasetKind,
    source: &Availability<RawTable>,
    fiscal_months: &[String],
) -> Vec<(ReportKind, Availability<SummaryTable>)> {
    let kinds = ReportKind::ALL
        .into_iter()
        .filter(|kind| kind.dataset() == dataset);

    let table = match source {
        Availability::Available(table) => table,
        Availability::Unavailable(reason) => {
            return kinds
                .map(|kind| (kind, Availability::Unavailable(reason.clone())))
                .collect();
        }
    };

    let records = match parse_records(dataset, table) {
        Ok(records) => records,
        Err(missing) => {
            let reason = Unavailable::from(missing);
            return kinds
                .map(|kind| (kind, Availability::Unavailable(reason.clone())))
                .collect();
        }
    };

    match records {
        SourceRecords::Warranty(claims) => {
            let summaries = summarize_warranty(&claims, fiscal_months);
            vec![
                (ReportKind::Credit, Availability::Available(summaries.credit)),
                (ReportKind::Debit, Availability::Available(summaries.debit)),
                (
                    ReportKind::Arbitration,
                    Availability::Available(summaries.arbitration),
                ),
            ]
        }
        SourceRecords::CurrentMonth(pending) => vec![(
            ReportKind::CurrentMonth,
            Availability::Available(summarize_current_month(&pending)),
        )],
        SourceRecords::Compensation(sheet) => vec![(
            ReportKind::Compensation,
            Availability::Available(summarize_compensation(&sheet)),
        )],
        SourceRecords::PrApproval(sheet) => vec![(
            ReportKind::PrApproval,
            Availability::Available(summarize_pr_approval(&sheet)),
        )],
    }
}
