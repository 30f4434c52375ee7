use super::normalizer::{clean_division, dealer_division, is_arbitration_id, month_key};
use super::workbook::{Cell, RawTable};
use super::DatasetKind;

/// Column headers the summarizers read.
pub mod columns {
    pub const DIVISION: &str = "Division";

    pub const DEALER_LOCATION: &str = "Dealer Location";
    pub const FISCAL_MONTH: &str = "Fiscal Month";
    pub const ARBITRATION_ID: &str = "Claim arbitration ID";
    pub const CREDIT_NOTE_AMOUNT: &str = "Credit Note Amount";
    pub const DEBIT_NOTE_AMOUNT: &str = "Debit Note Amount";

    pub const PENDING_SPARES: &str = "Pending Claims Spares";
    pub const PENDING_LABOUR: &str = "Pending Claims Labour";

    pub const CLAIM_AMOUNT: &str = "Claim Amount";
    pub const CLAIM_APPROVED_AMOUNT: &str = "Claim Approved Amt.";
    pub const NUMBER_OF_DAYS: &str = "No. of Days";

    pub const PR_APPROVED_AMOUNT: &str = "App. Claim Amt from M&M";
}

/// One row of the warranty debit workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
    pub dealer_location: Option<String>,
    pub fiscal_month: String,
    pub arbitration_id: Option<String>,
    pub credit_note_amount: f64,
    pub debit_note_amount: f64,
}

impl ClaimRecord {
    pub fn division(&self) -> Option<String> {
        self.dealer_location.as_deref().map(dealer_division)
    }

    pub fn month(&self) -> String {
        month_key(&self.fiscal_month)
    }

    pub fn is_arbitration(&self) -> bool {
        self.arbitration_id
            .as_deref()
            .map(is_arbitration_id)
            .unwrap_or(false)
    }
}

/// One row of the pending warranty claim details workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingClaimRecord {
    pub division: Option<String>,
    pub spares_pending: bool,
    pub labour_pending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompensationRecord {
    pub division: Option<String>,
    pub claim_amount: f64,
    pub approved_amount: f64,
    pub days: f64,
}

/// Compensation rows plus which optional measure columns the sheet carried.
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationSheet {
    pub has_claim_amount: bool,
    pub has_approved_amount: bool,
    pub has_days: bool,
    pub records: Vec<CompensationRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrApprovalRecord {
    pub division: Option<String>,
    pub approved_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrApprovalSheet {
    pub has_approved_amount: bool,
    pub records: Vec<PrApprovalRecord>,
}

/// Typed rows of one of the known datasets.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecords {
    Warranty(Vec<ClaimRecord>),
    CurrentMonth(Vec<PendingClaimRecord>),
    Compensation(CompensationSheet),
    PrApproval(PrApprovalSheet),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing columns: {}", .columns.join(", "))]
pub struct MissingColumns {
    pub columns: Vec<String>,
}

/// Positional accessor over one raw row; absent columns read as empty cells.
struct RowReader<'a> {
    row: &'a [Cell],
}

impl<'a> RowReader<'a> {
    fn cell(&self, index: Option<usize>) -> &'a Cell {
        static EMPTY: Cell = Cell::Empty;
        index.and_then(|i| self.row.get(i)).unwrap_or(&EMPTY)
    }

    fn text(&self, index: Option<usize>) -> Option<String> {
        self.cell(index).as_text()
    }

    fn amount(&self, index: Option<usize>) -> f64 {
        self.cell(index).as_amount()
    }

    fn present(&self, index: Option<usize>) -> bool {
        !self.cell(index).is_missing()
    }

    fn division(&self, index: Option<usize>) -> Option<String> {
        self.text(index).as_deref().and_then(clean_division)
    }
}

fn rows(table: &RawTable) -> impl Iterator<Item = RowReader<'_>> {
    table.rows().iter().map(|row| RowReader { row })
}

fn require(table: &RawTable, required: &[&str]) -> Result<(), MissingColumns> {
    let columns = table.missing_columns(required);
    if columns.is_empty() {
        Ok(())
    } else {
        Err(MissingColumns { columns })
    }
}

/// Converts a loaded worksheet into the typed rows of `dataset`.
pub fn parse_records(dataset: DatasetKind, table: &RawTable) -> Result<SourceRecords, MissingColumns> {
    match dataset {
        DatasetKind::Warranty => Ok(SourceRecords::Warranty(parse_claims(table))),
        DatasetKind::CurrentMonth => parse_pending_claims(table).map(SourceRecords::CurrentMonth),
        DatasetKind::Compensation => parse_compensation(table).map(SourceRecords::Compensation),
        DatasetKind::PrApproval => parse_pr_approval(table).map(SourceRecords::PrApproval),
    }
}

/// Absent warranty columns default to empty text or zero amounts.
fn parse_claims(table: &RawTable) -> Vec<ClaimRecord> {
    let location = table.column_index(columns::DEALER_LOCATION);
    let month = table.column_index(columns::FISCAL_MONTH);
    let arbitration = table.column_index(columns::ARBITRATION_ID);
    let credit = table.column_index(columns::CREDIT_NOTE_AMOUNT);
    let debit = table.column_index(columns::DEBIT_NOTE_AMOUNT);

    rows(table)
        .map(|row| ClaimRecord {
            dealer_location: row.text(location),
            fiscal_month: row.text(month).unwrap_or_default(),
            arbitration_id: row.text(arbitration).filter(|id| id != "nan" && !id.is_empty()),
            credit_note_amount: row.amount(credit),
            debit_note_amount: row.amount(debit),
        })
        .collect()
}

fn parse_pending_claims(table: &RawTable) -> Result<Vec<PendingClaimRecord>, MissingColumns> {
    require(
        table,
        &[columns::DIVISION, columns::PENDING_SPARES, columns::PENDING_LABOUR],
    )?;
    let division = table.column_index(columns::DIVISION);
    let spares = table.column_index(columns::PENDING_SPARES);
    let labour = table.column_index(columns::PENDING_LABOUR);

    Ok(rows(table)
        .map(|row| PendingClaimRecord {
            division: row.division(division),
            spares_pending: row.present(spares),
            labour_pending: row.present(labour),
        })
        .collect())
}

fn parse_compensation(table: &RawTable) -> Result<CompensationSheet, MissingColumns> {
    require(table, &[columns::DIVISION])?;
    let division = table.column_index(columns::DIVISION);
    let claim_amount = table.column_index(columns::CLAIM_AMOUNT);
    let approved_amount = table.column_index(columns::CLAIM_APPROVED_AMOUNT);
    let days = table.column_index(columns::NUMBER_OF_DAYS);

    let records = rows(table)
        .map(|row| CompensationRecord {
            division: row.division(division),
            claim_amount: row.amount(claim_amount),
            approved_amount: row.amount(approved_amount),
            days: row.amount(days),
        })
        .collect();

    Ok(CompensationSheet {
        has_claim_amount: claim_amount.is_some(),
        has_approved_amount: approved_amount.is_some(),
        has_days: days.is_some(),
        records,
    })
}

fn parse_pr_approval(table: &RawTable) -> Result<PrApprovalSheet, MissingColumns> {
    require(table, &[columns::DIVISION])?;
    let division = table.column_index(columns::DIVISION);
    let approved_amount = table.column_index(columns::PR_APPROVED_AMOUNT);

    let records = rows(table)
        .map(|row| PrApprovalRecord {
            division: row.division(division),
            approved_amount: row.amount(approved_amount),
        })
        .collect();

    Ok(PrApprovalSheet {
        has_approved_amount: approved_amount.is_some(),
        records,
    })
}
