use super::table::{sum_amounts, Measure, SummaryColumn, SummaryTable, SummaryTableBuilder};
use crate::workflows::sources::{is_blank_division, ClaimRecord};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const TOTAL_CREDIT: &str = "Total Credit";
pub const TOTAL_DEBIT: &str = "Total Debit";
pub const PENDING_ARBITRATION: &str = "Pending Claim Arbitration";

pub fn credit_column(month: &str) -> String {
    format!("Credit Note {month}")
}

pub fn debit_column(month: &str) -> String {
    format!("Debit Note {month}")
}

pub fn arbitration_column(month: &str) -> String {
    format!("Claim Arbitration {month}")
}

/// The three division-by-month pivots of the warranty workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WarrantySummaries {
    pub credit: SummaryTable,
    pub debit: SummaryTable,
    pub arbitration: SummaryTable,
}

/// Claim amounts reduced to what the pivots need.
struct ClaimLine {
    division: String,
    month: String,
    credit: f64,
    debit: f64,
    arbitration: f64,
}

impl ClaimLine {
    fn from_record(record: &ClaimRecord) -> Option<Self> {
        let division = record.division()?;
        let arbitration = if record.is_arbitration() {
            record.debit_note_amount
        } else {
            0.0
        };

        Some(Self {
            division,
            month: record.month(),
            credit: record.credit_note_amount,
            debit: record.debit_note_amount,
            arbitration,
        })
    }
}

pub fn summarize_warranty(records: &[ClaimRecord], months: &[String]) -> WarrantySummaries {
    let lines: Vec<ClaimLine> = records.iter().filter_map(ClaimLine::from_record).collect();
    let divisions: BTreeSet<&str> = lines
        .iter()
        .map(|line| line.division.as_str())
        .filter(|division| !is_blank_division(division))
        .collect();

    let credit = monthly_pivot(
        &lines,
        &divisions,
        months,
        |line| line.credit,
        credit_column,
        TOTAL_CREDIT,
    );
    let debit = monthly_pivot(
        &lines,
        &divisions,
        months,
        |line| line.debit,
        debit_column,
        TOTAL_DEBIT,
    );
    let arbitration = arbitration_pivot(&lines, &divisions, months, &debit);

    WarrantySummaries {
        credit,
        debit,
        arbitration,
    }
}

/// Per division, one sum per month. Divisions or months without rows stay 0.
fn monthly_sums<'a, F>(
    lines: &[ClaimLine],
    divisions: &BTreeSet<&'a str>,
    months: &[String],
    amount: F,
) -> BTreeMap<&'a str, Vec<f64>>
where
    F: Fn(&ClaimLine) -> f64,
{
    let month_index: HashMap<&str, usize> = months
        .iter()
        .enumerate()
        .map(|(index, month)| (month.as_str(), index))
        .collect();

    let mut sums: BTreeMap<&str, Vec<f64>> = divisions
        .iter()
        .map(|division| (*division, vec![0.0; months.len()]))
        .collect();

    for line in lines {
        let Some(&index) = month_index.get(line.month.as_str()) else {
            continue;
        };
        if let Some(row) = sums.get_mut(line.division.as_str()) {
            row[index] += amount(line);
        }
    }

    sums
}

fn monthly_pivot<F, C>(
    lines: &[ClaimLine],
    divisions: &BTreeSet<&str>,
    months: &[String],
    amount: F,
    column: C,
    total: &str,
) -> SummaryTable
where
    F: Fn(&ClaimLine) -> f64,
    C: Fn(&str) -> String,
{
    let mut columns: Vec<SummaryColumn> = months
        .iter()
        .map(|month| SummaryColumn::amount(column(month)))
        .collect();
    columns.push(SummaryColumn::amount(total));

    let mut builder = SummaryTableBuilder::new(columns);
    for (division, sums) in monthly_sums(lines, divisions, months, amount) {
        let row_total = sum_amounts(sums.iter().copied());
        let mut values: Vec<Measure> = sums.into_iter().map(Measure::Amount).collect();
        values.push(Measure::Amount(row_total));
        builder.push_row(division, values);
    }
    builder.finish()
}

/// Arbitration amounts per month plus the residual of Total Debit not yet
/// recognized as arbitration. The residual may go negative.
fn arbitration_pivot(
    lines: &[ClaimLine],
    divisions: &BTreeSet<&str>,
    months: &[String],
    debit: &SummaryTable,
) -> SummaryTable {
    let mut columns: Vec<SummaryColumn> = months
        .iter()
        .map(|month| SummaryColumn::amount(arbitration_column(month)))
        .collect();
    columns.push(SummaryColumn::amount(PENDING_ARBITRATION));

    let total_debit_index = debit.column_index(TOTAL_DEBIT);
    let total_debit: HashMap<&str, f64> = debit
        .division_rows()
        .iter()
        .map(|row| {
            let amount = total_debit_index
                .and_then(|index| row.values().get(index))
                .map(|measure| measure.as_f64())
                .unwrap_or(0.0);
            (row.division(), amount)
        })
        .collect();

    let mut builder = SummaryTableBuilder::new(columns);
    for (division, sums) in monthly_sums(lines, divisions, months, |line| line.arbitration) {
        let arbitrated = sum_amounts(sums.iter().copied());
        let pending = total_debit.get(division).copied().unwrap_or(0.0) - arbitrated;
        let mut values: Vec<Measure> = sums.into_iter().map(Measure::Amount).collect();
        values.push(Measure::Amount(pending));
        builder.push_row(division, values);
    }
    builder.finish()
}
