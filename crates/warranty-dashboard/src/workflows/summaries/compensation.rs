use super::table::{Measure, SummaryColumn, SummaryTable, SummaryTableBuilder};
use crate::workflows::sources::CompensationSheet;
use std::collections::BTreeMap;

pub const TOTAL_CLAIMS: &str = "Total Claims";
pub const TOTAL_CLAIM_AMOUNT: &str = "Total Claim Amount";
pub const TOTAL_APPROVED_AMOUNT: &str = "Total Approved Amount";
pub const AVG_DAYS: &str = "Avg No. of Days";

#[derive(Default)]
struct CompensationTotals {
    claims: u64,
    claim_amount: f64,
    approved_amount: f64,
    days: f64,
}

/// Claim count and amounts per division. Measures whose source column is
/// absent are left out. The Grand Total of the day average is the mean of the
/// per-division averages.
pub fn summarize_compensation(sheet: &CompensationSheet) -> SummaryTable {
    let mut totals: BTreeMap<&str, CompensationTotals> = BTreeMap::new();
    for record in &sheet.records {
        let Some(division) = record.division.as_deref() else {
            continue;
        };
        let entry = totals.entry(division).or_default();
        entry.claims += 1;
        entry.claim_amount += record.claim_amount;
        entry.approved_amount += record.approved_amount;
        entry.days += record.days;
    }

    let mut columns = vec![SummaryColumn::count(TOTAL_CLAIMS)];
    if sheet.has_claim_amount {
        columns.push(SummaryColumn::amount(TOTAL_CLAIM_AMOUNT));
    }
    if sheet.has_approved_amount {
        columns.push(SummaryColumn::amount(TOTAL_APPROVED_AMOUNT));
    }
    if sheet.has_days {
        columns.push(SummaryColumn::mean(AVG_DAYS));
    }

    let mut builder = SummaryTableBuilder::new(columns);
    for (division, total) in totals {
        let mut values = vec![Measure::Count(total.claims)];
        if sheet.has_claim_amount {
            values.push(Measure::Amount(total.claim_amount));
        }
        if sheet.has_approved_amount {
            values.push(Measure::Amount(total.approved_amount));
        }
        if sheet.has_days {
            values.push(Measure::Amount(total.days / total.claims as f64));
        }
        builder.push_row(division, values);
    }
    builder.finish()
}
