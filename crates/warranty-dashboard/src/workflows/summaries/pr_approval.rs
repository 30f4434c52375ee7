use super::table::{Measure, SummaryColumn, SummaryTable, SummaryTableBuilder};
use crate::workflows::sources::PrApprovalSheet;
use std::collections::BTreeMap;

pub const TOTAL_REQUESTS: &str = "Total Requests";
pub const TOTAL_APPROVED_AMOUNT: &str = "Total Approved Amount";

pub fn summarize_pr_approval(sheet: &PrApprovalSheet) -> SummaryTable {
    let mut totals: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for record in &sheet.records {
        let Some(division) = record.division.as_deref() else {
            continue;
        };
        let entry = totals.entry(division).or_default();
        entry.0 += 1;
        entry.1 += record.approved_amount;
    }

    let mut columns = vec![SummaryColumn::count(TOTAL_REQUESTS)];
    if sheet.has_approved_amount {
        columns.push(SummaryColumn::amount(TOTAL_APPROVED_AMOUNT));
    }

    let mut builder = SummaryTableBuilder::new(columns);
    for (division, (requests, approved)) in totals {
        let mut values = vec![Measure::Count(requests)];
        if sheet.has_approved_amount {
            values.push(Measure::Amount(approved));
        }
        builder.push_row(division, values);
    }
    builder.finish()
}
