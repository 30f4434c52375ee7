use super::table::{Measure, SummaryColumn, SummaryTable, SummaryTableBuilder};
use crate::workflows::sources::PendingClaimRecord;
use std::collections::BTreeMap;

pub const SPARES_COUNT: &str = "Pending Claims Spares Count";
pub const LABOUR_COUNT: &str = "Pending Claims Labour Count";
pub const TOTAL_PENDING: &str = "Total Pending Claims";

/// Counts non-empty spares and labour cells per division.
pub fn summarize_current_month(records: &[PendingClaimRecord]) -> SummaryTable {
    let mut counts: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for record in records {
        let Some(division) = record.division.as_deref() else {
            continue;
        };
        let entry = counts.entry(division).or_default();
        entry.0 += u64::from(record.spares_pending);
        entry.1 += u64::from(record.labour_pending);
    }

    let mut builder = SummaryTableBuilder::new(vec![
        SummaryColumn::count(SPARES_COUNT),
        SummaryColumn::count(LABOUR_COUNT),
        SummaryColumn::count(TOTAL_PENDING),
    ]);
    for (division, (spares, labour)) in counts {
        builder.push_row(
            division,
            vec![
                Measure::Count(spares),
                Measure::Count(labour),
                Measure::Count(spares + labour),
            ],
        );
    }
    builder.finish()
}
