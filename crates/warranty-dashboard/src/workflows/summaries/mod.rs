pub mod compensation;
pub mod current_month;
pub mod pr_approval;
mod table;
pub mod warranty;

pub use compensation::summarize_compensation;
pub use current_month::summarize_current_month;
pub use pr_approval::summarize_pr_approval;
pub use table::{
    Measure, MeasureKind, SummaryColumn, SummaryRow, SummaryTable, SummaryTableBuilder,
    TotalRule, ALL_DIVISIONS, DIVISION_COLUMN, GRAND_TOTAL,
};
pub use warranty::{summarize_warranty, WarrantySummaries};
