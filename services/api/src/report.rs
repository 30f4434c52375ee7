use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use warranty_dashboard::config::{AppConfig, DataConfig};
use warranty_dashboard::error::AppError;
use warranty_dashboard::workflows::summaries::{Measure, SummaryTable, ALL_DIVISIONS, DIVISION_COLUMN};
use warranty_dashboard::workflows::{export_workbook, ExportRequest, ReportKind, WarrantyReports};

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Report to print or export (credit, debit, arbitration, currentmonth, compensation, pr_approval).
    /// Prints every report when omitted.
    #[arg(long)]
    pub(crate) kind: Option<ReportKind>,
    /// Division code to keep, or `All`
    #[arg(long, default_value = ALL_DIVISIONS)]
    pub(crate) division: String,
    /// Write an Excel export to this path instead of printing
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Add the raw source rows as a Detail sheet to the export
    #[arg(long)]
    pub(crate) include_detail: bool,
    /// Read workbooks from this directory only
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Date stamped into the export file name (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        kind,
        division,
        output,
        include_detail,
        data_dir,
        today,
    } = args;

    let mut data = AppConfig::load()?.data;
    if let Some(dir) = data_dir {
        data = DataConfig {
            fiscal_months: data.fiscal_months,
            ..DataConfig::in_dir(dir)
        };
    }
    let reports = WarrantyReports::load(&data);

    if let Some(path) = output {
        let mut request = ExportRequest::new(kind.unwrap_or(ReportKind::Credit), division);
        request.include_detail = include_detail;
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        let file = export_workbook(&request, &reports, today)?;
        std::fs::write(&path, &file.bytes)?;
        println!("Wrote {} ({} bytes)", path.display(), file.bytes.len());
        return Ok(());
    }

    let kinds: Vec<ReportKind> = match kind {
        Some(kind) => vec![kind],
        None => ReportKind::ALL.to_vec(),
    };
    for kind in kinds {
        println!("{}", kind.label());
        match reports.summary(kind) {
            Some(table) => print!("{}", render_table(&table.for_division(&division))),
            None => println!("  unavailable"),
        }
        println!();
    }

    for status in reports.statuses() {
        if let Some(reason) = &status.error {
            println!("{}: {}", status.dataset, reason);
        }
    }

    Ok(())
}

fn format_measure(measure: Measure) -> String {
    match measure {
        Measure::Count(count) => count.to_string(),
        Measure::Amount(amount) => format!("{amount:.2}"),
    }
}

/// Renders the table with right-aligned value columns.
fn render_table(table: &SummaryTable) -> String {
    let mut header = vec![DIVISION_COLUMN.to_string()];
    header.extend(table.columns().iter().map(|column| column.name.clone()));

    let body: Vec<Vec<String>> = table
        .rows()
        .map(|row| {
            let mut cells = vec![row.division().to_string()];
            cells.extend(row.values().iter().copied().map(format_measure));
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|index| {
            body.iter()
                .map(|cells| cells[index].len())
                .chain(std::iter::once(header[index].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for cells in std::iter::once(&header).chain(body.iter()) {
        let line: String = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(index, (cell, &width))| {
                if index == 0 {
                    format!("  {cell:<width$}")
                } else {
                    format!("  {cell:>width$}")
                }
            })
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use warranty_dashboard::workflows::summaries::{SummaryColumn, SummaryTableBuilder};

    #[test]
    fn renders_aligned_rows_with_grand_total() {
        let mut builder = SummaryTableBuilder::new(vec![
            SummaryColumn::count("Total Requests"),
            SummaryColumn::amount("Total Approved Amount"),
        ]);
        builder.push_row("AMT", vec![Measure::Count(2), Measure::Amount(1200.5)]);
        builder.push_row("KOL", vec![Measure::Count(1), Measure::Amount(10.0)]);
        let rendered = render_table(&builder.finish());

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("  Division"));
        assert!(lines[1].ends_with("1200.50"));
        assert!(lines[3].starts_with("  Grand Total"));
        assert!(lines[3].ends_with("1210.50"));
    }
}
