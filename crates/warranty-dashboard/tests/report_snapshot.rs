use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;
use std::io::Cursor;
use std::path::Path;
use warranty_dashboard::config::DataConfig;
use warranty_dashboard::workflows::sources::{Cell, DatasetKind, Unavailable};
use warranty_dashboard::workflows::summaries::warranty::{
    credit_column, debit_column, PENDING_ARBITRATION, TOTAL_CREDIT, TOTAL_DEBIT,
};
use warranty_dashboard::workflows::summaries::{current_month, Measure, GRAND_TOTAL};
use warranty_dashboard::workflows::{
    export_workbook, ExportError, ExportRequest, ReportKind, WarrantyReports,
};

fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

fn write_fixture(dir: &Path, file_name: &str, sheet: &str, header: &[&str], rows: &[Vec<Cell>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).expect("valid sheet name");

    for (col, name) in header.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *name)
            .expect("header written");
    }
    for (index, row) in rows.iter().enumerate() {
        let row_number = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(value) => {
                    worksheet
                        .write_string(row_number, col, value)
                        .expect("text written");
                }
                Cell::Number(value) => {
                    worksheet
                        .write_number(row_number, col, *value)
                        .expect("number written");
                }
                Cell::Bool(value) => {
                    worksheet
                        .write_boolean(row_number, col, *value)
                        .expect("bool written");
                }
                Cell::Empty => {}
            }
        }
    }

    workbook
        .save(dir.join(file_name))
        .expect("fixture workbook saved");
}

fn write_warranty(dir: &Path) {
    write_fixture(
        dir,
        "Warranty Debit.xlsx",
        "Sheet1",
        &[
            "Dealer Location",
            "Fiscal Month",
            "Claim arbitration ID",
            "Total Claim Amount",
            "Credit Note Amount",
            "Debit Note Amount",
        ],
        &[
            vec![
                text("AMRAVATI"),
                text("Apr-24"),
                Cell::Empty,
                Cell::Number(500.0),
                Cell::Number(100.0),
                Cell::Number(40.0),
            ],
            vec![
                text("AMRAVATI"),
                text("May-24"),
                text("ARB-17"),
                Cell::Number(700.0),
                Cell::Number(50.0),
                Cell::Number(30.0),
            ],
            vec![
                text("WAGHOLI"),
                text("Apr-24"),
                Cell::Empty,
                Cell::Number(900.0),
                Cell::Number(200.0),
                Cell::Number(10.0),
            ],
            vec![
                text("PUNE_NEW"),
                text("Jan-25"),
                Cell::Empty,
                Cell::Number(10.0),
                Cell::Number(5.0),
                Cell::Number(0.0),
            ],
        ],
    );
}

fn write_pending(dir: &Path) {
    write_fixture(
        dir,
        "Pending Warranty Claim Details.xlsx",
        "Pending Warranty Claim Details",
        &["Division", "Pending Claims Spares", "Pending Claims Labour"],
        &[
            vec![text("AMT"), text("Y"), Cell::Empty],
            vec![text("AMT"), text("Y"), text("Y")],
            vec![text("WAG"), Cell::Empty, Cell::Number(1.0)],
            vec![Cell::Empty, text("Y"), text("Y")],
        ],
    );
}

fn write_compensation_without_division(dir: &Path) {
    write_fixture(
        dir,
        "Transit_Claims_Merged.xlsx",
        "Claims",
        &["Branch", "Claim Amount"],
        &[vec![text("AMT"), Cell::Number(75.0)]],
    );
}

fn loaded_reports(dir: &Path) -> WarrantyReports {
    WarrantyReports::load(&DataConfig::in_dir(dir))
}

#[test]
fn warranty_workbook_builds_division_month_pivots() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_warranty(dir.path());
    let reports = loaded_reports(dir.path());

    let credit = reports.summary(ReportKind::Credit).expect("credit summary");
    let divisions: Vec<&str> = credit.divisions().collect();
    assert_eq!(divisions, vec!["AMT", "PUNE_NEW", "WAG"]);
    assert_eq!(reports.divisions(), vec!["AMT", "PUNE_NEW", "WAG"]);

    assert_eq!(
        credit.value("AMT", &credit_column("Apr")),
        Some(Measure::Amount(100.0))
    );
    assert_eq!(
        credit.value("AMT", &credit_column("May")),
        Some(Measure::Amount(50.0))
    );
    assert_eq!(
        credit.value("WAG", &credit_column("May")),
        Some(Measure::Amount(0.0))
    );
    // Jan is outside the fiscal months: the division is listed with zeros.
    assert_eq!(
        credit.value("PUNE_NEW", TOTAL_CREDIT),
        Some(Measure::Amount(0.0))
    );
    assert_eq!(
        credit.value(GRAND_TOTAL, TOTAL_CREDIT),
        Some(Measure::Amount(350.0))
    );

    let debit = reports.summary(ReportKind::Debit).expect("debit summary");
    assert_eq!(
        debit.value(GRAND_TOTAL, &debit_column("Apr")),
        Some(Measure::Amount(50.0))
    );
    assert_eq!(debit.value("AMT", TOTAL_DEBIT), Some(Measure::Amount(70.0)));

    let arbitration = reports
        .summary(ReportKind::Arbitration)
        .expect("arbitration summary");
    assert_eq!(
        arbitration.value("AMT", PENDING_ARBITRATION),
        Some(Measure::Amount(40.0))
    );
    assert_eq!(
        arbitration.value("WAG", PENDING_ARBITRATION),
        Some(Measure::Amount(10.0))
    );
}

#[test]
fn grand_total_is_last_and_sums_every_division() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_warranty(dir.path());
    let reports = loaded_reports(dir.path());
    let credit = reports.summary(ReportKind::Credit).expect("credit summary");

    let last = credit.rows().last().expect("grand total row");
    assert!(last.is_grand_total());

    for (index, column) in credit.columns().iter().enumerate() {
        let sum: f64 = credit
            .division_rows()
            .iter()
            .map(|row| row.values()[index].as_f64())
            .sum();
        assert_eq!(
            credit.grand_total().values()[index].as_f64(),
            sum,
            "grand total of {}",
            column.name
        );
    }
}

#[test]
fn pending_claims_are_counted_per_division() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_pending(dir.path());
    let reports = loaded_reports(dir.path());
    let pending = reports
        .summary(ReportKind::CurrentMonth)
        .expect("current month summary");

    let divisions: Vec<&str> = pending.divisions().collect();
    assert_eq!(divisions, vec!["AMT", "WAG"]);
    assert_eq!(
        pending.value("AMT", current_month::SPARES_COUNT),
        Some(Measure::Count(2))
    );
    assert_eq!(
        pending.value("AMT", current_month::TOTAL_PENDING),
        Some(Measure::Count(3))
    );
    assert_eq!(
        pending.value(GRAND_TOTAL, current_month::TOTAL_PENDING),
        Some(Measure::Count(4))
    );
}

#[test]
fn failures_are_isolated_per_dataset() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_warranty(dir.path());
    write_compensation_without_division(dir.path());
    let reports = loaded_reports(dir.path());

    assert!(reports.summary(ReportKind::Credit).is_some());
    assert!(reports.summary(ReportKind::Compensation).is_none());
    assert!(reports.source(DatasetKind::Compensation).is_some());
    assert!(reports.summary(ReportKind::PrApproval).is_none());

    let statuses = reports.statuses();
    let compensation = statuses
        .iter()
        .find(|status| status.dataset == DatasetKind::Compensation)
        .expect("compensation status");
    assert_eq!(compensation.rows, Some(1));
    assert_eq!(
        compensation.reports[0].error,
        Some(Unavailable::MissingColumns {
            columns: vec!["Division".to_string()],
        })
    );

    let pr = statuses
        .iter()
        .find(|status| status.dataset == DatasetKind::PrApproval)
        .expect("pr approval status");
    assert!(matches!(pr.error, Some(Unavailable::NotFound { .. })));
}

#[test]
fn unreadable_workbook_is_reported_not_raised() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("Warranty Debit.xlsx"), b"not a workbook").expect("written");
    let reports = loaded_reports(dir.path());

    assert!(reports.summary(ReportKind::Credit).is_none());
    let warranty = &reports.statuses()[0];
    assert!(matches!(warranty.error, Some(Unavailable::Read { .. })));
}

fn read_back(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    Xlsx::new(Cursor::new(bytes)).expect("export is a readable workbook")
}

#[test]
fn export_selects_division_and_grand_total() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_warranty(dir.path());
    let reports = loaded_reports(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 11, 5).expect("valid date");

    let request = ExportRequest::new(ReportKind::Credit, "AMT");
    let file = export_workbook(&request, &reports, today).expect("export succeeds");
    assert_eq!(file.file_name, "credit_AMT_20241105.xlsx");

    let mut workbook = read_back(file.bytes);
    assert_eq!(workbook.sheet_names(), vec!["credit".to_string()]);
    let range = workbook.worksheet_range("credit").expect("summary sheet");
    assert_eq!(range.height(), 3);
    assert_eq!(
        range.get_value((0, 0)),
        Some(&Data::String("Division".to_string()))
    );
    assert_eq!(range.get_value((1, 0)), Some(&Data::String("AMT".to_string())));
    assert_eq!(
        range.get_value((2, 0)),
        Some(&Data::String("Grand Total".to_string()))
    );
}

#[test]
fn export_all_includes_every_row_and_optional_detail() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_warranty(dir.path());
    let reports = loaded_reports(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 11, 5).expect("valid date");

    let mut request = ExportRequest::new(ReportKind::Arbitration, "WAG");
    request.include_detail = true;
    let file = export_workbook(&request, &reports, today).expect("export succeeds");

    let mut workbook = read_back(file.bytes);
    assert_eq!(
        workbook.sheet_names(),
        vec!["arbitration".to_string(), "Detail".to_string()]
    );
    let detail = workbook.worksheet_range("Detail").expect("detail sheet");
    assert_eq!(detail.height(), 2);
    assert_eq!(
        detail.get_value((1, 0)),
        Some(&Data::String("WAGHOLI".to_string()))
    );

    let request = ExportRequest::new(ReportKind::Credit, "All");
    let file = export_workbook(&request, &reports, today).expect("export succeeds");
    let mut workbook = read_back(file.bytes);
    let range = workbook.worksheet_range("credit").expect("summary sheet");
    assert_eq!(range.height(), 5);
}

#[test]
fn export_without_data_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let reports = loaded_reports(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 11, 5).expect("valid date");

    let request = ExportRequest::new(ReportKind::Compensation, "All");
    let err = export_workbook(&request, &reports, today).expect_err("nothing to export");
    assert!(matches!(err, ExportError::NoData));
}

#[test]
fn header_only_sheet_exports_its_grand_total() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_fixture(
        dir.path(),
        "Pr_Approval_Claims_Merged.xlsx",
        "Claims",
        &["Division", "App. Claim Amt from M&M"],
        &[],
    );
    let reports = loaded_reports(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 11, 5).expect("valid date");

    let table = reports.summary(ReportKind::PrApproval).expect("pr summary");
    assert!(table.is_empty());

    let request = ExportRequest::new(ReportKind::PrApproval, "All");
    let file = export_workbook(&request, &reports, today).expect("export succeeds");
    let mut workbook = read_back(file.bytes);
    let range = workbook.worksheet_range("pr_approval").expect("summary sheet");
    assert_eq!(range.height(), 2);
    assert_eq!(
        range.get_value((1, 0)),
        Some(&Data::String("Grand Total".to_string()))
    );
    assert_eq!(range.get_value((1, 2)), Some(&Data::Float(0.0)));
}
