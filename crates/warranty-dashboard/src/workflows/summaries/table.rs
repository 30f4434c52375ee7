use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

pub const DIVISION_COLUMN: &str = "Division";
pub const GRAND_TOTAL: &str = "Grand Total";
/// Export/filter keyword selecting every division.
pub const ALL_DIVISIONS: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    Count,
    Amount,
}

/// How the Grand Total row combines a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalRule {
    Sum,
    Mean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryColumn {
    pub name: String,
    pub kind: MeasureKind,
    pub total: TotalRule,
}

impl SummaryColumn {
    pub fn count(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MeasureKind::Count,
            total: TotalRule::Sum,
        }
    }

    pub fn amount(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MeasureKind::Amount,
            total: TotalRule::Sum,
        }
    }

    /// Rate-like amount whose Grand Total is the mean over divisions.
    pub fn mean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MeasureKind::Amount,
            total: TotalRule::Mean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Count(u64),
    Amount(f64),
}

impl Measure {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Count(count) => count as f64,
            Self::Amount(amount) => amount,
        }
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Count(count) => serializer.serialize_u64(count),
            Self::Amount(amount) => serializer.serialize_f64(amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    division: String,
    values: Vec<Measure>,
}

impl SummaryRow {
    pub fn division(&self) -> &str {
        &self.division
    }

    pub fn values(&self) -> &[Measure] {
        &self.values
    }

    pub fn is_grand_total(&self) -> bool {
        self.division == GRAND_TOTAL
    }
}

/// Per-division summary terminated by a Grand Total row.
///
/// Only [`SummaryTableBuilder::finish`] creates tables, so the Grand Total is
/// always derived from the finished division rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    columns: Vec<SummaryColumn>,
    divisions: Vec<SummaryRow>,
    grand_total: SummaryRow,
}

impl SummaryTable {
    pub fn columns(&self) -> &[SummaryColumn] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Division rows followed by the Grand Total row.
    pub fn rows(&self) -> impl Iterator<Item = &SummaryRow> {
        self.divisions.iter().chain(std::iter::once(&self.grand_total))
    }

    pub fn division_rows(&self) -> &[SummaryRow] {
        &self.divisions
    }

    pub fn grand_total(&self) -> &SummaryRow {
        &self.grand_total
    }

    pub fn divisions(&self) -> impl Iterator<Item = &str> {
        self.divisions.iter().map(SummaryRow::division)
    }

    /// True when no division contributed a row.
    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }

    pub fn value(&self, division: &str, column: &str) -> Option<Measure> {
        let index = self.column_index(column)?;
        self.rows()
            .find(|row| row.division == division)
            .and_then(|row| row.values.get(index).copied())
    }

    /// Rows of one division plus the Grand Total. `All` or `Grand Total`
    /// selects the whole table.
    pub fn for_division(&self, division: &str) -> SummaryTable {
        if division == ALL_DIVISIONS || division == GRAND_TOTAL {
            return self.clone();
        }

        SummaryTable {
            columns: self.columns.clone(),
            divisions: self
                .divisions
                .iter()
                .filter(|row| row.division == division)
                .cloned()
                .collect(),
            grand_total: self.grand_total.clone(),
        }
    }
}

/// Serializes as a list of objects keyed `Division` then each column in order.
impl Serialize for SummaryTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.divisions.len() + 1))?;
        for row in self.rows() {
            seq.serialize_element(&RowView {
                columns: &self.columns,
                row,
            })?;
        }
        seq.end()
    }
}

struct RowView<'a> {
    columns: &'a [SummaryColumn],
    row: &'a SummaryRow,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        map.serialize_entry(DIVISION_COLUMN, self.row.division())?;
        for (column, value) in self.columns.iter().zip(self.row.values()) {
            map.serialize_entry(&column.name, value)?;
        }
        map.end()
    }
}

pub struct SummaryTableBuilder {
    columns: Vec<SummaryColumn>,
    divisions: Vec<SummaryRow>,
}

impl SummaryTableBuilder {
    pub fn new(columns: Vec<SummaryColumn>) -> Self {
        Self {
            columns,
            divisions: Vec::new(),
        }
    }

    /// Appends a division row; `values` must line up with the columns.
    pub fn push_row(&mut self, division: impl Into<String>, values: Vec<Measure>) -> &mut Self {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "summary row width must match its columns"
        );
        self.divisions.push(SummaryRow {
            division: division.into(),
            values,
        });
        self
    }

    pub fn finish(self) -> SummaryTable {
        let values = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| total_for(column, &self.divisions, index))
            .collect();

        SummaryTable {
            columns: self.columns,
            divisions: self.divisions,
            grand_total: SummaryRow {
                division: GRAND_TOTAL.to_string(),
                values,
            },
        }
    }
}

/// Sums from `+0.0`, so a sum over nothing is `0` and never `-0`.
pub(crate) fn sum_amounts<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    amounts.into_iter().fold(0.0, |total, amount| total + amount)
}

fn total_for(column: &SummaryColumn, rows: &[SummaryRow], index: usize) -> Measure {
    match (column.total, column.kind) {
        (TotalRule::Sum, MeasureKind::Count) => Measure::Count(
            rows.iter()
                .map(|row| match row.values[index] {
                    Measure::Count(count) => count,
                    Measure::Amount(amount) => amount as u64,
                })
                .sum(),
        ),
        (TotalRule::Sum, MeasureKind::Amount) => {
            Measure::Amount(sum_amounts(rows.iter().map(|row| row.values[index].as_f64())))
        }
        (TotalRule::Mean, _) => {
            if rows.is_empty() {
                Measure::Amount(0.0)
            } else {
                let sum = sum_amounts(rows.iter().map(|row| row.values[index].as_f64()));
                Measure::Amount(sum / rows.len() as f64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SummaryTable {
        let mut builder = SummaryTableBuilder::new(vec![
            SummaryColumn::count("Total Claims"),
            SummaryColumn::amount("Total Claim Amount"),
            SummaryColumn::mean("Avg No. of Days"),
        ]);
        builder
            .push_row("AMT", vec![Measure::Count(2), Measure::Amount(150.5), Measure::Amount(4.0)])
            .push_row("CHI", vec![Measure::Count(1), Measure::Amount(30.0), Measure::Amount(10.0)]);
        builder.finish()
    }

    #[test]
    fn grand_total_is_last_and_follows_column_rules() {
        let table = sample();
        let last = table.rows().last().expect("grand total present");
        assert!(last.is_grand_total());
        assert_eq!(
            last.values(),
            &[Measure::Count(3), Measure::Amount(180.5), Measure::Amount(7.0)]
        );
    }

    #[test]
    fn empty_table_still_has_zero_grand_total() {
        let table = SummaryTableBuilder::new(vec![
            SummaryColumn::count("Total Requests"),
            SummaryColumn::mean("Avg No. of Days"),
        ])
        .finish();
        assert!(table.is_empty());
        assert_eq!(table.rows().count(), 1);
        assert_eq!(
            table.grand_total().values(),
            &[Measure::Count(0), Measure::Amount(0.0)]
        );
    }

    #[test]
    fn empty_amount_totals_are_positive_zero() {
        let table = SummaryTableBuilder::new(vec![
            SummaryColumn::amount("Total Approved Amount"),
            SummaryColumn::mean("Avg No. of Days"),
        ])
        .finish();
        assert!(table
            .grand_total()
            .values()
            .iter()
            .all(|value| value.as_f64().is_sign_positive()));

        let text = serde_json::to_string(&table).expect("serializes");
        assert!(!text.contains("-0"), "{text}");
        assert_eq!(sum_amounts(Vec::new()).to_string(), "0");
    }

    #[test]
    fn serializes_rows_in_column_order() {
        let value = serde_json::to_value(sample()).expect("serializes");
        assert_eq!(
            value[0],
            json!({
                "Division": "AMT",
                "Total Claims": 2,
                "Total Claim Amount": 150.5,
                "Avg No. of Days": 4.0
            })
        );
        assert_eq!(value[2]["Division"], "Grand Total");

        let text = serde_json::to_string(&sample()).expect("serializes");
        let division = text.find("\"Division\"").expect("division key");
        let claims = text.find("\"Total Claims\"").expect("claims key");
        assert!(division < claims);
    }

    #[test]
    fn division_filter_keeps_grand_total() {
        let table = sample();
        let filtered = table.for_division("CHI");
        let divisions: Vec<&str> = filtered.rows().map(SummaryRow::division).collect();
        assert_eq!(divisions, vec!["CHI", "Grand Total"]);
        assert_eq!(filtered.grand_total(), table.grand_total());

        assert_eq!(table.for_division("All"), table);
        assert_eq!(table.for_division("Grand Total"), table);
    }
}
