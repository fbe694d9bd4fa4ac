// src/index/mod.rs
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

use crate::error::DataFormatError;

pub mod period;

pub use period::{Period, SeasonFlag};

/// Numeric identifier of an insurance division.
pub type DivisionId = u32;

/// Index value per division for one period. Divisions without a usable
/// cell are simply absent.
pub type DivisionValues = BTreeMap<DivisionId, f64>;

/// A parsed index time series.
#[derive(Debug, Clone, Default)]
pub struct IndexTable {
    /// Reverse header-column order: the rightmost (newest) column first.
    periods: Vec<Period>,
    values: HashMap<String, DivisionValues>,
}

impl IndexTable {
    /// Period catalog, most recent first.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// The default period: the rightmost period column of the header.
    pub fn latest(&self) -> Option<&Period> {
        self.periods.first()
    }

    /// Periods in header-column order, oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &Period> {
        self.periods.iter().rev()
    }

    pub fn period(&self, value: &str) -> Option<&Period> {
        self.periods.iter().find(|p| p.value == value)
    }

    pub fn values(&self, period: &str) -> Option<&DivisionValues> {
        self.values.get(period)
    }

    pub fn value(&self, period: &str, division: DivisionId) -> Option<f64> {
        self.values(period)?.get(&division).copied()
    }

    /// Split out a single period's mapping, dropping the rest of the table.
    pub fn into_period(mut self, value: &str) -> Option<(Period, DivisionValues)> {
        let period = self.period(value)?.clone();
        let values = self.values.remove(value).unwrap_or_default();
        Some((period, values))
    }
}

/// Parse the comma-separated index file.
///
/// The first record is the header; every cell matching `YYYY[LS]` is a
/// period column and everything else (ids, names) is ignored. Each data
/// row starts with the division id. Cells whose id or value is not
/// numeric are left out of that period's mapping instead of failing the
/// whole payload; a duplicated division id keeps the last row.
pub fn parse_index_csv(raw: &str) -> Result<IndexTable, DataFormatError> {
    if raw.trim().is_empty() {
        return Err(DataFormatError::Empty);
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let mut records = rdr.records();
    let header = match records.next() {
        Some(rec) => rec?,
        None => return Err(DataFormatError::Empty),
    };

    let columns: Vec<(usize, Period)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| Period::from_header(cell).map(|p| (idx, p)))
        .collect();

    let mut values: HashMap<String, DivisionValues> = columns
        .iter()
        .map(|(_, p)| (p.value.clone(), DivisionValues::new()))
        .collect();

    let mut rows = 0usize;
    let mut skipped = 0usize;
    for (line, result) in records.enumerate() {
        let record = result?;
        if is_blank(&record) {
            continue;
        }
        rows += 1;

        let division = match record.get(0).and_then(|c| c.parse::<DivisionId>().ok()) {
            Some(id) => id,
            None => {
                trace!(line = line + 2, id = ?record.get(0), "skipping row without numeric division id");
                skipped += columns.len();
                continue;
            }
        };

        for (idx, period) in &columns {
            match record.get(*idx).and_then(parse_cell) {
                Some(v) => {
                    if let Some(map) = values.get_mut(&period.value) {
                        map.insert(division, v);
                    }
                }
                None => {
                    trace!(division, period = %period, "skipping non-numeric cell");
                    skipped += 1;
                }
            }
        }
    }

    let periods: Vec<Period> = columns.into_iter().rev().map(|(_, p)| p).collect();
    debug!(periods = periods.len(), rows, skipped, "parsed index table");

    Ok(IndexTable { periods, values })
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_periods_in_reverse_column_order() {
        let table = parse_index_csv("ID,2013S,2013L\n5,12,20\n").unwrap();

        let catalog: Vec<(&str, String)> = table
            .periods()
            .iter()
            .map(|p| (p.value.as_str(), p.label()))
            .collect();
        assert_eq!(
            catalog,
            vec![
                ("2013L", "2013, Long season".to_string()),
                ("2013S", "2013, Short season".to_string()),
            ]
        );
        assert_eq!(table.value("2013S", 5), Some(12.0));
        assert_eq!(table.value("2013L", 5), Some(20.0));
    }

    #[test]
    fn latest_is_rightmost_column() {
        let table = parse_index_csv("ID,NAME,2012L,2012S,2013L\n1,Foo,1,2,3\n").unwrap();
        assert_eq!(table.latest().unwrap().value, "2013L");
        let oldest_first: Vec<&str> = table.chronological().map(|p| p.value.as_str()).collect();
        assert_eq!(oldest_first, vec!["2012L", "2012S", "2013L"]);
    }

    #[test]
    fn header_without_periods_yields_no_periods() {
        let table = parse_index_csv("ID,NAME,DISTRICT\n1,Foo,Bar\n").unwrap();
        assert!(table.periods().is_empty());
        assert!(table.latest().is_none());
    }

    #[test]
    fn one_period_per_matching_column() {
        let table = parse_index_csv("ID,2010L,x,2010S,2011L,name\n").unwrap();
        assert_eq!(table.periods().len(), 3);
        assert!(table.values("2011L").unwrap().is_empty());
    }

    #[test]
    fn skips_blank_lines_and_bad_cells() {
        let raw = "ID,2013S,2013L\n\n1,0.05,abc\nfoo,1,2\n2,,0.2\n\n\n";
        let table = parse_index_csv(raw).unwrap();

        let short = table.values("2013S").unwrap();
        assert_eq!(short.len(), 1);
        assert_eq!(short.get(&1), Some(&0.05));

        let long = table.values("2013L").unwrap();
        assert_eq!(long.len(), 1);
        assert_eq!(long.get(&2), Some(&0.2));
    }

    #[test]
    fn stray_quote_does_not_swallow_later_rows() {
        let t = parse_index_csv("ID,NAME,2013S\n1,\"Foo,0.1\n2,Bar,0.2\n3,Baz,0.3\n").unwrap();
        let v = t.values("2013S").unwrap();
        assert_eq!(v.get(&1), Some(&0.1));
        assert_eq!(v.get(&2), Some(&0.2));
        assert_eq!(v.get(&3), Some(&0.3));
    }

    #[test]
    fn duplicate_division_keeps_last_row() {
        let table = parse_index_csv("ID,2013S\n7,1\n7,3\n").unwrap();
        assert_eq!(table.value("2013S", 7), Some(3.0));
        assert_eq!(table.values("2013S").unwrap().len(), 1);
    }

    #[test]
    fn short_rows_leave_divisions_absent() {
        let table = parse_index_csv("ID,2013S,2013L\n3,0.1\n").unwrap();
        assert_eq!(table.value("2013S", 3), Some(0.1));
        assert_eq!(table.value("2013L", 3), None);
    }

    #[test]
    fn empty_payload_is_a_format_error() {
        assert!(matches!(parse_index_csv(""), Err(DataFormatError::Empty)));
        assert!(matches!(parse_index_csv(" \n\n"), Err(DataFormatError::Empty)));
    }

    #[test]
    fn into_period_splits_one_mapping() {
        let table = parse_index_csv("ID,2013S,2013L\n5,12,20\n").unwrap();
        let (period, values) = table.into_period("2013L").unwrap();
        assert_eq!(period.value, "2013L");
        assert_eq!(values.get(&5), Some(&20.0));
    }
}
