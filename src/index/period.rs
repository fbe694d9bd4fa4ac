// src/index/period.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Header cells naming an index period, e.g. `2013S`.
static PERIOD_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}[LS]").expect("period pattern should compile"));

/// The year is the first run of four digits in the cell.
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("year pattern should compile"));

/// Which half of the year a period column covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SeasonFlag {
    Long,
    Short,
}

impl SeasonFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonFlag::Long => "Long season",
            SeasonFlag::Short => "Short season",
        }
    }

    /// Sales window label used as the prefix of a rates-table key.
    pub fn rate_season(&self) -> &'static str {
        match self {
            SeasonFlag::Long => "Aug/Sep",
            SeasonFlag::Short => "Jan/Feb",
        }
    }
}

/// One column of index data: a year plus a season marker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    /// The header cell exactly as it appears in the CSV.
    pub value: String,
    pub year: i32,
    pub season: SeasonFlag,
}

impl Period {
    /// Recognise a header cell as a period column. Cells without a
    /// `YYYY[LS]` run are not periods.
    pub fn from_header(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if !PERIOD_COLUMN.is_match(cell) {
            return None;
        }
        let year = YEAR.find(cell)?.as_str().parse().ok()?;
        let season = if cell.contains('S') {
            SeasonFlag::Short
        } else {
            SeasonFlag::Long
        };
        Some(Self {
            value: cell.to_string(),
            year,
            season,
        })
    }

    /// `"2013, Short season"`
    pub fn label(&self) -> String {
        format!("{}, {}", self.year, self.season.as_str())
    }

    /// Key into a division's rates map, e.g. `"Aug/Sep2014"`.
    pub fn rate_key(&self) -> String {
        format!("{}{}", self.season.rate_season(), self.year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_period_columns() {
        let p = Period::from_header("2013S").unwrap();
        assert_eq!(p.year, 2013);
        assert_eq!(p.season, SeasonFlag::Short);
        assert_eq!(p.label(), "2013, Short season");

        let p = Period::from_header(" 2014L ").unwrap();
        assert_eq!(p.value, "2014L");
        assert_eq!(p.season, SeasonFlag::Long);
        assert_eq!(p.label(), "2014, Long season");
    }

    #[test]
    fn year_is_first_four_digits() {
        let p = Period::from_header("12345L").unwrap();
        assert_eq!(p.year, 1234);
        assert_eq!(p.value, "12345L");
        assert_eq!(Period::from_header("NDVI2013S").unwrap().year, 2013);
    }

    #[test]
    fn ignores_other_columns() {
        assert!(Period::from_header("ID").is_none());
        assert!(Period::from_header("IBLI_UNIT").is_none());
        assert!(Period::from_header("2013").is_none());
        assert!(Period::from_header("201S").is_none());
    }

    #[test]
    fn rate_key_follows_sales_window() {
        assert_eq!(Period::from_header("2014L").unwrap().rate_key(), "Aug/Sep2014");
        assert_eq!(Period::from_header("2014S").unwrap().rate_key(), "Jan/Feb2014");
    }
}
