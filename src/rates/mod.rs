// src/rates/mod.rs

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::DataFormatError;
use crate::index::{DivisionId, Period};

/// Result of a premium-rate lookup. `Unknown` means the division (or its
/// season key) is not covered, which is not the same thing as a 0% rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "fraction", rename_all = "snake_case")]
pub enum RateLookup {
    Known(f64),
    Unknown,
}

impl RateLookup {
    pub fn fraction(&self) -> Option<f64> {
        match self {
            RateLookup::Known(f) => Some(*f),
            RateLookup::Unknown => None,
        }
    }

    pub fn percent(&self) -> Option<f64> {
        self.fraction().map(|f| f * 100.0)
    }

    /// Percentage rounded to two decimals, e.g. `"12.34"`.
    pub fn display(&self) -> Option<String> {
        self.percent().map(|p| format!("{:.2}", p))
    }

    pub fn is_known(&self) -> bool {
        matches!(self, RateLookup::Known(_))
    }
}

/// Premium rates: division → `"{Jan/Feb|Aug/Sep}{year}"` → fraction.
#[derive(Debug, Clone, Default)]
pub struct RatesTable {
    rates: HashMap<DivisionId, HashMap<String, f64>>,
}

impl RatesTable {
    /// Deserialize the rates JSON object. Entries with a non-numeric
    /// division key or a rate outside `[0, 1]` are dropped.
    pub fn from_json(raw: &str) -> Result<Self, DataFormatError> {
        let parsed: HashMap<String, HashMap<String, Value>> =
            serde_json::from_str(raw).map_err(DataFormatError::Rates)?;

        let mut rates = HashMap::with_capacity(parsed.len());
        for (key, seasons) in parsed {
            let division = match key.trim().parse::<DivisionId>() {
                Ok(id) => id,
                Err(_) => {
                    warn!(key = %key, "ignoring rates entry with non-numeric division id");
                    continue;
                }
            };

            let by_season: HashMap<String, f64> = seasons
                .into_iter()
                .filter_map(|(season, v)| match rate_value(&v) {
                    Some(r) => Some((season, r)),
                    None => {
                        debug!(division, season = %season, value = %v, "dropping unusable rate");
                        None
                    }
                })
                .collect();
            rates.insert(division, by_season);
        }

        debug!(divisions = rates.len(), "loaded rates table");
        Ok(Self { rates })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn covers(&self, division: DivisionId) -> bool {
        self.rates.contains_key(&division)
    }

    pub fn lookup(&self, division: DivisionId, period: &Period) -> RateLookup {
        lookup(self, division, period)
    }
}

/// Resolve the unrounded premium fraction for `division` in `period`.
pub fn lookup(table: &RatesTable, division: DivisionId, period: &Period) -> RateLookup {
    table
        .rates
        .get(&division)
        .and_then(|seasons| seasons.get(&period.rate_key()))
        .map_or(RateLookup::Unknown, |r| RateLookup::Known(*r))
}

fn rate_value(v: &Value) -> Option<f64> {
    let r = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (r.is_finite() && (0.0..=1.0).contains(&r)).then_some(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: &str = r#"{
        "5": {"Aug/Sep2014": 0.0725, "Jan/Feb2014": 0.061},
        "12": {"Aug/Sep2014": "0.1"},
        "13": {"Aug/Sep2014": null, "Jan/Feb2015": 1.7},
        "abc": {"Aug/Sep2014": 0.2}
    }"#;

    fn period(v: &str) -> Period {
        Period::from_header(v).unwrap()
    }

    #[test]
    fn resolves_season_and_year_key() {
        let t = RatesTable::from_json(RATES).unwrap();
        assert_eq!(t.lookup(5, &period("2014L")), RateLookup::Known(0.0725));
        assert_eq!(t.lookup(5, &period("2014S")), RateLookup::Known(0.061));
        assert_eq!(t.lookup(12, &period("2014L")), RateLookup::Known(0.1));
    }

    #[test]
    fn missing_division_is_unknown_not_zero() {
        let t = RatesTable::from_json(RATES).unwrap();
        let r = lookup(&t, 99, &period("2014L"));
        assert_eq!(r, RateLookup::Unknown);
        assert_eq!(r.display(), None);
        assert!(!t.covers(99));
    }

    #[test]
    fn missing_or_bad_season_is_unknown() {
        let t = RatesTable::from_json(RATES).unwrap();
        assert_eq!(t.lookup(5, &period("2013L")), RateLookup::Unknown);
        assert_eq!(t.lookup(13, &period("2014L")), RateLookup::Unknown);
        assert_eq!(t.lookup(13, &period("2015S")), RateLookup::Unknown);
        assert!(t.covers(13));
    }

    #[test]
    fn non_numeric_division_keys_dropped() {
        let t = RatesTable::from_json(RATES).unwrap();
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn lookup_is_deterministic() {
        let t = RatesTable::from_json(RATES).unwrap();
        let p = period("2014L");
        let first = t.lookup(5, &p);
        for _ in 0..10 {
            assert_eq!(t.lookup(5, &p), first);
        }
    }

    #[test]
    fn display_rounds_only_at_presentation() {
        let r = RateLookup::Known(0.072_549);
        assert_eq!(r.fraction(), Some(0.072_549));
        assert_eq!(r.display().as_deref(), Some("7.25"));
    }

    #[test]
    fn invalid_json_is_format_error() {
        assert!(matches!(
            RatesTable::from_json("[1, 2]"),
            Err(DataFormatError::Rates(_))
        ));
    }
}
