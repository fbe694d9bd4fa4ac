// src/calculator/mod.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::rates::RateLookup;

pub mod insurer;

pub use insurer::{insurers_for, Insurer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Cows,
    Camels,
    SheepGoats,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Cows, Species::Camels, Species::SheepGoats];
}

/// Head counts entered by the herder. Blank inputs count as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivestockCounts {
    pub cows: u32,
    pub camels: u32,
    #[serde(alias = "goats")]
    pub sheep_goats: u32,
}

impl LivestockCounts {
    pub fn from_inputs(cows: Option<u32>, camels: Option<u32>, sheep_goats: Option<u32>) -> Self {
        Self {
            cows: cows.unwrap_or(0),
            camels: camels.unwrap_or(0),
            sheep_goats: sheep_goats.unwrap_or(0),
        }
    }

    pub fn count(&self, species: Species) -> u32 {
        match species {
            Species::Cows => self.cows,
            Species::Camels => self.camels,
            Species::SheepGoats => self.sheep_goats,
        }
    }
}

/// Insured value per head, in local currency.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimalValues {
    pub cows: f64,
    pub camels: f64,
    #[serde(alias = "goats")]
    pub sheep_goats: f64,
}

impl AnimalValues {
    pub fn value(&self, species: Species) -> f64 {
        match species {
            Species::Cows => self.cows,
            Species::Camels => self.camels,
            Species::SheepGoats => self.sheep_goats,
        }
    }
}

/// Per-insurer valuation tables; each insurer values livestock differently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuationTable(BTreeMap<Insurer, AnimalValues>);

impl ValuationTable {
    pub fn new(tables: BTreeMap<Insurer, AnimalValues>) -> Self {
        Self(tables)
    }

    pub fn get(&self, insurer: Insurer) -> Option<&AnimalValues> {
        self.0.get(&insurer)
    }
}

impl Default for ValuationTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            (
                Insurer::Apa,
                AnimalValues {
                    cows: 20_000.0,
                    camels: 28_000.0,
                    sheep_goats: 2_000.0,
                },
            ),
            (
                Insurer::Tia,
                AnimalValues {
                    cows: 25_000.0,
                    camels: 35_000.0,
                    sheep_goats: 2_500.0,
                },
            ),
            (
                Insurer::Oic,
                AnimalValues {
                    cows: 6_000.0,
                    camels: 10_000.0,
                    sheep_goats: 8_000.0,
                },
            ),
        ]))
    }
}

/// Premium for a herd: total insured value times `rate_percent / 100`.
pub fn calculate(counts: &LivestockCounts, rate_percent: f64, values: &AnimalValues) -> f64 {
    let insured: f64 = Species::ALL
        .iter()
        .map(|s| counts.count(*s) as f64 * values.value(*s))
        .sum();
    insured * (rate_percent / 100.0)
}

/// One premium per eligible insurer, each priced with its own valuation
/// table. Insurers missing from `table` are left out.
pub fn calculate_for_insurers(
    counts: &LivestockCounts,
    rate_percent: f64,
    insurers: &[Insurer],
    table: &ValuationTable,
) -> BTreeMap<Insurer, f64> {
    insurers
        .iter()
        .filter_map(|insurer| match table.get(*insurer) {
            Some(values) => Some((*insurer, calculate(counts, rate_percent, values))),
            None => {
                warn!(insurer = insurer.code(), "no valuation table for insurer");
                None
            }
        })
        .collect()
}

/// Price a herd against a looked-up rate. Returns `None` when the rate is
/// unknown so no figure is shown.
pub fn quote(
    counts: &LivestockCounts,
    rate: RateLookup,
    insurers: &[Insurer],
    table: &ValuationTable,
) -> Option<BTreeMap<Insurer, f64>> {
    let percent = rate.percent()?;
    Some(calculate_for_insurers(counts, percent, insurers, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tia() -> AnimalValues {
        AnimalValues {
            cows: 25_000.0,
            camels: 35_000.0,
            sheep_goats: 2_500.0,
        }
    }

    #[test]
    fn worked_example() {
        let counts = LivestockCounts {
            cows: 2,
            camels: 0,
            sheep_goats: 1,
        };
        let amount = calculate(&counts, 10.0, &tia());
        assert!((amount - 5_250.0).abs() < 1e-9);
    }

    #[test]
    fn zero_counts_are_zero_for_every_insurer() {
        let counts = LivestockCounts::default();
        let out = calculate_for_insurers(
            &counts,
            7.5,
            &[Insurer::Apa, Insurer::Tia, Insurer::Oic],
            &ValuationTable::default(),
        );
        assert_eq!(out.len(), 3);
        assert!(out.values().all(|v| *v == 0.0));
    }

    #[test]
    fn blank_inputs_count_as_zero() {
        let counts = LivestockCounts::from_inputs(Some(1), None, None);
        assert_eq!(counts, LivestockCounts { cows: 1, camels: 0, sheep_goats: 0 });

        let parsed: LivestockCounts = serde_json::from_str(r#"{"cows": 3, "goats": 4}"#).unwrap();
        assert_eq!(parsed.camels, 0);
        assert_eq!(parsed.sheep_goats, 4);
    }

    #[test]
    fn insurers_price_with_their_own_tables() {
        let counts = LivestockCounts { cows: 1, camels: 1, sheep_goats: 1 };
        let out = calculate_for_insurers(
            &counts,
            10.0,
            &[Insurer::Tia, Insurer::Apa],
            &ValuationTable::default(),
        );
        assert!((out[&Insurer::Tia] - 6_250.0).abs() < 1e-9);
        assert!((out[&Insurer::Apa] - 5_000.0).abs() < 1e-9);
        assert!(!out.contains_key(&Insurer::Oic));
    }

    #[test]
    fn unknown_rate_gives_no_quote() {
        let counts = LivestockCounts { cows: 5, camels: 0, sheep_goats: 0 };
        let table = ValuationTable::default();
        assert!(quote(&counts, RateLookup::Unknown, &[Insurer::Tia], &table).is_none());

        let q = quote(&counts, RateLookup::Known(0.1), &[Insurer::Tia], &table).unwrap();
        assert!((q[&Insurer::Tia] - 12_500.0).abs() < 1e-9);
    }

    #[test]
    fn valuation_table_from_yaml() {
        let yaml = "APA:\n  cows: 1.0\n  camels: 2.0\n  goats: 3.0\n";
        let t: ValuationTable = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(t.get(Insurer::Apa).unwrap().sheep_goats, 3.0);
        assert!(t.get(Insurer::Tia).is_none());
    }
}
