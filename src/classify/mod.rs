// src/classify/mod.rs
//
// Colour ramp runs in ascending severity: a higher index value lands in a
// more severe band. Ranked data uses the inverse ordinal, rank 1 = extreme.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ClassifyError;

/// Fill used for divisions with no index value in the active period.
pub const NO_DATA_COLOR: &str = "#BBBBBB";

/// One of the five ordinal severity classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBand {
    Lowest,
    Low,
    Medium,
    High,
    Extreme,
}

impl ColorBand {
    pub const ALL: [ColorBand; 5] = [
        ColorBand::Lowest,
        ColorBand::Low,
        ColorBand::Medium,
        ColorBand::High,
        ColorBand::Extreme,
    ];

    pub fn color(&self) -> &'static str {
        match self {
            ColorBand::Lowest => "#00AA00",
            ColorBand::Low => "#DDDD00",
            ColorBand::Medium => "#BB5500",
            ColorBand::High => "#AA0000",
            ColorBand::Extreme => "#000000",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorBand::Lowest => "lowest",
            ColorBand::Low => "low",
            ColorBand::Medium => "medium",
            ColorBand::High => "high",
            ColorBand::Extreme => "extreme",
        }
    }

    /// Precomputed rank for this band; 1 is the most severe.
    pub fn rank(&self) -> u8 {
        5 - *self as u8
    }

    fn from_index(i: usize) -> Self {
        Self::ALL[i.min(4)]
    }
}

/// What a division is painted with: a classified band or the no-data fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shade {
    Band(ColorBand),
    NoData,
}

impl Shade {
    pub fn color(&self) -> &'static str {
        match self {
            Shade::Band(b) => b.color(),
            Shade::NoData => NO_DATA_COLOR,
        }
    }

    pub fn band(&self) -> Option<ColorBand> {
        match self {
            Shade::Band(b) => Some(*b),
            Shade::NoData => None,
        }
    }
}

/// Four ascending cut points splitting the value axis into five bands.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct Thresholds([f64; 4]);

impl Thresholds {
    pub fn new(cuts: [f64; 4]) -> Result<Self, ClassifyError> {
        let finite = cuts.iter().all(|c| c.is_finite());
        let ascending = cuts.windows(2).all(|w| w[0] < w[1]);
        if finite && ascending {
            Ok(Self(cuts))
        } else {
            Err(ClassifyError::UnsortedThresholds)
        }
    }

    pub fn cuts(&self) -> &[f64; 4] {
        &self.0
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self([0.06, 0.08, 0.10, 0.15])
    }
}

impl TryFrom<[f64; 4]> for Thresholds {
    type Error = ClassifyError;

    fn try_from(cuts: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(cuts)
    }
}

impl From<Thresholds> for [f64; 4] {
    fn from(t: Thresholds) -> Self {
        t.0
    }
}

/// Band for a scalar value. Intervals are half-open, so a value equal to a
/// cut point belongs to the higher band; anything at or past the last cut
/// is extreme.
pub fn classify(value: f64, thresholds: &Thresholds) -> ColorBand {
    let idx = thresholds
        .cuts()
        .iter()
        .position(|cut| value < *cut)
        .unwrap_or(4);
    ColorBand::from_index(idx)
}

/// Band for a precomputed rank, 1 (extreme) through 5 (lowest).
pub fn classify_by_rank(rank: i64) -> Result<ColorBand, ClassifyError> {
    if !(1..=5).contains(&rank) {
        return Err(ClassifyError::RankOutOfRange(rank));
    }
    Ok(ColorBand::from_index((5 - rank) as usize))
}

/// How index values in the data file map to bands.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Classification {
    Thresholds { cuts: Thresholds },
    Ranked,
}

impl Default for Classification {
    fn default() -> Self {
        Classification::Thresholds {
            cuts: Thresholds::default(),
        }
    }
}

impl Classification {
    pub fn shade(&self, value: f64) -> Shade {
        match self {
            Classification::Thresholds { cuts } => Shade::Band(classify(value, cuts)),
            Classification::Ranked => {
                if value.fract() != 0.0 {
                    warn!(value, "non-integral rank in ranked index data");
                    return Shade::NoData;
                }
                match classify_by_rank(value as i64) {
                    Ok(band) => Shade::Band(band),
                    Err(e) => {
                        warn!(error = %e, "unusable rank in ranked index data");
                        Shade::NoData
                    }
                }
            }
        }
    }

    /// Human range covered by `band`, for the legend.
    pub fn band_label(&self, band: ColorBand) -> String {
        match self {
            Classification::Thresholds { cuts } => {
                let c = cuts.cuts();
                match band {
                    ColorBand::Lowest => format!("< {}", c[0]),
                    ColorBand::Low => format!("{} - {}", c[0], c[1]),
                    ColorBand::Medium => format!("{} - {}", c[1], c[2]),
                    ColorBand::High => format!("{} - {}", c[2], c[3]),
                    ColorBand::Extreme => format!(">= {}", c[3]),
                }
            }
            Classification::Ranked => format!("Rank {}", band.rank()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_thresholds_scenarios() {
        let t = Thresholds::default();
        assert_eq!(classify(0.07, &t), ColorBand::Low);
        assert_eq!(classify(0.20, &t), ColorBand::Extreme);
        assert_eq!(classify(0.0, &t), ColorBand::Lowest);
        assert_eq!(classify(-3.0, &t), ColorBand::Lowest);
        assert_eq!(classify(0.12, &t), ColorBand::High);
    }

    #[test]
    fn equal_to_threshold_is_higher_band() {
        let t = Thresholds::default();
        assert_eq!(classify(0.06, &t), ColorBand::Low);
        assert_eq!(classify(0.08, &t), ColorBand::Medium);
        assert_eq!(classify(0.10, &t), ColorBand::High);
        assert_eq!(classify(0.15, &t), ColorBand::Extreme);
    }

    #[test]
    fn rank_one_is_extreme() {
        assert_eq!(classify_by_rank(1), Ok(ColorBand::Extreme));
        assert_eq!(classify_by_rank(3), Ok(ColorBand::Medium));
        assert_eq!(classify_by_rank(5), Ok(ColorBand::Lowest));
        for band in ColorBand::ALL {
            assert_eq!(classify_by_rank(band.rank() as i64), Ok(band));
        }
    }

    #[test]
    fn rank_out_of_range_fails() {
        assert_eq!(classify_by_rank(0), Err(ClassifyError::RankOutOfRange(0)));
        assert_eq!(classify_by_rank(6), Err(ClassifyError::RankOutOfRange(6)));
    }

    #[test]
    fn thresholds_must_ascend() {
        assert!(Thresholds::new([0.1, 0.2, 0.3, 0.4]).is_ok());
        assert_eq!(
            Thresholds::new([0.1, 0.1, 0.3, 0.4]),
            Err(ClassifyError::UnsortedThresholds)
        );
        assert!(Thresholds::new([0.1, f64::NAN, 0.3, 0.4]).is_err());
    }

    #[test]
    fn ranked_scheme_shades() {
        let c = Classification::Ranked;
        assert_eq!(c.shade(2.0), Shade::Band(ColorBand::High));
        assert_eq!(c.shade(2.5), Shade::NoData);
        assert_eq!(c.shade(9.0), Shade::NoData);
    }

    #[test]
    fn no_data_is_distinct_from_bands() {
        assert!(ColorBand::ALL.iter().all(|b| b.color() != NO_DATA_COLOR));
        assert_eq!(Shade::NoData.band(), None);
    }

    #[test]
    fn legend_labels_follow_cuts() {
        let c = Classification::default();
        assert_eq!(c.band_label(ColorBand::Lowest), "< 0.06");
        assert_eq!(c.band_label(ColorBand::Medium), "0.08 - 0.1");
        assert_eq!(c.band_label(ColorBand::Extreme), ">= 0.15");
        assert_eq!(Classification::Ranked.band_label(ColorBand::Extreme), "Rank 1");
    }

    #[test]
    fn classification_from_yaml() {
        let c: Classification =
            serde_yaml::from_str("scheme: thresholds\ncuts: [0.1, 0.2, 0.3, 0.4]\n").unwrap();
        assert_eq!(c.shade(0.25), Shade::Band(ColorBand::Medium));

        let c: Classification = serde_yaml::from_str("scheme: ranked\n").unwrap();
        assert_eq!(c, Classification::Ranked);

        let bad = serde_yaml::from_str::<Classification>("scheme: thresholds\ncuts: [0.4, 0.3, 0.2, 0.1]\n");
        assert!(bad.is_err());
    }

    fn ascending_cuts() -> impl Strategy<Value = [f64; 4]> {
        (-10.0f64..10.0, prop::array::uniform4(0.001f64..5.0)).prop_map(|(start, gaps)| {
            let mut cuts = [0.0; 4];
            let mut acc = start;
            for (i, g) in gaps.iter().enumerate() {
                acc += g;
                cuts[i] = acc;
            }
            cuts
        })
    }

    proptest! {
        #[test]
        fn boundaries_split_adjacent_bands(cuts in ascending_cuts()) {
            let t = Thresholds::new(cuts).unwrap();
            for (i, cut) in cuts.iter().enumerate() {
                let below = classify(cut - 1e-6, &t);
                let at = classify(*cut, &t);
                prop_assert_eq!(below, ColorBand::ALL[i]);
                prop_assert_eq!(at, ColorBand::ALL[i + 1]);
            }
        }

        #[test]
        fn every_value_gets_a_band(v in proptest::num::f64::ANY) {
            let band = classify(v, &Thresholds::default());
            prop_assert!(ColorBand::ALL.contains(&band));
        }
    }
}
