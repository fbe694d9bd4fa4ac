// src/view/mod.rs
//
// Pure data → view-model transforms. Widget embedding is left to whatever
// renders the map.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calculator::{insurers_for, quote, Insurer, LivestockCounts, ValuationTable};
use crate::calendar::{payout_schedule, PayoutSchedule};
use crate::classify::{Classification, ColorBand, NO_DATA_COLOR};
use crate::geo::{Feature, StyledFeature, HOVER_STYLE, HoverStyle};
use crate::index::{DivisionId, Period};
use crate::rates::{RateLookup, RatesTable};
use crate::store::IndexSnapshot;

/// One entry of the period selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodOption {
    pub value: String,
    pub label: String,
}

impl From<&Period> for PeriodOption {
    fn from(p: &Period) -> Self {
        Self {
            value: p.value.clone(),
            label: p.label(),
        }
    }
}

pub fn period_options(catalog: &[Period]) -> Vec<PeriodOption> {
    catalog.iter().map(PeriodOption::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub band: Option<ColorBand>,
    pub color: &'static str,
    pub label: String,
}

/// Legend rows from lowest to extreme, then the no-data swatch.
pub fn legend(classification: &Classification) -> Vec<LegendEntry> {
    ColorBand::ALL
        .iter()
        .map(|band| LegendEntry {
            band: Some(*band),
            color: band.color(),
            label: classification.band_label(*band),
        })
        .chain(std::iter::once(LegendEntry {
            band: None,
            color: NO_DATA_COLOR,
            label: "No data".into(),
        }))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsurerLink {
    pub code: &'static str,
    pub name: &'static str,
    pub url: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsurerText {
    pub insurers: Vec<InsurerLink>,
    /// `"Takaful | APA"`, or `"TBD"` when nobody sells cover there yet.
    pub text: String,
}

impl InsurerText {
    pub fn new(insurers: &[Insurer]) -> Self {
        let links: Vec<InsurerLink> = insurers
            .iter()
            .map(|i| InsurerLink {
                code: i.code(),
                name: i.display_name(),
                url: i.website(),
            })
            .collect();
        let text = if links.is_empty() {
            "TBD".to_string()
        } else {
            links.iter().map(|l| l.name).collect::<Vec<_>>().join(" | ")
        };
        Self {
            insurers: links,
            text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverContent {
    pub division_name: String,
    pub style: HoverStyle,
}

/// Payload for the popup opened by clicking a division.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupContent {
    pub division_name: String,
    /// Percentage with two decimals; absent when the rate is unknown.
    pub premium_rate: Option<String>,
    /// Only for the current or a future period.
    pub insurers: Option<InsurerText>,
    pub calculator_available: bool,
    pub windows: Option<PayoutSchedule>,
}

fn division_name(feature: &Feature) -> String {
    match (feature.name(), feature.division_id()) {
        (Some(name), _) => name.to_string(),
        (None, Some(id)) => format!("Division {id}"),
        (None, None) => "Unnamed division".to_string(),
    }
}

/// Any hovered feature gets a payload, joinable or not.
pub fn hover_content(feature: &Feature) -> HoverContent {
    HoverContent {
        division_name: division_name(feature),
        style: HOVER_STYLE,
    }
}

pub fn popup_content(
    snapshot: &IndexSnapshot,
    rates: Option<&RatesTable>,
    division: DivisionId,
    today: NaiveDate,
) -> Option<PopupContent> {
    let feature = snapshot.geometry.find(division)?;
    let rate = rates.map_or(RateLookup::Unknown, |r| r.lookup(division, &snapshot.period));
    let insurers = insurers_for(feature.district(), feature.country());
    let current = snapshot.period.year >= today.year();

    Some(PopupContent {
        division_name: division_name(feature),
        premium_rate: rate.display(),
        insurers: current.then(|| InsurerText::new(&insurers)),
        calculator_available: rate.is_known() && !insurers.is_empty(),
        windows: current.then(|| payout_schedule(today)),
    })
}

/// Premium per eligible insurer for a herd in `division`. `None` when the
/// rate is unknown or no insurer covers the division.
pub fn premium_quote(
    snapshot: &IndexSnapshot,
    rates: Option<&RatesTable>,
    division: DivisionId,
    counts: &LivestockCounts,
    valuations: &ValuationTable,
) -> Option<BTreeMap<Insurer, f64>> {
    let feature = snapshot.geometry.find(division)?;
    let insurers = insurers_for(feature.district(), feature.country());
    if insurers.is_empty() {
        return None;
    }
    let rate = rates.map_or(RateLookup::Unknown, |r| r.lookup(division, &snapshot.period));
    quote(counts, rate, &insurers, valuations)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_url: &'static str,
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: LatLng {
                lat: 1.1864,
                lng: 37.925,
            },
            zoom: 6,
            min_zoom: 6,
            max_zoom: 9,
            tile_url: "http://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            south_west: LatLng {
                lat: -9.282399,
                lng: 31.662597,
            },
            north_east: LatLng {
                lat: 10.368303,
                lng: 44.703369,
            },
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel<'a> {
    pub period: PeriodOption,
    pub periods: Vec<PeriodOption>,
    pub legend: Vec<LegendEntry>,
    pub map: MapOptions,
    pub features: Vec<StyledFeature<'a>>,
}

pub fn render_model<'a>(
    snapshot: &'a IndexSnapshot,
    classification: &Classification,
) -> RenderModel<'a> {
    RenderModel {
        period: PeriodOption::from(&snapshot.period),
        periods: period_options(&snapshot.catalog),
        legend: legend(classification),
        map: MapOptions::default(),
        features: snapshot.styled_features(),
    }
}
