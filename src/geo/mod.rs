// src/geo/mod.rs
//
// Division boundaries are passed through untouched; only the properties
// needed for joining and popups are read.

use serde::{de::Error as _, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::classify::Shade;
use crate::error::DataFormatError;
use crate::index::DivisionId;

/// Property keys that may carry the division id, in priority order.
const ID_KEYS: [&str; 2] = ["IBLI_ID", "DIV_ID"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Value,
}

impl Feature {
    pub fn division_id(&self) -> Option<DivisionId> {
        ID_KEYS
            .iter()
            .find_map(|key| self.properties.get(*key).and_then(id_value))
    }

    pub fn name(&self) -> Option<&str> {
        self.text("IBLI_UNIT")
    }

    pub fn district(&self) -> Option<&str> {
        self.text("DISTRICT")
    }

    pub fn country(&self) -> Option<&str> {
        self.text("COUNTRY")
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

fn id_value(v: &Value) -> Option<DivisionId> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|id| DivisionId::try_from(id).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

/// The administrative boundary layer.
#[derive(Debug, Clone)]
pub struct DivisionCollection {
    features: Vec<Feature>,
}

impl DivisionCollection {
    pub fn from_geojson(raw: &str) -> Result<Self, DataFormatError> {
        let fc: FeatureCollection = serde_json::from_str(raw).map_err(DataFormatError::Geometry)?;
        if fc.kind != "FeatureCollection" {
            return Err(DataFormatError::Geometry(serde_json::Error::custom(format!(
                "expected FeatureCollection, got {}",
                fc.kind
            ))));
        }
        let unidentified = fc.features.iter().filter(|f| f.division_id().is_none()).count();
        debug!(features = fc.features.len(), unidentified, "loaded division geometry");
        Ok(Self {
            features: fc.features,
        })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn find(&self, division: DivisionId) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.division_id() == Some(division))
    }
}

/// Leaflet-style path options for one division polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub fill_color: &'static str,
    pub weight: u32,
    pub opacity: f64,
    pub stroke_color: &'static str,
    pub dash_pattern: &'static str,
    pub fill_opacity: f64,
}

impl FeatureStyle {
    pub fn for_shade(shade: Shade) -> Self {
        Self {
            fill_color: shade.color(),
            weight: 2,
            opacity: 1.0,
            stroke_color: "white",
            dash_pattern: "3",
            fill_opacity: 0.6,
        }
    }
}

/// Overrides applied while the pointer is over a division.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverStyle {
    pub weight: u32,
    pub fill_opacity: f64,
}

pub const HOVER_STYLE: HoverStyle = HoverStyle {
    weight: 2,
    fill_opacity: 0.2,
};

/// A feature ready for the map layer: its geometry plus computed style.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledFeature<'a> {
    pub division_id: Option<DivisionId>,
    pub name: Option<&'a str>,
    pub shade: Shade,
    pub style: FeatureStyle,
    pub geometry: &'a Value,
}

/// Attach a style to every feature. Features without an id get the
/// no-data shade.
pub fn style_features<F>(collection: &DivisionCollection, shade_of: F) -> Vec<StyledFeature<'_>>
where
    F: Fn(DivisionId) -> Shade,
{
    collection
        .features()
        .iter()
        .map(|f| {
            let id = f.division_id();
            let shade = id.map_or(Shade::NoData, &shade_of);
            StyledFeature {
                division_id: id,
                name: f.name(),
                shade,
                style: FeatureStyle::for_shade(shade),
                geometry: &f.geometry,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classify::ColorBand;

    pub(crate) const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "properties": {"IBLI_ID": 5, "IBLI_UNIT": "Laisamis", "DISTRICT": "MARSABIT", "COUNTRY": "KENYA"},
             "geometry": {"type": "Polygon", "coordinates": [[[37.0, 1.0], [37.5, 1.0], [37.5, 1.5], [37.0, 1.0]]]}},
            {"type": "Feature",
             "properties": {"DIV_ID": "7", "IBLI_UNIT": "Dillo", "COUNTRY": "ETHIOPIA"},
             "geometry": null},
            {"type": "Feature",
             "properties": {"IBLI_UNIT": "Nowhere"},
             "geometry": null}
        ]
    }"#;

    #[test]
    fn reads_ids_from_either_key() {
        let c = DivisionCollection::from_geojson(GEOJSON).unwrap();
        assert_eq!(c.len(), 3);
        let ids: Vec<_> = c.features().iter().map(Feature::division_id).collect();
        assert_eq!(ids, vec![Some(5), Some(7), None]);
        assert_eq!(c.find(7).unwrap().name(), Some("Dillo"));
        assert_eq!(c.find(5).unwrap().district(), Some("MARSABIT"));
    }

    #[test]
    fn rejects_non_collections() {
        let err = DivisionCollection::from_geojson(r#"{"type": "Feature", "features": []}"#);
        assert!(matches!(err, Err(DataFormatError::Geometry(_))));
        assert!(DivisionCollection::from_geojson("not json").is_err());
    }

    #[test]
    fn styles_follow_shades() {
        let c = DivisionCollection::from_geojson(GEOJSON).unwrap();
        let styled = style_features(&c, |id| {
            if id == 5 {
                Shade::Band(ColorBand::High)
            } else {
                Shade::NoData
            }
        });
        assert_eq!(styled[0].style.fill_color, "#AA0000");
        assert_eq!(styled[1].shade, Shade::NoData);
        assert_eq!(styled[2].shade, Shade::NoData);

        let json = serde_json::to_value(&styled[0].style).unwrap();
        assert_eq!(json["fillColor"], "#AA0000");
        assert_eq!(json["strokeColor"], "white");
        assert_eq!(json["dashPattern"], "3");
        assert_eq!(json["fillOpacity"], 0.6);
    }
}
