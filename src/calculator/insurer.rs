use serde::{Deserialize, Serialize};

/// Underwriters selling index-based livestock cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Insurer {
    #[serde(rename = "APA")]
    Apa,
    #[serde(rename = "TIA")]
    Tia,
    #[serde(rename = "OIC")]
    Oic,
}

impl Insurer {
    pub fn code(&self) -> &'static str {
        match self {
            Insurer::Apa => "APA",
            Insurer::Tia => "TIA",
            Insurer::Oic => "OIC",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Insurer::Apa => "APA",
            Insurer::Tia => "Takaful",
            Insurer::Oic => "OIC",
        }
    }

    pub fn website(&self) -> Option<&'static str> {
        match self {
            Insurer::Apa => Some("http://www.apainsurance.org/"),
            Insurer::Tia => Some("http://www.takafulafrica.com/"),
            Insurer::Oic => None,
        }
    }
}

/// Insurers operating in a division, from its district and country.
/// An empty result means no insurer is known yet ("TBD").
pub fn insurers_for(district: Option<&str>, country: Option<&str>) -> Vec<Insurer> {
    if country.is_some_and(|c| c.trim().eq_ignore_ascii_case("ETHIOPIA")) {
        return vec![Insurer::Oic];
    }

    let district = district.map(|d| d.trim().to_ascii_uppercase());
    match district.as_deref() {
        Some("WAJIR" | "MANDERA" | "GARISSA") => vec![Insurer::Tia],
        Some("ISIOLO") => vec![Insurer::Tia, Insurer::Apa],
        Some("MARSABIT") => vec![Insurer::Apa],
        _ => Vec::new(),
    }
}
