use crate::core::models::{LocationCode, TrackerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game distribution target, each served by its own world-state host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Platform {
    #[default]
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "PS4")]
    Ps4,
    #[serde(rename = "XB1")]
    Xb1,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Pc, Platform::Ps4, Platform::Xb1];

    pub fn id(&self) -> &'static str {
        match self {
            Platform::Pc => "PC",
            Platform::Ps4 => "PS4",
            Platform::Xb1 => "XB1",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PC" => Ok(Platform::Pc),
            "PS4" => Ok(Platform::Ps4),
            "XB1" => Ok(Platform::Xb1),
            other => Err(format!(
                "Unknown platform '{other}' (expected one of PC, PS4, XB1)"
            )),
        }
    }
}

const LOCATIONS: [(u32, &str); 8] = [
    (505, "Ruse War Field"),
    (510, "Gian Point"),
    (550, "Nsu Grid"),
    (551, "Ganalen's Grave"),
    (552, "Rya"),
    (553, "Flexa"),
    (554, "H-2 Cloud"),
    (555, "R-9 Cloud"),
];

/// Static lookups for endpoints and location names
pub struct PlatformRegistry;

impl PlatformRegistry {
    /// Host suffix inserted into the endpoint template
    pub fn endpoint_for(platform: Platform) -> &'static str {
        match platform {
            Platform::Pc => "",
            Platform::Ps4 => ".ps4",
            Platform::Xb1 => ".xb1",
        }
    }

    pub fn location_name(code: LocationCode) -> Result<&'static str, TrackerError> {
        LOCATIONS
            .iter()
            .find(|(known, _)| *known == code.0)
            .map(|(_, name)| *name)
            .ok_or(TrackerError::UnknownLocation(code.0))
    }

    pub fn locations() -> impl Iterator<Item = (LocationCode, &'static str)> {
        LOCATIONS
            .iter()
            .map(|(code, name)| (LocationCode(*code), *name))
    }

    /// Build the full URL for a platform from a template containing `{suffix}`
    pub fn endpoint_url(template: &str, platform: Platform) -> String {
        template.replace("{suffix}", Self::endpoint_for(platform))
    }
}
