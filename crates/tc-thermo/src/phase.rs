//! Physical phase codes used by the source database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ThermoError;

/// Phase of a database record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "s", alias = "solid", alias = "cr")]
    Solid,
    #[serde(rename = "l", alias = "liquid")]
    Liquid,
    #[serde(rename = "g", alias = "gas")]
    Gas,
    #[serde(rename = "aq", alias = "aqueous")]
    Aqueous,
}

impl Phase {
    /// Short database code (`s`, `l`, `g`, `aq`).
    pub fn code(self) -> &'static str {
        match self {
            Self::Solid => "s",
            Self::Liquid => "l",
            Self::Gas => "g",
            Self::Aqueous => "aq",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Liquid => "liquid",
            Self::Gas => "gas",
            Self::Aqueous => "aqueous",
        }
    }

    /// Solid and liquid phases.
    pub fn is_condensed(self) -> bool {
        matches!(self, Self::Solid | Self::Liquid)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Phase {
    type Err = ThermoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "cr" | "solid" => Ok(Self::Solid),
            "l" | "liq" | "liquid" => Ok(Self::Liquid),
            "g" | "gas" => Ok(Self::Gas),
            "aq" | "aqueous" => Ok(Self::Aqueous),
            other => Err(ThermoError::InvalidParameter {
                what: format!("unknown phase code '{other}'"),
            }),
        }
    }
}
