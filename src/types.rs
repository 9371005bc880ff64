// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Category of source files sharing one transform pipeline.
///
/// The set is fixed at compile time; the configuration decides which classes
/// are active and where their files live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    Markup,
    StylesPrecompiled,
    StylesSource,
    Scripts,
    ScriptsVendor,
    Images,
    ServerScripts,
}

impl AssetClass {
    /// Every class, in declaration order.
    pub const ALL: [AssetClass; 7] = [
        AssetClass::Markup,
        AssetClass::StylesPrecompiled,
        AssetClass::StylesSource,
        AssetClass::Scripts,
        AssetClass::ScriptsVendor,
        AssetClass::Images,
        AssetClass::ServerScripts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Markup => "markup",
            AssetClass::StylesPrecompiled => "styles-precompiled",
            AssetClass::StylesSource => "styles-source",
            AssetClass::Scripts => "scripts",
            AssetClass::ScriptsVendor => "scripts-vendor",
            AssetClass::Images => "images",
            AssetClass::ServerScripts => "server-scripts",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        AssetClass::ALL
            .into_iter()
            .find(|class| class.as_str() == wanted)
            .ok_or_else(|| format!("unknown asset class: {wanted}"))
    }
}

/// Build profile: which destination a transform writes to and how
/// aggressively output is optimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Dev,
    Release,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Dev => f.write_str("dev"),
            Mode::Release => f.write_str("release"),
        }
    }
}

/// Mode for storing watch content hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashStorageMode {
    /// Store hashes in a file (`.assetpipe/hashes`).
    File,
    /// Store hashes in memory only (lost on restart).
    #[default]
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_class_round_trips_through_its_name() {
        for class in AssetClass::ALL {
            assert_eq!(class.as_str().parse::<AssetClass>(), Ok(class));
        }
        assert!("stylesheets".parse::<AssetClass>().is_err());
    }
}
