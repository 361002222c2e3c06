//! Shared types and enums used across s2water.
//! Includes `ProductLevel`, the retrieval `OutputLayers` toggles and `NotificationKind`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sentinel-2 product family offered to the user.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, ValueEnum, Serialize, Deserialize,
)]
pub enum ProductLevel {
    #[default]
    #[value(name = "level-2a")]
    Level2A,
    #[value(name = "level-1c")]
    Level1C,
}

impl ProductLevel {
    /// Map a user-facing label to a product level. Unrecognized labels fall back to Level-2A.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Level-1C" => ProductLevel::Level1C,
            "Level-2A" => ProductLevel::Level2A,
            _ => ProductLevel::default(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductLevel::Level2A => "Level-2A",
            ProductLevel::Level1C => "Level-1C",
        }
    }

    /// Catalog `productType` attribute value.
    pub fn product_type_code(&self) -> &'static str {
        match self {
            ProductLevel::Level2A => "S2MSI2A",
            ProductLevel::Level1C => "S2MSI1C",
        }
    }
}

impl std::fmt::Display for ProductLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Output-layer toggles handed to the retrieval algorithm.
///
/// Each toggle is independent. Everything is enabled by default except uncertainties.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayers {
    /// Water-leaving reflectance as remote-sensing reflectance (Rrs)
    pub rrs: bool,
    /// Atmospherically corrected reflectance
    pub ac_reflectance: bool,
    /// Inherent optical properties (absorption/scattering)
    pub iop: bool,
    /// Bio-optical products (chlorophyll, TSM)
    pub iop_bio: bool,
    /// Diffuse attenuation (Kd)
    pub kd: bool,
    pub uncertainties: bool,
    /// Total concentrations
    pub total_concentrations: bool,
}

impl Default for OutputLayers {
    fn default() -> Self {
        Self {
            rrs: true,
            ac_reflectance: true,
            iop: true,
            iop_bio: true,
            kd: true,
            uncertainties: false,
            total_concentrations: true,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NotificationKind {
    Info,
    Error,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Info => write!(f, "Info"),
            NotificationKind::Error => write!(f, "Error"),
        }
    }
}
