use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw display dimensions as reported by the host, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
    /// Logical density in dots per inch (160 = baseline density).
    pub density_dpi: u32,
}

impl DisplayMetrics {
    pub fn new(width_px: u32, height_px: u32, density_dpi: u32) -> Self {
        Self {
            width_px,
            height_px,
            density_dpi,
        }
    }
}

/// Coarse device form-factor bucket derived from the short side of the
/// display in density-independent units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenClass {
    /// Short side below 600dp.
    Phone,
    /// Short side in `600..720` dp.
    Hybrid,
    /// Short side of 720dp or more.
    Tablet,
}

impl ScreenClass {
    pub fn is_phone(self) -> bool {
        self == ScreenClass::Phone
    }

    pub fn is_hybrid(self) -> bool {
        self == ScreenClass::Hybrid
    }

    pub fn is_tablet(self) -> bool {
        self == ScreenClass::Tablet
    }
}

impl fmt::Display for ScreenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenClass::Phone => write!(f, "phone"),
            ScreenClass::Hybrid => write!(f, "hybrid"),
            ScreenClass::Tablet => write!(f, "tablet"),
        }
    }
}

/// Per-user navigation bar preference.
///
/// The settings store keeps this as a raw integer where `-1` means the user
/// never made a choice.  Convert with [`NavBarSetting::from_raw`] as soon as
/// the value leaves the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavBarSetting {
    Unset,
    Hidden,
    Shown,
}

impl NavBarSetting {
    /// Raw value stored when the user never chose.
    pub const RAW_UNSET: i32 = -1;
    /// Raw value meaning "show the navigation bar".
    pub const RAW_SHOWN: i32 = 1;
    /// Raw value written for [`NavBarSetting::Hidden`].
    pub const RAW_HIDDEN: i32 = 0;

    /// Convert a raw store value.  Anything other than `-1` or `1` reads as
    /// [`NavBarSetting::Hidden`].
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::RAW_UNSET => NavBarSetting::Unset,
            Self::RAW_SHOWN => NavBarSetting::Shown,
            _ => NavBarSetting::Hidden,
        }
    }

    /// Convert an optional raw store value; a missing key is [`NavBarSetting::Unset`].
    pub fn from_raw_opt(raw: Option<i32>) -> Self {
        raw.map(Self::from_raw).unwrap_or(NavBarSetting::Unset)
    }

    pub fn to_raw(self) -> i32 {
        match self {
            NavBarSetting::Unset => Self::RAW_UNSET,
            NavBarSetting::Hidden => Self::RAW_HIDDEN,
            NavBarSetting::Shown => Self::RAW_SHOWN,
        }
    }
}

/// Environment-level override for navigation bar visibility.
///
/// The underlying property describes whether *hardware keys* are present, so
/// its sense is inverted: `"1"` (keys present) forces the bar hidden and
/// `"0"` (no keys) forces it shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformOverride {
    Absent,
    ForceHidden,
    ForceShown,
}

impl PlatformOverride {
    /// Interpret the raw hardware-keys property value.
    ///
    /// Values other than exactly `"1"` or `"0"` (including the empty string)
    /// are treated as absent.
    pub fn from_property(value: Option<&str>) -> Self {
        match value {
            Some("1") => PlatformOverride::ForceHidden,
            Some("0") => PlatformOverride::ForceShown,
            _ => PlatformOverride::Absent,
        }
    }
}

/// A snapshot entry from the host's running-process list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub name: String,
    pub id: i64,
}

impl ProcessRecord {
    pub fn new(name: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// User identity for per-user settings lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserId {
    /// Whichever user the settings store considers active.
    Current,
    Id(u32),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Current => write!(f, "current"),
            UserId::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Error type spanning invalid input, host provider failures, and
/// privileged or remote call failures.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostError {
    #[error(
        "Invalid display metrics: {width_px}x{height_px} @ {density_dpi}dpi (density must be non-zero)"
    )]
    InvalidMetrics {
        width_px: u32,
        height_px: u32,
        density_dpi: u32,
    },

    #[error("Host provider '{provider}' failed: {details}")]
    ProviderFailure { provider: String, details: String },

    #[error("Process table unavailable: {0}")]
    ProcessTable(String),

    #[error("Termination of {name} (id {id}) failed: {details}")]
    TerminationFailed {
        name: String,
        id: i64,
        details: String,
    },

    #[error("Service '{0}' is not available")]
    ServiceUnavailable(String),

    #[error("Remote call to '{service}' failed: {details}")]
    RemoteCall { service: String, details: String },
}
