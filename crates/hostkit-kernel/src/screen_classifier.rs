//! Screen-size classification.
//!
//! The short side of the display is converted to density-independent units
//! (`px * 160 / dpi`, truncating) and bucketed:
//!
//! | Short side | Class |
//! |---|---|
//! | `< 600dp` | [`ScreenClass::Phone`] |
//! | `600dp..720dp` | [`ScreenClass::Hybrid`] |
//! | `>= 720dp` | [`ScreenClass::Tablet`] |
//!
//! # Example
//!
//! ```
//! use hostkit_kernel::screen_classifier::classify;
//! use hostkit_types::ScreenClass;
//!
//! // 1080px at 420dpi is 411dp.
//! assert_eq!(classify(1080, 2400, 420).unwrap(), ScreenClass::Phone);
//! // 1600px at 240dpi is 1066dp.
//! assert_eq!(classify(2560, 1600, 240).unwrap(), ScreenClass::Tablet);
//! ```

use hostkit_types::{DisplayMetrics, HostError, ScreenClass};

/// Reference density: one dp equals one pixel at this dpi.
pub const DENSITY_DEFAULT: u32 = 160;

/// Smallest short side, in dp, classified as [`ScreenClass::Hybrid`].
pub const HYBRID_MIN_DP: u64 = 600;

/// Smallest short side, in dp, classified as [`ScreenClass::Tablet`].
pub const TABLET_MIN_DP: u64 = 720;

/// Length of the display's short side in density-independent units.
///
/// # Errors
///
/// Returns [`HostError::InvalidMetrics`] when `density_dpi` is zero.
pub fn short_side_dp(width_px: u32, height_px: u32, density_dpi: u32) -> Result<u64, HostError> {
    if density_dpi == 0 {
        return Err(HostError::InvalidMetrics {
            width_px,
            height_px,
            density_dpi,
        });
    }
    let short_px = u64::from(width_px.min(height_px));
    Ok(short_px * u64::from(DENSITY_DEFAULT) / u64::from(density_dpi))
}

/// Classify a display by its short side.
///
/// # Errors
///
/// Returns [`HostError::InvalidMetrics`] when `density_dpi` is zero.
pub fn classify(width_px: u32, height_px: u32, density_dpi: u32) -> Result<ScreenClass, HostError> {
    let dp = short_side_dp(width_px, height_px, density_dpi)?;
    Ok(if dp < HYBRID_MIN_DP {
        ScreenClass::Phone
    } else if dp < TABLET_MIN_DP {
        ScreenClass::Hybrid
    } else {
        ScreenClass::Tablet
    })
}

/// [`classify`] for a [`DisplayMetrics`] reading.
pub fn classify_metrics(metrics: &DisplayMetrics) -> Result<ScreenClass, HostError> {
    classify(metrics.width_px, metrics.height_px, metrics.density_dpi)
}
