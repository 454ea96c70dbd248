//! Generic `MetricsReader` trait for display-metrics providers.

use hostkit_types::{DisplayMetrics, HostError};

/// A source of raw display metrics for the default display.
///
/// Readings are taken per call; the facade never caches them because the
/// logical size changes with rotation and display overrides.
pub trait MetricsReader: Send + Sync {
    /// Return the current metrics of the default display.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::ProviderFailure`] if the display cannot be
    /// queried.
    fn display_metrics(&self) -> Result<DisplayMetrics, HostError>;
}

/// A [`MetricsReader`] that always reports the same metrics.
///
/// Used when the metrics come from configuration or the command line rather
/// than a live display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMetrics(pub DisplayMetrics);

impl StaticMetrics {
    pub fn new(width_px: u32, height_px: u32, density_dpi: u32) -> Self {
        Self(DisplayMetrics::new(width_px, height_px, density_dpi))
    }
}

impl MetricsReader for StaticMetrics {
    fn display_metrics(&self) -> Result<DisplayMetrics, HostError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_metrics_reports_fixed_values() {
        let reader = StaticMetrics::new(1080, 2400, 420);
        let m = reader.display_metrics().unwrap();
        assert_eq!(m.width_px, 1080);
        assert_eq!(m.height_px, 2400);
        assert_eq!(m.density_dpi, 420);
        // Repeated reads are identical.
        assert_eq!(reader.display_metrics().unwrap(), m);
    }
}
