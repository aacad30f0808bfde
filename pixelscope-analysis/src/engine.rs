//! Analysis over a session snapshot.

use pixelscope_core::AnalysisView;

use crate::histogram::{compute_histogram, Histogram, HistogramConfig};
use crate::profile::{compute_profile, Profile, ProfileConfig};

/// Runs histogram and profile computations on what the viewer displays.
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    histogram: HistogramConfig,
}

impl AnalysisEngine {
    #[must_use]
    pub fn new(histogram: HistogramConfig) -> Self {
        Self { histogram }
    }

    #[must_use]
    pub fn histogram_config(&self) -> &HistogramConfig {
        &self.histogram
    }

    /// Histogram of the view's ROI and visible channels.
    #[must_use]
    pub fn histogram(&self, view: &AnalysisView) -> Histogram {
        compute_histogram(&view.buffer, view.roi, &view.visible, &self.histogram)
    }

    /// Profile using the view's orientation and coordinate mode.
    #[must_use]
    pub fn profile(&self, view: &AnalysisView) -> Profile {
        compute_profile(
            &view.buffer,
            view.roi,
            ProfileConfig::from(view.preferences),
            &view.visible,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelscope_core::{
        CoordinateMode, DtypeClass, Image, ImageRect, ImageShape, PixelBuffer, PreferencesUpdate,
        ProfileOrientation, ViewerSession,
    };

    #[test]
    fn test_session_roundtrip() {
        let samples = (0u8..16).map(|v| f64::from(v) * 10.0).collect();
        let image = Image::new(
            PixelBuffer::from_samples(ImageShape::new(4, 4, 1), samples, DtypeClass::Uint8).unwrap(),
        );
        let mut session = ViewerSession::new();
        session.switch_image(&image);
        session
            .selection_mut()
            .set_rect(ImageRect::new(1, 1, 3, 3).unwrap());
        session.display_mut().set_analysis_preferences(
            PreferencesUpdate::default()
                .with_orientation(ProfileOrientation::Vertical)
                .with_coordinate_mode(CoordinateMode::Absolute),
        );

        let engine = AnalysisEngine::default();
        let view = session.analysis_view(&image);
        let hist = engine.histogram(&view);
        assert_eq!(hist.channels[0].stats.count, 4);

        let profile = engine.profile(&view);
        assert_eq!(profile.positions, vec![1.0, 2.0]);
        // Rows 1 and 2, columns 1..3: (50 + 60) / 2 and (90 + 100) / 2.
        assert_eq!(profile.channels[0].values, vec![55.0, 95.0]);
    }
}
