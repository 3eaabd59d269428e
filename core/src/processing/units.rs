use serde::Serialize;

use crate::prelude::{PipelineError, PipelineResult};

/// Real-world units per pixel. Only obtainable through
/// [`UnitConverter::derive_ratio`], so it is always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConversionRatio(f64);

impl ConversionRatio {
    pub fn value(self) -> f64 {
        self.0
    }
}

pub struct UnitConverter;

impl UnitConverter {
    pub fn derive_ratio(
        pixel_measurement: f64,
        real_world_measurement: f64,
    ) -> PipelineResult<ConversionRatio> {
        if !(pixel_measurement.is_finite() && pixel_measurement > 0.0) {
            return Err(PipelineError::InvalidMeasurement(format!(
                "pixel size must be positive, got {}",
                pixel_measurement
            )));
        }
        if !(real_world_measurement.is_finite() && real_world_measurement > 0.0) {
            return Err(PipelineError::InvalidMeasurement(format!(
                "real-world size must be positive, got {}",
                real_world_measurement
            )));
        }
        Ok(ConversionRatio(real_world_measurement / pixel_measurement))
    }

    pub fn to_real_world(pixel_value: f64, ratio: ConversionRatio) -> f64 {
        pixel_value * ratio.0
    }

    pub fn radians_to_degrees(radians: f64) -> f64 {
        radians.to_degrees()
    }

    pub fn degrees_to_radians(degrees: f64) -> f64 {
        degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_real_world_over_pixels() {
        let ratio = UnitConverter::derive_ratio(10.0, 0.2).unwrap();
        assert!((ratio.value() - 0.02).abs() < 1e-15);
        assert!((UnitConverter::to_real_world(150.0, ratio) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn non_positive_measurements_are_rejected() {
        for (pixels, metres) in [(10.0, 0.0), (10.0, -0.5), (0.0, 0.2), (-4.0, 0.2)] {
            assert!(matches!(
                UnitConverter::derive_ratio(pixels, metres),
                Err(PipelineError::InvalidMeasurement(_))
            ));
        }
        assert!(UnitConverter::derive_ratio(f64::NAN, 0.2).is_err());
    }

    #[test]
    fn angle_conversions_invert() {
        let degrees = UnitConverter::radians_to_degrees(std::f64::consts::FRAC_PI_4);
        assert!((degrees - 45.0).abs() < 1e-12);
        let back = UnitConverter::degrees_to_radians(UnitConverter::radians_to_degrees(1.234));
        assert!((back - 1.234).abs() < 1e-12);
    }
}
