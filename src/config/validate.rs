//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_detection(config)?;
    validate_stream(config)?;
    Ok(())
}

fn validate_detection(config: &Config) -> Result<()> {
    let detection = &config.detection;

    if !(0.0..=1.0).contains(&detection.confidence_threshold) {
        return Err(Error::ConfigValidation {
            message: format!(
                "detection.confidence_threshold must be between 0.0 and 1.0, got {}",
                detection.confidence_threshold
            ),
        });
    }

    if !(0.0..=1.0).contains(&detection.iou_threshold) {
        return Err(Error::ConfigValidation {
            message: format!(
                "detection.iou_threshold must be between 0.0 and 1.0, got {}",
                detection.iou_threshold
            ),
        });
    }

    if !(0.0..1.0).contains(&detection.min_area_fraction) {
        return Err(Error::ConfigValidation {
            message: format!(
                "detection.min_area_fraction must be in [0.0, 1.0), got {}",
                detection.min_area_fraction
            ),
        });
    }

    Ok(())
}

fn validate_stream(config: &Config) -> Result<()> {
    let stream = &config.stream;

    if !(0.0..=1.0).contains(&stream.confidence_threshold) {
        return Err(Error::ConfigValidation {
            message: format!(
                "stream.confidence_threshold must be between 0.0 and 1.0, got {}",
                stream.confidence_threshold
            ),
        });
    }

    if !(0.0..=1.0).contains(&stream.capture_confidence) {
        return Err(Error::ConfigValidation {
            message: format!(
                "stream.capture_confidence must be between 0.0 and 1.0, got {}",
                stream.capture_confidence
            ),
        });
    }

    if stream.smoothing_factor <= 0.0 || stream.smoothing_factor > 1.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "stream.smoothing_factor must be in (0.0, 1.0], got {}",
                stream.smoothing_factor
            ),
        });
    }

    if stream.min_process_interval_ms == 0 {
        return Err(Error::ConfigValidation {
            message: "stream.min_process_interval_ms must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        let mut config = Config::default();
        config.detection.confidence_threshold = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_smoothing_factor() {
        let mut config = Config::default();
        config.stream.smoothing_factor = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = Config::default();
        config.stream.min_process_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }
}
