//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum length of a device identifier.
pub const MAX_DEVICE_ID_LENGTH: usize = 128;

lazy_static! {
    static ref DEVICE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9._:\-]+$").unwrap();
    static ref PACKAGE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)*$").unwrap();
}

/// Validates that a percentage is within valid range (0 to 100).
pub fn validate_percentage(value: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("percentage_range");
        err.message = Some("Value must be between 0 and 100".into());
        Err(err)
    }
}

/// Validates a device identifier.
///
/// Device IDs come from the agent and are used as storage keys, so they are
/// restricted to a conservative character set.
pub fn validate_device_id(device_id: &str) -> Result<(), ValidationError> {
    if device_id.is_empty() || device_id.len() > MAX_DEVICE_ID_LENGTH {
        let mut err = ValidationError::new("device_id_length");
        err.message = Some(
            format!("Device ID must be 1-{} characters", MAX_DEVICE_ID_LENGTH).into(),
        );
        return Err(err);
    }

    if !DEVICE_ID_REGEX.is_match(device_id) {
        let mut err = ValidationError::new("device_id_format");
        err.message = Some("Device ID contains invalid characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates an Android-style package name (`com.example.app`).
pub fn validate_package_name(package_name: &str) -> Result<(), ValidationError> {
    if PACKAGE_NAME_REGEX.is_match(package_name) {
        Ok(())
    } else {
        let mut err = ValidationError::new("package_name_format");
        err.message = Some("Package name must be a dotted identifier".into());
        Err(err)
    }
}
