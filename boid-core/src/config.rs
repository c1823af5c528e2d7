use boid_shared::FlockSettings;

use crate::error::SimError;

/// Check every setting before a model is built from it.
pub fn validate_settings(settings: &FlockSettings) -> Result<(), SimError> {
    validate_population(settings)?;
    validate_space(settings)?;
    validate_behavior(settings)
}

fn validate_population(settings: &FlockSettings) -> Result<(), SimError> {
    if settings.population == 0 {
        return Err(SimError::invalid("population", "must be positive"));
    }
    Ok(())
}

fn validate_space(settings: &FlockSettings) -> Result<(), SimError> {
    if !is_positive(settings.width) {
        return Err(SimError::invalid("width", "must be positive and finite"));
    }
    if !is_positive(settings.height) {
        return Err(SimError::invalid("height", "must be positive and finite"));
    }
    Ok(())
}

fn validate_behavior(settings: &FlockSettings) -> Result<(), SimError> {
    if !is_positive(settings.vision) {
        return Err(SimError::invalid("vision", "must be positive and finite"));
    }
    if !is_non_negative(settings.speed) {
        return Err(SimError::invalid("speed", "must be non-negative and finite"));
    }
    if !is_non_negative(settings.separation) {
        return Err(SimError::invalid(
            "separation",
            "must be non-negative and finite",
        ));
    }
    for (field, value) in [
        ("cohere", settings.cohere),
        ("separate", settings.separate),
        ("match", settings.match_factor),
    ] {
        if !value.is_finite() {
            return Err(SimError::invalid(field, "must be finite"));
        }
    }
    Ok(())
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
