//! Preset document validation.
//!
//! Runs before a preset touches a board, so a bad document leaves the board
//! exactly as it was. Unknown pedal names are not an error here: the loader
//! skips them with a warning.

use std::collections::HashSet;

use thiserror::Error;

use crate::preset::BoardPreset;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A pedal entry has an empty name.
    #[error("pedal #{index} has an empty name")]
    EmptyPedalName {
        /// Position in the preset.
        index: usize,
    },

    /// A pot entry has an empty name.
    #[error("pedal '{pedal}' has a pot with an empty name")]
    EmptyPotName {
        /// Name of the pedal.
        pedal: String,
    },

    /// A pot value is NaN or infinite.
    #[error("pot '{pot}' on pedal '{pedal}' has non-finite value {value}")]
    NonFiniteValue {
        /// Name of the pedal.
        pedal: String,
        /// Name of the pot.
        pot: String,
        /// The offending value.
        value: f32,
    },

    /// The same pot appears twice in one pedal entry.
    #[error("pot '{pot}' appears more than once on pedal '{pedal}'")]
    DuplicatePot {
        /// Name of the pedal.
        pedal: String,
        /// Name of the duplicated pot.
        pot: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks a preset document for structural problems.
///
/// Returns the single error found, or [`ValidationError::Multiple`] when
/// there are several.
pub fn validate_preset(preset: &BoardPreset) -> ValidationResult<()> {
    let mut errors = Vec::new();

    for (index, pedal) in preset.pedals.iter().enumerate() {
        if pedal.name.trim().is_empty() {
            errors.push(ValidationError::EmptyPedalName { index });
        }

        let mut seen = HashSet::new();
        for pot in &pedal.pots {
            if pot.name.trim().is_empty() {
                errors.push(ValidationError::EmptyPotName {
                    pedal: pedal.name.clone(),
                });
            }
            if !pot.value.is_finite() {
                errors.push(ValidationError::NonFiniteValue {
                    pedal: pedal.name.clone(),
                    pot: pot.name.clone(),
                    value: pot.value,
                });
            }
            if !seen.insert(pot.name.as_str()) {
                errors.push(ValidationError::DuplicatePot {
                    pedal: pedal.name.clone(),
                    pot: pot.name.clone(),
                });
            }
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
