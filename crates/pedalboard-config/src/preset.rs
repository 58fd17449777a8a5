//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::validation::validate_preset;

/// A saved board: pedals in input-to-output order.
///
/// # JSON Format
///
/// ```json
/// {
///   "name": "Crunch",
///   "pedals": [
///     { "name": "overdrive", "bypassed": false,
///       "pots": [ { "name": "drive", "value": 6.0 } ] },
///     { "name": "volume", "bypassed": false, "pots": [] }
///   ]
/// }
/// ```
///
/// `name` and `bypassed` are required on every pedal; `pots` may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BoardPreset {
    /// Optional preset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Pedals in signal order.
    pub pedals: Vec<PedalPreset>,
}

/// One pedal entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PedalPreset {
    /// Registry id of the pedal.
    pub name: String,
    /// Whether the pedal is bypassed.
    pub bypassed: bool,
    /// Saved pot values, by pot name.
    #[serde(default)]
    pub pots: Vec<PotPreset>,
}

/// One saved pot value, on the pot's actual scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotPreset {
    /// Pot name.
    pub name: String,
    /// Actual value.
    pub value: f32,
}

impl BoardPreset {
    /// Create an empty named preset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a pedal entry.
    #[must_use]
    pub fn with_pedal(mut self, pedal: PedalPreset) -> Self {
        self.pedals.push(pedal);
        self
    }

    /// Parse a preset from JSON. Does not validate.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the preset as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a preset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_json(&content)
    }

    /// Save the preset to a JSON file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Check the document for structural problems.
    pub fn validate(&self) -> Result<()> {
        Ok(validate_preset(self)?)
    }

    /// Number of pedal entries.
    pub fn len(&self) -> usize {
        self.pedals.len()
    }

    /// Returns true if the preset has no pedals.
    pub fn is_empty(&self) -> bool {
        self.pedals.is_empty()
    }

    /// Pedal names in signal order.
    pub fn pedal_names(&self) -> impl Iterator<Item = &str> {
        self.pedals.iter().map(|p| p.name.as_str())
    }
}

impl PedalPreset {
    /// Create a pedal entry with no pots.
    pub fn new(name: impl Into<String>, bypassed: bool) -> Self {
        Self {
            name: name.into(),
            bypassed,
            pots: Vec::new(),
        }
    }

    /// Append a pot value.
    #[must_use]
    pub fn with_pot(mut self, name: impl Into<String>, value: f32) -> Self {
        self.pots.push(PotPreset {
            name: name.into(),
            value,
        });
        self
    }

    /// Look up a saved pot value.
    pub fn pot(&self, name: &str) -> Option<f32> {
        self.pots.iter().find(|p| p.name == name).map(|p| p.value)
    }
}
