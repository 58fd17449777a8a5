//! Factory presets bundled with the library.
//!
//! These are always available without external files and double as
//! starting points for user boards. Every entry names only built-in pedals.

use crate::preset::BoardPreset;

/// Factory preset identifiers, in display order.
pub static FACTORY_PRESET_NAMES: &[&str] = &["clean", "crunch", "ambient", "british_stack"];

/// JSON content for factory presets, embedded at compile time.
static FACTORY_PRESETS_JSON: &[(&str, &str)] = &[
    ("clean", CLEAN_PRESET),
    ("crunch", CRUNCH_PRESET),
    ("ambient", AMBIENT_PRESET),
    ("british_stack", BRITISH_STACK_PRESET),
];

/// Clean - everything bypassed except the volume pedal.
const CLEAN_PRESET: &str = r#"{
  "name": "Clean",
  "description": "Straight signal with every effect bypassed",
  "pedals": [
    { "name": "overdrive", "bypassed": true },
    { "name": "delay", "bypassed": true },
    { "name": "reverb", "bypassed": true },
    { "name": "volume", "bypassed": false, "pots": [ { "name": "level", "value": 8 } ] }
  ]
}"#;

/// Crunch - light overdrive into a vintage cabinet.
const CRUNCH_PRESET: &str = r#"{
  "name": "Crunch",
  "description": "Light overdrive for blues and rock rhythm",
  "pedals": [
    { "name": "overdrive", "bypassed": false, "pots": [
      { "name": "drive", "value": 5 },
      { "name": "tone", "value": 6 },
      { "name": "level", "value": 7 }
    ] },
    { "name": "cabinet", "bypassed": false, "pots": [
      { "name": "cabinet", "value": 0 }
    ] },
    { "name": "volume", "bypassed": false }
  ]
}"#;

/// Ambient - long delay into a big room.
const AMBIENT_PRESET: &str = r#"{
  "name": "Ambient",
  "description": "Long trails and a large room",
  "pedals": [
    { "name": "delay", "bypassed": false, "pots": [
      { "name": "time", "value": 0.6 },
      { "name": "feedback", "value": 0.6 },
      { "name": "mix", "value": 0.4 }
    ] },
    { "name": "reverb", "bypassed": false, "pots": [
      { "name": "room", "value": 8 },
      { "name": "mix", "value": 0.5 },
      { "name": "tone", "value": 4 }
    ] },
    { "name": "volume", "bypassed": false, "pots": [ { "name": "level", "value": 8 } ] }
  ]
}"#;

/// British stack - pushed drive into a british cabinet with extra mids.
const BRITISH_STACK_PRESET: &str = r#"{
  "name": "British Stack",
  "description": "Hot drive through a mid-forward british cabinet",
  "pedals": [
    { "name": "overdrive", "bypassed": false, "pots": [
      { "name": "drive", "value": 8 },
      { "name": "tone", "value": 7 }
    ] },
    { "name": "cabinet", "bypassed": false, "pots": [
      { "name": "cabinet", "value": 2 },
      { "name": "bass", "value": 6 },
      { "name": "mid", "value": 7 },
      { "name": "treble", "value": 5 },
      { "name": "presence", "value": 6 }
    ] },
    { "name": "reverb", "bypassed": false, "pots": [
      { "name": "room", "value": 3 },
      { "name": "mix", "value": 0.2 }
    ] },
    { "name": "volume", "bypassed": false }
  ]
}"#;

/// Returns every factory preset.
pub fn factory_presets() -> Vec<BoardPreset> {
    FACTORY_PRESETS_JSON
        .iter()
        .filter_map(|(_, json)| BoardPreset::from_json(json).ok())
        .collect()
}

/// Get a factory preset by identifier or display name, case-insensitively.
///
/// # Example
///
/// ```rust
/// use pedalboard_config::get_factory_preset;
///
/// let preset = get_factory_preset("crunch").unwrap();
/// assert_eq!(preset.name.as_deref(), Some("Crunch"));
/// ```
pub fn get_factory_preset(name: &str) -> Option<BoardPreset> {
    let name_lower = name.to_lowercase();

    for (preset_name, json) in FACTORY_PRESETS_JSON {
        if preset_name.to_lowercase() == name_lower {
            return BoardPreset::from_json(json).ok();
        }
    }

    factory_presets().into_iter().find(|preset| {
        preset
            .name
            .as_ref()
            .is_some_and(|n| n.to_lowercase() == name_lower)
    })
}

/// Returns true if `name` matches a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}
