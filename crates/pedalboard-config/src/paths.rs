//! Platform-specific paths for user presets.
//!
//! - Linux: `~/.config/pedalboard/presets/`
//! - macOS: `~/Library/Application Support/pedalboard/presets/`
//! - Windows: `%APPDATA%\pedalboard\presets\`

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Application name used for directory paths.
const APP_NAME: &str = "pedalboard";

/// Subdirectory name for presets.
const PRESETS_SUBDIR: &str = "presets";

/// Preset file extension.
const PRESET_EXTENSION: &str = "json";

/// Returns the user presets directory.
///
/// Falls back to `./pedalboard/presets` if the platform config directory
/// cannot be determined.
pub fn user_presets_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(PRESETS_SUBDIR)
}

/// Creates the user presets directory if needed and returns it.
pub fn ensure_user_presets_dir() -> Result<PathBuf> {
    let dir = user_presets_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Finds a preset file by path or by name.
///
/// `name` may be a path to an existing file, or a preset name with or
/// without the `.json` extension, looked up in the user presets directory.
pub fn find_preset(name: &str) -> Option<PathBuf> {
    find_preset_in(name, &user_presets_dir())
}

fn find_preset_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{name}.{PRESET_EXTENSION}")
    };
    let candidate = dir.join(filename);
    candidate.is_file().then_some(candidate)
}

/// Lists preset files in the user presets directory.
///
/// Returns an empty list if the directory is missing or unreadable.
pub fn list_user_presets() -> Vec<PathBuf> {
    list_presets_in_dir(&user_presets_dir())
}

fn list_presets_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut presets: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == PRESET_EXTENSION)
        })
        .collect();
    presets.sort();
    presets
}

/// Preset name from a file path (the file stem).
///
/// ```rust
/// use pedalboard_config::paths::preset_name_from_path;
/// use std::path::Path;
///
/// let name = preset_name_from_path(Path::new("/boards/crunch.json"));
/// assert_eq!(name, Some("crunch".to_string()));
/// ```
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
