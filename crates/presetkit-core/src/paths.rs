//! Filesystem locations: config discovery, preset file discovery, and the
//! layout of generated artifacts.
//!
//! # Output Layout
//!
//! Everything the pipeline writes lives under one root (`output_dir`):
//!
//! ```text
//! json/{plugin}.type.json
//! json/{plugin}.preset.json
//! cpp/{plugin}_preset_code.cpp
//! cpp/{plugin}_preset_enum.cpp
//! vstpreset/FromJson/{plugin}/{preset}.vstpreset
//! ```
//!
//! # Example
//!
//! ```rust
//! use presetkit_core::paths::OutputLayout;
//! use std::path::Path;
//!
//! let layout = OutputLayout::new("out");
//! assert_eq!(layout.type_json("Synth"), Path::new("out/json/Synth.type.json"));
//! ```

use std::path::{Path, PathBuf};

use crate::error::PresetError;

/// Application name used for directory paths.
const APP_NAME: &str = "presetkit";

/// Config file name, both in the working directory and the user config dir.
pub const CONFIG_FILE_NAME: &str = "presetkit.toml";

/// Returns the user-specific configuration directory.
///
/// # Platform Paths
///
/// - Linux: `~/.config/presetkit/`
/// - macOS: `~/Library/Application Support/presetkit/`
/// - Windows: `%APPDATA%\presetkit\`
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Find the config file to use.
///
/// Searches in the following order:
/// 1. `explicit`, which must exist when given
/// 2. `./presetkit.toml`
/// 3. `presetkit.toml` in [`user_config_dir`]
///
/// Returns `Ok(None)` when no file is found and none was requested.
pub fn find_config(explicit: Option<&Path>) -> Result<Option<PathBuf>, PresetError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(PresetError::MissingInput(format!(
            "config file '{}' does not exist",
            path.display()
        )));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(Some(local));
    }

    let user = user_config_dir().join(CONFIG_FILE_NAME);
    if user.is_file() {
        return Ok(Some(user));
    }

    Ok(None)
}

/// Where each generated artifact goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the JSON artifacts.
    pub fn json_dir(&self) -> PathBuf {
        self.root.join("json")
    }

    /// Directory holding the generated C++ sources.
    pub fn cpp_dir(&self) -> PathBuf {
        self.root.join("cpp")
    }

    /// `json/{plugin}.type.json`
    pub fn type_json(&self, plugin: &str) -> PathBuf {
        self.json_dir().join(format!("{plugin}.type.json"))
    }

    /// `json/{plugin}.preset.json`
    pub fn preset_json(&self, plugin: &str) -> PathBuf {
        self.json_dir().join(format!("{plugin}.preset.json"))
    }

    /// `cpp/{plugin}_preset_code.cpp`
    pub fn loader_source(&self, plugin: &str) -> PathBuf {
        self.cpp_dir().join(format!("{plugin}_preset_code.cpp"))
    }

    /// `cpp/{plugin}_preset_enum.cpp`
    pub fn table_source(&self, plugin: &str) -> PathBuf {
        self.cpp_dir().join(format!("{plugin}_preset_enum.cpp"))
    }

    /// `vstpreset/FromJson/{plugin}`
    pub fn binary_dir(&self, plugin: &str) -> PathBuf {
        self.root.join("vstpreset").join("FromJson").join(plugin)
    }

    /// `vstpreset/FromJson/{plugin}/{preset}.{extension}`
    pub fn binary_preset(&self, plugin: &str, preset: &str, extension: &str) -> PathBuf {
        self.binary_dir(plugin).join(format!("{preset}.{extension}"))
    }
}

/// Create `dir` and its parents if missing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<(), PresetError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| PresetError::create_dir(dir, e))?;
    }
    Ok(())
}

/// List files with `extension` under `dir`, recursively, sorted by path.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn list_preset_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PresetError> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries =
            std::fs::read_dir(&current).map_err(|e| PresetError::read_file(&current, e))?;
        for entry in entries {
            let path = entry.map_err(|e| PresetError::read_file(&current, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Get the preset name from a file path.
///
/// Extracts the file stem (filename without extension).
///
/// # Example
///
/// ```rust
/// use presetkit_core::paths::preset_name_from_path;
/// use std::path::Path;
///
/// let name = preset_name_from_path(Path::new("/path/to/Bright Lead.vstpreset"));
/// assert_eq!(name, Some("Bright Lead".to_string()));
/// ```
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}
