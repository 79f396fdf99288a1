//! Tool configuration (`presetkit.toml`).
//!
//! # TOML Format
//!
//! ```toml
//! output_dir = "build/presets"
//! class_id_table = "class_id.json"
//! endianness = "little"
//! identifier_prefix = "preset"
//! preset_extension = "vstpreset"
//! bypass_parameter = "bypass"
//! ```
//!
//! Every key is optional. Unknown keys are rejected.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::container::Endianness;
use crate::error::PresetError;
use crate::paths::find_config;

/// Settings shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Root of all generated artifacts.
    pub output_dir: PathBuf,
    /// Path of the plugin name to class id table.
    pub class_id_table: PathBuf,
    /// Byte order used when reading preset files.
    pub endianness: Endianness,
    /// Prefix of generated preset enumerators.
    pub identifier_prefix: String,
    /// Preset file extension, without the dot.
    pub preset_extension: String,
    /// Parameter written as 0 in every encoded or generated preset.
    pub bypass_parameter: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            class_id_table: PathBuf::from("class_id.json"),
            endianness: Endianness::Little,
            identifier_prefix: "preset".to_string(),
            preset_extension: "vstpreset".to_string(),
            bypass_parameter: "bypass".to_string(),
        }
    }
}

impl ToolConfig {
    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PresetError::read_file(path, e))?;
        Self::from_toml(&content).map_err(|e| PresetError::in_file(path, e))
    }

    /// Load a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PresetError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load the first config found by [`find_config`], or the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, PresetError> {
        match find_config(explicit)? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Set the output root.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the class id table path.
    pub fn with_class_id_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.class_id_table = path.into();
        self
    }

    /// Set the byte order used for reading.
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ToolConfig::from_toml("").unwrap(), ToolConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ToolConfig::from_toml(
            r#"
            output_dir = "build"
            endianness = "big"
            "#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("build"));
        assert_eq!(config.endianness, Endianness::Big);
        assert_eq!(config.identifier_prefix, "preset");
        assert_eq!(config.bypass_parameter, "bypass");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = ToolConfig::from_toml("outptu_dir = \"x\"").unwrap_err();
        assert!(matches!(err, PresetError::TomlParse(_)));
    }

    #[test]
    fn bad_endianness_is_rejected() {
        assert!(ToolConfig::from_toml("endianness = \"middle\"").is_err());
    }

    #[test]
    fn load_and_discover_explicit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("presetkit.toml");
        std::fs::write(&path, "identifier_prefix = \"program\"\n").unwrap();

        assert_eq!(ToolConfig::load(&path).unwrap().identifier_prefix, "program");
        assert_eq!(
            ToolConfig::discover(Some(path.as_path())).unwrap().identifier_prefix,
            "program"
        );
    }

    #[test]
    fn load_reports_file_on_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("presetkit.toml");
        std::fs::write(&path, "output_dir = 3\n").unwrap();
        let err = ToolConfig::load(&path).unwrap_err();
        assert!(matches!(err, PresetError::InFile { .. }));
    }

    #[test]
    fn builders_override() {
        let config = ToolConfig::default()
            .with_output_dir("/tmp/out")
            .with_class_id_table("ids.json")
            .with_endianness(Endianness::Big);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.class_id_table, PathBuf::from("ids.json"));
        assert_eq!(config.endianness, Endianness::Big);
    }
}
