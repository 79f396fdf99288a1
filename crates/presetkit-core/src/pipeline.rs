//! Stage orchestration over the materialized artifact layout.
//!
//! Each stage reads its inputs from disk and writes its outputs under
//! [`ToolConfig::output_dir`], so any stage can be re-run on its own:
//!
//! ```text
//! parameter.hpp ──extract_schema──▶ json/{plugin}.type.json
//! *.vstpreset   ──binary_to_json──▶ json/{plugin}.preset.json
//! preset.json   ──json_to_binary──▶ vstpreset/FromJson/{plugin}/*.vstpreset
//! preset.json   ──json_to_code────▶ cpp/{plugin}_preset_{code,enum}.cpp
//! ```
//!
//! Outputs are fully built in memory, written to a temporary file in the
//! target directory, then persisted by rename.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::class_id::ClassIdTable;
use crate::codegen::{self, GeneratedSource};
use crate::config::ToolConfig;
use crate::container;
use crate::error::PresetError;
use crate::extract;
use crate::paths::{OutputLayout, ensure_dir};
use crate::preset::PresetSet;
use crate::schema::Schema;

/// Declaration file looked up when a directory is given as schema source.
pub const PARAMETER_SOURCE: &str = "parameter.hpp";

/// Result of [`Pipeline::extract_schema`].
#[derive(Debug, Clone)]
pub struct ExtractReport {
    /// Plugin the schema belongs to.
    pub plugin: String,
    /// Extracted schema.
    pub schema: Schema,
    /// Written `.type.json`.
    pub path: PathBuf,
}

/// Runs conversion stages with one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ToolConfig,
    layout: OutputLayout,
}

impl Pipeline {
    /// Create a pipeline writing under `config.output_dir`.
    pub fn new(config: ToolConfig) -> Self {
        let layout = OutputLayout::new(config.output_dir.clone());
        Self { config, layout }
    }

    /// Active configuration.
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Artifact layout.
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Extract the schema from a declaration file and write `.type.json`.
    ///
    /// `source` may be the declaration file itself or a plugin directory
    /// holding `parameter.hpp` directly or under `source/`. The plugin name
    /// comes from `plugin` when given, else from the file's license header.
    pub fn extract_schema(
        &self,
        source: &Path,
        plugin: Option<&str>,
    ) -> Result<ExtractReport, PresetError> {
        let source = resolve_parameter_source(source)?;
        let text = read_input(&source)?;
        let extracted =
            extract::extract_schema(&text).map_err(|e| PresetError::in_file(&source, e))?;

        let plugin = match (plugin, extracted.plugin_name) {
            (Some(name), _) => name.to_string(),
            (None, Some(name)) => name,
            (None, None) => {
                return Err(PresetError::MissingInput(format!(
                    "no plugin name given and none found in '{}'",
                    source.display()
                )));
            }
        };

        let path = self.layout.type_json(&plugin);
        write_atomic(&path, extracted.schema.to_json()?.as_bytes())?;
        tracing::info!(
            plugin = %plugin,
            parameters = extracted.schema.len(),
            path = %path.display(),
            "schema extracted"
        );
        Ok(ExtractReport {
            plugin,
            schema: extracted.schema,
            path,
        })
    }

    /// Decode every preset file under `preset_dir` and write `.preset.json`.
    pub fn binary_to_json(&self, plugin: &str, preset_dir: &Path) -> Result<PresetSet, PresetError> {
        let schema = self.load_schema(plugin)?;
        let presets = PresetSet::from_binary_directory(
            preset_dir,
            &schema,
            &self.config.preset_extension,
            self.config.endianness,
        )?;

        let path = self.layout.preset_json(plugin);
        write_atomic(&path, presets.to_json()?.as_bytes())?;
        tracing::info!(
            plugin,
            presets = presets.len(),
            path = %path.display(),
            "preset set written"
        );
        Ok(presets)
    }

    /// Encode every preset in `.preset.json` into its own container file.
    ///
    /// All presets are encoded before any file is written.
    pub fn json_to_binary(&self, plugin: &str) -> Result<Vec<PathBuf>, PresetError> {
        let schema = self.load_schema(plugin)?;
        let presets = self.load_presets(plugin)?;
        let table = ClassIdTable::load(&self.config.class_id_table)?;
        let class_id = table.class_id(plugin)?;

        let mut encoded = Vec::with_capacity(presets.len());
        for preset in &presets {
            check_file_name(&preset.name)?;
            let bytes =
                container::encode(preset, &schema, &class_id, &self.config.bypass_parameter)?;
            let path = self.layout.binary_preset(
                plugin,
                &preset.name,
                &self.config.preset_extension,
            );
            encoded.push((path, bytes));
        }

        let mut written = Vec::with_capacity(encoded.len());
        for (path, bytes) in encoded {
            write_atomic(&path, &bytes)?;
            written.push(path);
        }
        tracing::info!(
            plugin,
            files = written.len(),
            dir = %self.layout.binary_dir(plugin).display(),
            "preset files written"
        );
        Ok(written)
    }

    /// Generate the loader and table sources from `.preset.json`.
    pub fn json_to_code(&self, plugin: &str) -> Result<GeneratedSource, PresetError> {
        let schema = self.load_schema(plugin)?;
        let presets = self.load_presets(plugin)?;
        let generated = codegen::generate(
            &schema,
            &presets,
            &self.config.identifier_prefix,
            &self.config.bypass_parameter,
        )?;

        write_atomic(
            &self.layout.loader_source(plugin),
            generated.loader.as_bytes(),
        )?;
        write_atomic(&self.layout.table_source(plugin), generated.table.as_bytes())?;
        tracing::info!(
            plugin,
            presets = generated.identifiers.len(),
            dir = %self.layout.cpp_dir().display(),
            "preset sources generated"
        );
        Ok(generated)
    }

    /// Run every stage in order. Returns the plugin name.
    pub fn run(
        &self,
        source: &Path,
        preset_dir: &Path,
        plugin: Option<&str>,
    ) -> Result<String, PresetError> {
        let report = self.extract_schema(source, plugin)?;
        self.binary_to_json(&report.plugin, preset_dir)?;
        self.json_to_binary(&report.plugin)?;
        self.json_to_code(&report.plugin)?;
        Ok(report.plugin)
    }

    /// Read `json/{plugin}.type.json`.
    pub fn load_schema(&self, plugin: &str) -> Result<Schema, PresetError> {
        let path = self.layout.type_json(plugin);
        let text = read_input(&path)?;
        Schema::from_json(&text).map_err(|e| PresetError::in_file(&path, e))
    }

    /// Read `json/{plugin}.preset.json`.
    pub fn load_presets(&self, plugin: &str) -> Result<PresetSet, PresetError> {
        let path = self.layout.preset_json(plugin);
        let text = read_input(&path)?;
        PresetSet::from_json(&text).map_err(|e| PresetError::in_file(&path, e))
    }
}

fn resolve_parameter_source(source: &Path) -> Result<PathBuf, PresetError> {
    if source.is_file() {
        return Ok(source.to_path_buf());
    }
    if source.is_dir() {
        for candidate in [
            source.join(PARAMETER_SOURCE),
            source.join("source").join(PARAMETER_SOURCE),
        ] {
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }
    Err(PresetError::MissingInput(format!(
        "parameter declaration '{}' does not exist",
        source.display()
    )))
}

fn read_input(path: &Path) -> Result<String, PresetError> {
    if !path.is_file() {
        return Err(PresetError::MissingInput(format!(
            "'{}' does not exist",
            path.display()
        )));
    }
    std::fs::read_to_string(path).map_err(|e| PresetError::read_file(path, e))
}

// Preset names become file stems.
fn check_file_name(name: &str) -> Result<(), PresetError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(PresetError::InvalidValue {
            preset: name.to_string(),
            param: "name".to_string(),
            reason: "preset name is not usable as a file name".to_string(),
        });
    }
    Ok(())
}

/// Write `bytes` to `path` through a temporary file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PresetError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| PresetError::write_file(path, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.flush())
        .map_err(|e| PresetError::write_file(path, e))?;
    tmp.persist(path)
        .map_err(|e| PresetError::write_file(path, e.error))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "file written");
    Ok(())
}
