//! Error types for schema extraction, container coding, and preset conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting presets.
///
/// Every variant is fatal for the conversion in progress. None of them are
/// retried and no partial output is written.
#[derive(Debug, Error)]
pub enum PresetError {
    /// The parameter declaration source could not be parsed.
    #[error("malformed parameter declaration: {reason}")]
    MalformedSchema {
        /// What was missing or inconsistent.
        reason: String,
    },

    /// A binary container violates the preset file layout.
    #[error("invalid preset container at byte {offset}: {reason}")]
    Format {
        /// Byte offset where the fault was detected.
        offset: u64,
        /// Description of the fault.
        reason: String,
    },

    /// The component chunk ended before every schema parameter was read.
    #[error(
        "component chunk truncated at byte {offset}: parameter '{param}' needs {needed} bytes, {available} left"
    )]
    Truncation {
        /// Parameter that could not be read.
        param: String,
        /// Byte offset into the component chunk.
        offset: usize,
        /// Bytes required by the parameter's storage type.
        needed: usize,
        /// Bytes remaining in the chunk.
        available: usize,
    },

    /// A parameter name is present on one side but not the other.
    #[error("unknown parameter '{param}' in preset '{preset}'")]
    UnknownParameter {
        /// Preset being converted.
        preset: String,
        /// Offending parameter name.
        param: String,
    },

    /// A preset value cannot be stored in its parameter's storage type.
    #[error("invalid value for parameter '{param}' in preset '{preset}': {reason}")]
    InvalidValue {
        /// Preset being converted.
        preset: String,
        /// Offending parameter name.
        param: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Two presets share a name.
    #[error("duplicate preset name: {0}")]
    DuplicatePreset(String),

    /// Code generation requires a preset named "Default".
    #[error("preset set has no \"Default\" preset")]
    MissingDefaultPreset,

    /// A referenced file, directory, or table entry is absent.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A conversion error tied to a specific input file.
    #[error("{}: {source}", .path.display())]
    InFile {
        /// File being converted.
        path: PathBuf,
        /// What went wrong.
        source: Box<PresetError>,
    },

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or serialize JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl PresetError {
    /// Create a malformed schema error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        PresetError::MalformedSchema {
            reason: reason.into(),
        }
    }

    /// Create a container format error.
    pub fn format(offset: u64, reason: impl Into<String>) -> Self {
        PresetError::Format {
            offset,
            reason: reason.into(),
        }
    }

    /// Create an unknown parameter error.
    pub fn unknown_parameter(preset: impl Into<String>, param: impl Into<String>) -> Self {
        PresetError::UnknownParameter {
            preset: preset.into(),
            param: param.into(),
        }
    }

    /// Attach the input file to an error.
    pub fn in_file(path: impl Into<PathBuf>, source: PresetError) -> Self {
        PresetError::InFile {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::CreateDir {
            path: path.into(),
            source,
        }
    }
}
