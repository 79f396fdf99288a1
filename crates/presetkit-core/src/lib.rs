//! Preset interchange for VST3 plugins.
//!
//! Moves parameter values between three representations: binary
//! `.vstpreset` containers, a JSON preset set, and generated C++ preset
//! tables. The parameter schema that all three share is extracted once from
//! the plugin's `parameter.hpp`.
//!
//! # Features
//!
//! - **Schema extraction**: enum indices, array templates, storage types
//! - **Container codec**: bounds-checked decoding, byte-exact encoding
//! - **Preset set**: ordered JSON hub with canonical "Default"-first order
//! - **Code generation**: `loadProgram` switch and preset name table
//! - **Pipeline**: each stage re-runnable against the on-disk layout
//!
//! # Example
//!
//! ```rust
//! use presetkit_core::{ClassId, Preset, PresetSet, BinaryContainer, Endianness, codegen};
//! use presetkit_core::extract::extract_schema;
//!
//! let source = r#"
//! namespace ParameterID {
//! enum ID {
//!   bypass,
//!   gain,
//!   ID_ENUM_LENGTH,
//! };
//! }
//! value[ID::bypass] = std::make_unique<IntValue>(0, Scales::boolScale, "bypass", kFlags);
//! value[ID::gain] = std::make_unique<LogValue>(0.5, Scales::gain, "gain", kFlags);
//! "#;
//! let schema = extract_schema(source).unwrap().schema;
//!
//! let preset = Preset::new("Default").with_param("gain", 0.5);
//! let class_id = ClassId::new("0123456789ABCDEF0123456789ABCDEF").unwrap();
//! let bytes = presetkit_core::encode(&preset, &schema, &class_id, "bypass").unwrap();
//! let decoded = BinaryContainer::decode(&bytes, Endianness::Little).unwrap();
//! assert_eq!(decoded.component_chunk().unwrap().len(), schema.chunk_size());
//!
//! let set = PresetSet::from_presets([preset]).unwrap();
//! let code = codegen::generate(&schema, &set, "preset", "bypass").unwrap();
//! assert!(code.table.contains("presetDefault,"));
//! ```

mod chunk;
mod error;
mod value;

/// Plugin class ids and the class id table.
pub mod class_id;

/// Preset loader and table source generation.
pub mod codegen;

/// Tool configuration.
pub mod config;

/// Binary preset container codec.
pub mod container;

/// Schema extraction from parameter declarations.
pub mod extract;

/// Config discovery and artifact layout.
pub mod paths;

/// Stage orchestration.
pub mod pipeline;

/// Presets and preset sets.
pub mod preset;

/// Parameter schema.
pub mod schema;

pub use chunk::{pack, unpack};
pub use class_id::{ClassId, ClassIdTable};
pub use codegen::{GeneratedSource, generate, preset_identifier};
pub use config::ToolConfig;
pub use container::{BinaryContainer, ChunkEntry, Endianness, Section, encode};
pub use error::PresetError;
pub use extract::{ExtractedSchema, extract_schema};
pub use paths::{OutputLayout, list_preset_files, preset_name_from_path, user_config_dir};
pub use pipeline::Pipeline;
pub use preset::{DEFAULT_PRESET_NAME, ParameterMap, Preset, PresetSet};
pub use schema::{OpaqueExpr, ParameterDef, Schema, StorageType};
pub use value::Value;

