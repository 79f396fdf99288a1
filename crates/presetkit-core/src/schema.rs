//! Parameter schema: the ordered shape of a plugin's persisted state.
//!
//! Position in the schema is identity. The component chunk of a preset file
//! stores one value per parameter, packed back to back in schema order, so
//! every consumer walks [`Schema::iter`] and never re-sorts.
//!
//! # JSON Format
//!
//! The `.type.json` artifact keeps schema order as key order:
//!
//! ```json
//! {
//!   "bypass": { "type": "I", "index": "bypass", "default": 0, "scale": "Scales::boolScale", "flags": "kParameterIsAutomable" },
//!   "gain0":  { "type": "d", "index": "gain0 + 0", "default": 0.5, "scale": "Scales::gain", "flags": "kParameterIsAutomable" }
//! }
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use crate::error::PresetError;
use crate::value::Value;

/// Storage type of a parameter inside the component chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    /// 4-byte unsigned integer.
    #[serde(rename = "I")]
    Integer,
    /// 8-byte IEEE-754 double.
    #[serde(rename = "d")]
    Float64,
}

impl StorageType {
    /// Width of one packed value in bytes.
    pub const fn width(self) -> usize {
        match self {
            StorageType::Integer => 4,
            StorageType::Float64 => 8,
        }
    }
}

/// Source text carried through untouched (scale and flag expressions).
///
/// Never evaluated. Wrapping it keeps it from being mixed up with names or
/// default values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueExpr(String);

impl OpaqueExpr {
    /// Wrap expression text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The raw expression text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpaqueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One concrete (already expanded) parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDef {
    /// Position in the schema; equals the parameter's slot in the component chunk.
    pub schema_index: usize,
    /// Unique parameter name.
    pub name: String,
    /// Packed representation.
    pub storage: StorageType,
    /// Identifier expression used by generated code (`gain` or `gain0 + 3`).
    pub index_expr: String,
    /// Default value.
    pub default: Value,
    /// Scale expression.
    pub scale: OpaqueExpr,
    /// Flag expression.
    pub flags: OpaqueExpr,
}

impl ParameterDef {
    /// Create a parameter whose index expression is its own name.
    ///
    /// `schema_index` is assigned when the definition is placed in a [`Schema`].
    pub fn new(name: impl Into<String>, storage: StorageType, default: impl Into<Value>) -> Self {
        let name = name.into();
        Self {
            schema_index: 0,
            index_expr: name.clone(),
            name,
            storage,
            default: default.into(),
            scale: OpaqueExpr::default(),
            flags: OpaqueExpr::default(),
        }
    }

    /// Set the index expression.
    pub fn with_index_expr(mut self, index_expr: impl Into<String>) -> Self {
        self.index_expr = index_expr.into();
        self
    }

    /// Set the scale expression.
    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = OpaqueExpr::new(scale);
        self
    }

    /// Set the flag expression.
    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = OpaqueExpr::new(flags);
        self
    }
}

/// Ordered, immutable list of parameter definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    params: Vec<ParameterDef>,
}

impl Schema {
    /// Build a schema from definitions in declaration order.
    ///
    /// Assigns `schema_index` from position and rejects duplicate names.
    pub fn from_defs(defs: impl IntoIterator<Item = ParameterDef>) -> Result<Self, PresetError> {
        let mut seen = HashSet::new();
        let mut params = Vec::new();
        for (i, mut def) in defs.into_iter().enumerate() {
            if !seen.insert(def.name.clone()) {
                return Err(PresetError::malformed(format!(
                    "parameter '{}' is declared more than once",
                    def.name
                )));
            }
            def.schema_index = i;
            params.push(def);
        }
        Ok(Self { params })
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the schema has no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterDef> {
        self.params.iter()
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&ParameterDef> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Check whether a parameter name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Total component chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.params.iter().map(|p| p.storage.width()).sum()
    }

    /// Parse a `.type.json` document.
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the `.type.json` document.
    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Serialize)]
struct EntryRef<'a> {
    #[serde(rename = "type")]
    storage: StorageType,
    index: &'a str,
    default: &'a Value,
    scale: &'a OpaqueExpr,
    flags: &'a OpaqueExpr,
}

#[derive(Deserialize)]
struct Entry {
    #[serde(rename = "type")]
    storage: StorageType,
    index: Option<String>,
    default: Value,
    #[serde(default)]
    scale: OpaqueExpr,
    #[serde(default)]
    flags: OpaqueExpr,
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for p in &self.params {
            map.serialize_entry(
                &p.name,
                &EntryRef {
                    storage: p.storage,
                    index: &p.index_expr,
                    default: &p.default,
                    scale: &p.scale,
                    flags: &p.flags,
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter name to parameter definition")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
                let mut defs = Vec::new();
                while let Some((name, entry)) = access.next_entry::<String, Entry>()? {
                    defs.push(ParameterDef {
                        schema_index: 0,
                        index_expr: entry.index.unwrap_or_else(|| name.clone()),
                        name,
                        storage: entry.storage,
                        default: entry.default,
                        scale: entry.scale,
                        flags: entry.flags,
                    });
                }
                Schema::from_defs(defs).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}
