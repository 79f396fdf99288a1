//! Preset set: the JSON hub format every converter reads and writes.
//!
//! # JSON Format
//!
//! ```json
//! [
//!   { "name": "Default", "parameter": { "bypass": 0, "gain": 0.5 } },
//!   { "name": "Bright",  "parameter": { "bypass": 0, "gain": 0.8 } }
//! ]
//! ```
//!
//! Parameter objects keep their key order, which is schema order when the
//! set was decoded from binary files.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::chunk;
use crate::container::{BinaryContainer, Endianness};
use crate::error::PresetError;
use crate::paths::{list_preset_files, preset_name_from_path};
use crate::schema::Schema;
use crate::value::Value;

/// Name of the preset that always sorts first.
pub const DEFAULT_PRESET_NAME: &str = "Default";

/// Parameter name to value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    entries: Vec<(String, Value)>,
}

impl ParameterMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get a value by parameter name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for ParameterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = ParameterMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter name to value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ParameterMap, A::Error> {
                let mut map = ParameterMap::new();
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    if map.get(&name).is_some() {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate parameter '{name}'"
                        )));
                    }
                    map.entries.push((name, value));
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

/// A named assignment of values to schema parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Preset name; also the file stem of its binary form.
    pub name: String,
    /// Parameter values.
    #[serde(default)]
    pub parameter: ParameterMap,
}

impl Preset {
    /// Create a preset with no values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter: ParameterMap::new(),
        }
    }

    /// Add a parameter value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameter.insert(name, value);
        self
    }

    /// Whether this is the "Default" preset.
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_PRESET_NAME
    }

    /// Check that every value names a schema parameter.
    pub fn validate(&self, schema: &Schema) -> Result<(), PresetError> {
        match self.parameter.names().find(|name| !schema.contains(name)) {
            Some(stray) => Err(PresetError::unknown_parameter(&self.name, stray)),
            None => Ok(()),
        }
    }

    /// Check that every float is finite. JSON has no NaN or infinity.
    pub fn check_finite(&self) -> Result<(), PresetError> {
        let bad = self
            .parameter
            .iter()
            .find(|(_, v)| matches!(v, Value::Float(f) if !f.is_finite()));
        match bad {
            Some((param, value)) => Err(PresetError::InvalidValue {
                preset: self.name.clone(),
                param: param.to_string(),
                reason: format!("{value} is not a finite number"),
            }),
            None => Ok(()),
        }
    }
}

/// Ordered collection of uniquely named presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PresetSet {
    presets: Vec<Preset>,
}

impl PresetSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, keeping the given order. Rejects duplicate names.
    pub fn from_presets(presets: impl IntoIterator<Item = Preset>) -> Result<Self, PresetError> {
        let mut set = Self::new();
        for preset in presets {
            set.push(preset)?;
        }
        Ok(set)
    }

    /// Append a preset. Rejects duplicate names.
    pub fn push(&mut self, preset: Preset) -> Result<(), PresetError> {
        if self.get(&preset.name).is_some() {
            return Err(PresetError::DuplicatePreset(preset.name));
        }
        self.presets.push(preset);
        Ok(())
    }

    /// Number of presets.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Iterate in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    /// Look up a preset by name.
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Presets in canonical order: "Default" first, the rest by name.
    ///
    /// Returns a new set; `self` is left in its original order.
    pub fn canonical(&self) -> PresetSet {
        let mut presets = self.presets.clone();
        presets.sort_by(|a, b| {
            b.is_default()
                .cmp(&a.is_default())
                .then_with(|| a.name.cmp(&b.name))
        });
        PresetSet { presets }
    }

    /// Check every preset against the schema.
    pub fn validate(&self, schema: &Schema) -> Result<(), PresetError> {
        self.presets.iter().try_for_each(|p| p.validate(schema))
    }

    /// Parse a `.preset.json` document, keeping its order.
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        let presets: Vec<Preset> = serde_json::from_str(json)?;
        Self::from_presets(presets)
    }

    /// Render the canonical `.preset.json` document.
    ///
    /// Fails on non-finite floats, which JSON cannot represent.
    pub fn to_json(&self) -> Result<String, PresetError> {
        self.presets.iter().try_for_each(Preset::check_finite)?;
        Ok(serde_json::to_string_pretty(&self.canonical())?)
    }

    /// Decode every preset file under `dir`.
    ///
    /// Files are visited recursively in path order and each preset is named
    /// after its file stem. The result keeps that order.
    pub fn from_binary_directory(
        dir: &Path,
        schema: &Schema,
        extension: &str,
        endian: Endianness,
    ) -> Result<Self, PresetError> {
        if !dir.is_dir() {
            return Err(PresetError::MissingInput(format!(
                "preset directory '{}' does not exist",
                dir.display()
            )));
        }

        let mut set = Self::new();
        let mut seen = HashSet::new();
        for path in list_preset_files(dir, extension)? {
            let name = preset_name_from_path(&path).ok_or_else(|| {
                PresetError::MissingInput(format!("no file stem in '{}'", path.display()))
            })?;
            if !seen.insert(name.clone()) {
                return Err(PresetError::DuplicatePreset(name));
            }

            let bytes = std::fs::read(&path).map_err(|e| PresetError::read_file(&path, e))?;
            let container =
                BinaryContainer::decode(&bytes, endian).map_err(|e| PresetError::in_file(&path, e))?;
            let comp = container.component_chunk().ok_or_else(|| {
                PresetError::in_file(
                    &path,
                    PresetError::format(container.chunk_list_offset, "no Comp section"),
                )
            })?;
            let parameter =
                chunk::unpack(comp, schema, endian).map_err(|e| PresetError::in_file(&path, e))?;
            let preset = Preset { name, parameter };
            preset
                .check_finite()
                .map_err(|e| PresetError::in_file(&path, e))?;
            tracing::debug!(
                path = %path.display(),
                sections = container.entries.len(),
                "decoded preset"
            );
            set.presets.push(preset);
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for PresetSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let presets = Vec::<Preset>::deserialize(deserializer)?;
        PresetSet::from_presets(presets).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a PresetSet {
    type Item = &'a Preset;
    type IntoIter = std::slice::Iter<'a, Preset>;

    fn into_iter(self) -> Self::IntoIter {
        self.presets.iter()
    }
}
