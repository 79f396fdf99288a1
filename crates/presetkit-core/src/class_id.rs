//! Plugin class ids and the `class_id.json` lookup table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::PresetError;

/// Width of the class id field in the container header.
pub const CLASS_ID_LEN: usize = 32;

/// A 32-byte ASCII class id, space-padded when shorter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId([u8; CLASS_ID_LEN]);

impl ClassId {
    /// Validate and pad an id.
    ///
    /// ```rust
    /// use presetkit_core::ClassId;
    ///
    /// let id = ClassId::new("ABCD").unwrap();
    /// assert_eq!(&id.as_bytes()[..6], b"ABCD  ");
    /// assert!(ClassId::new(&"X".repeat(33)).is_err());
    /// ```
    pub fn new(id: &str) -> Result<Self, PresetError> {
        if !id.is_ascii() {
            return Err(PresetError::format(8, format!("class id '{id}' is not ASCII")));
        }
        if id.len() > CLASS_ID_LEN {
            return Err(PresetError::format(
                8,
                format!(
                    "class id '{id}' is {} bytes, at most {CLASS_ID_LEN} allowed",
                    id.len()
                ),
            ));
        }
        let mut bytes = [b' '; CLASS_ID_LEN];
        bytes[..id.len()].copy_from_slice(id.as_bytes());
        Ok(Self(bytes))
    }

    /// The 32 header bytes.
    pub fn as_bytes(&self) -> &[u8; CLASS_ID_LEN] {
        &self.0
    }

    /// The id as text, padding included.
    pub fn as_str(&self) -> &str {
        // Constructed from ASCII only.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plugin name to class id, as stored in `class_id.json`.
///
/// ```json
/// { "SyncSawSynth": "2A9A1E4C7D0B4F6EA5C3E1F0B9D8C7A6" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassIdTable(BTreeMap<String, String>);

impl ClassIdTable {
    /// Read a table from disk.
    pub fn load(path: &Path) -> Result<Self, PresetError> {
        if !path.is_file() {
            return Err(PresetError::MissingInput(format!(
                "class id table '{}' does not exist",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| PresetError::read_file(path, e))?;
        Self::from_json(&text).map_err(|e| PresetError::in_file(path, e))
    }

    /// Parse a table from JSON text.
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, plugin: impl Into<String>, id: impl Into<String>) {
        self.0.insert(plugin.into(), id.into());
    }

    /// Look up and validate the id for `plugin`.
    pub fn class_id(&self, plugin: &str) -> Result<ClassId, PresetError> {
        let id = self.0.get(plugin).ok_or_else(|| {
            PresetError::MissingInput(format!("no class id for plugin '{plugin}'"))
        })?;
        ClassId::new(id)
    }

    /// Plugin names in the table.
    pub fn plugins(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
