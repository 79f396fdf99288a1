//! VST3 preset container (`.vstpreset`) reading and writing.
//!
//! # Layout
//!
//! ```text
//! offset  size  field
//! 0       4     "VST3"
//! 4       4     version
//! 8       32    class id (ASCII)
//! 40      8     chunk list offset
//! 48      n     chunk data ("Comp", optionally "Cont", "Info", ...)
//! L       4     "List"
//! L+4     4     entry count
//! L+8     20*k  entries: id (4) + offset (8) + size (8)
//! ```
//!
//! Offsets are absolute from the start of the file. Reading tolerates any
//! number of sections with any id; writing emits only the component chunk.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chunk;
use crate::class_id::ClassId;
use crate::error::PresetError;
use crate::preset::Preset;
use crate::schema::Schema;

/// File magic.
pub const HEADER_ID: &[u8; 4] = b"VST3";
/// Size of the fixed header preceding chunk data.
pub const HEADER_SIZE: u64 = 48;
/// Version written by [`encode`].
pub const FORMAT_VERSION: u32 = 1;
/// Chunk list magic.
pub const LIST_ID: &[u8; 4] = b"List";
/// Component state section.
pub const COMP_ID: &str = "Comp";
/// Controller state section.
pub const CONT_ID: &str = "Cont";
/// Metadata section (UTF-8 XML).
pub const INFO_ID: &str = "Info";

/// Size of one chunk list entry.
const ENTRY_SIZE: u64 = 4 + 8 + 8;

/// Byte order of integer and float fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Little-endian (the format default).
    #[default]
    Little,
    /// Big-endian.
    Big,
}

impl Endianness {
    pub(crate) fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }

    pub(crate) fn u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Endianness::Little => u64::from_le_bytes(bytes),
            Endianness::Big => u64::from_be_bytes(bytes),
        }
    }

    pub(crate) fn f64(self, bytes: [u8; 8]) -> f64 {
        match self {
            Endianness::Little => f64::from_le_bytes(bytes),
            Endianness::Big => f64::from_be_bytes(bytes),
        }
    }
}

/// One chunk list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    /// Four-character section id.
    pub id: String,
    /// Absolute offset of the section data.
    pub offset: u64,
    /// Section data size in bytes.
    pub size: u64,
}

/// Contents of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Opaque bytes ("Comp", "Cont", and unknown ids).
    Raw(Vec<u8>),
    /// Decoded text ("Info").
    Text(String),
}

/// A decoded preset container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryContainer {
    /// Format version.
    pub version: u32,
    /// 32-character class id.
    pub class_id: String,
    /// Offset of the chunk list.
    pub chunk_list_offset: u64,
    /// Chunk list magic as read.
    pub list_id: String,
    /// Directory entries in file order.
    pub entries: Vec<ChunkEntry>,
    /// Section contents, parallel to `entries`.
    pub sections: Vec<(String, Section)>,
}

impl BinaryContainer {
    /// Decode a container.
    ///
    /// Every offset and size is checked against `bytes.len()` before it is
    /// used, so a corrupt directory cannot cause reads past the end.
    pub fn decode(bytes: &[u8], endian: Endianness) -> Result<Self, PresetError> {
        let mut r = Reader::new(bytes, endian);

        let magic = r.take(4)?;
        if magic != HEADER_ID {
            return Err(PresetError::format(0, "header id is not \"VST3\""));
        }
        let version = r.u32()?;
        let class_id = r.ascii(32)?;
        let chunk_list_offset = r.u64()?;

        r.seek(chunk_list_offset)?;
        let list_id = r.ascii(4)?;
        let count = r.u32()?;
        let table_fits = u64::from(count)
            .checked_mul(ENTRY_SIZE)
            .and_then(|n| n.checked_add(r.pos as u64))
            .is_some_and(|end| end <= bytes.len() as u64);
        if !table_fits {
            return Err(PresetError::format(
                chunk_list_offset,
                format!("chunk list declares {count} entries beyond end of file"),
            ));
        }

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(ChunkEntry {
                id: r.ascii(4)?,
                offset: r.u64()?,
                size: r.u64()?,
            });
        }

        let mut sections = Vec::with_capacity(entries.len());
        for entry in &entries {
            r.seek(entry.offset)?;
            let size = usize::try_from(entry.size).map_err(|_| {
                PresetError::format(entry.offset, format!("section '{}' is too large", entry.id))
            })?;
            let data = r.take(size).map_err(|_| {
                PresetError::format(
                    entry.offset,
                    format!(
                        "section '{}' of {} bytes runs past end of file ({} bytes)",
                        entry.id,
                        entry.size,
                        bytes.len()
                    ),
                )
            })?;
            let section = if entry.id == INFO_ID {
                let text = std::str::from_utf8(data).map_err(|e| {
                    PresetError::format(entry.offset, format!("Info section is not UTF-8: {e}"))
                })?;
                Section::Text(text.to_string())
            } else {
                Section::Raw(data.to_vec())
            };
            sections.push((entry.id.clone(), section));
        }

        Ok(Self {
            version,
            class_id,
            chunk_list_offset,
            list_id,
            entries,
            sections,
        })
    }

    /// Look up a section by id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(sid, _)| sid == id)
            .map(|(_, s)| s)
    }

    /// Bytes of the "Comp" section.
    pub fn component_chunk(&self) -> Option<&[u8]> {
        match self.section(COMP_ID)? {
            Section::Raw(bytes) => Some(bytes),
            Section::Text(_) => None,
        }
    }

    /// Human-readable report of the header and directory.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BinaryContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} VST3", "header_id")?;
        writeln!(f, "{:<24} {}", "version", self.version)?;
        writeln!(f, "{:<24} {}", "class_id", self.class_id)?;
        writeln!(f, "{:<24} {}", "chunk_list_offset", self.chunk_list_offset)?;
        writeln!(f, "{:<24} {}", "list_id", self.list_id)?;
        writeln!(f, "{:<24} {}", "entry_count", self.entries.len())?;
        for entry in &self.entries {
            writeln!(
                f,
                "{:<24} offset {:<10} size {}",
                entry.id, entry.offset, entry.size
            )?;
        }
        for (id, section) in &self.sections {
            if let Section::Text(text) = section {
                writeln!(f, "\n-- {id}\n{text}")?;
            }
        }
        Ok(())
    }
}

/// Encode a preset into a container holding a single "Comp" section.
///
/// The layout is fixed little-endian regardless of how the source files were
/// read.
pub fn encode(
    preset: &Preset,
    schema: &Schema,
    class_id: &ClassId,
    bypass_param: &str,
) -> Result<Vec<u8>, PresetError> {
    let component = chunk::pack(preset, schema, bypass_param)?;
    let comp_size = component.len() as u64;
    let chunk_list_offset = HEADER_SIZE + comp_size;

    let mut out = Vec::with_capacity((chunk_list_offset + 8 + ENTRY_SIZE) as usize);
    out.extend_from_slice(HEADER_ID);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(class_id.as_bytes());
    out.extend_from_slice(&chunk_list_offset.to_le_bytes());
    out.extend_from_slice(&component);
    out.extend_from_slice(LIST_ID);
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(COMP_ID.as_bytes());
    out.extend_from_slice(&HEADER_SIZE.to_le_bytes());
    out.extend_from_slice(&comp_size.to_le_bytes());
    Ok(out)
}

/// Bounds-checked cursor over the input.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    endian: Endianness,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], endian: Endianness) -> Self {
        Self {
            bytes,
            pos: 0,
            endian,
        }
    }

    fn seek(&mut self, offset: u64) -> Result<(), PresetError> {
        if offset > self.bytes.len() as u64 {
            return Err(PresetError::format(
                offset,
                format!("offset beyond end of file ({} bytes)", self.bytes.len()),
            ));
        }
        self.pos = offset as usize;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PresetError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                PresetError::format(
                    self.pos as u64,
                    format!("need {n} bytes, file has {} bytes", self.bytes.len()),
                )
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], PresetError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn u32(&mut self) -> Result<u32, PresetError> {
        Ok(self.endian.u32(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, PresetError> {
        Ok(self.endian.u64(self.array()?))
    }

    fn ascii(&mut self, n: usize) -> Result<String, PresetError> {
        let at = self.pos as u64;
        let bytes = self.take(n)?;
        if !bytes.is_ascii() {
            return Err(PresetError::format(at, "expected ASCII text"));
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParameterDef, StorageType};

    fn class_id() -> ClassId {
        ClassId::new("0123456789ABCDEF0123456789ABCDEF").unwrap()
    }

    fn gain_schema() -> Schema {
        Schema::from_defs([ParameterDef::new("gain", StorageType::Float64, 0.5)]).unwrap()
    }

    #[test]
    fn encode_single_float_layout() {
        let preset = Preset::new("Default").with_param("gain", 0.5);
        let bytes = encode(&preset, &gain_schema(), &class_id(), "bypass").unwrap();

        assert_eq!(bytes.len(), 48 + 8 + 4 + 4 + 20);
        assert_eq!(&bytes[0..4], b"VST3");
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..40], b"0123456789ABCDEF0123456789ABCDEF");
        assert_eq!(&bytes[40..48], &56u64.to_le_bytes());
        assert_eq!(&bytes[48..56], &0.5f64.to_le_bytes());
        assert_eq!(&bytes[56..60], b"List");
        assert_eq!(&bytes[60..64], &1u32.to_le_bytes());
        assert_eq!(&bytes[64..68], b"Comp");
        assert_eq!(&bytes[68..76], &48u64.to_le_bytes());
        assert_eq!(&bytes[76..84], &8u64.to_le_bytes());
    }

    #[test]
    fn decode_encoded_container() {
        let preset = Preset::new("Default").with_param("gain", 0.5);
        let bytes = encode(&preset, &gain_schema(), &class_id(), "bypass").unwrap();
        let container = BinaryContainer::decode(&bytes, Endianness::Little).unwrap();

        assert_eq!(container.version, 1);
        assert_eq!(container.class_id, "0123456789ABCDEF0123456789ABCDEF");
        assert_eq!(container.chunk_list_offset, 56);
        assert_eq!(container.list_id, "List");
        assert_eq!(
            container.entries,
            vec![ChunkEntry {
                id: "Comp".into(),
                offset: 48,
                size: 8
            }]
        );
        assert_eq!(container.component_chunk(), Some(&0.5f64.to_le_bytes()[..]));
    }

    #[test]
    fn bad_magic_is_format_error() {
        let mut bytes = encode(
            &Preset::new("Default").with_param("gain", 0.5),
            &gain_schema(),
            &class_id(),
            "bypass",
        )
        .unwrap();
        bytes[0] = b'X';
        let err = BinaryContainer::decode(&bytes, Endianness::Little).unwrap_err();
        assert!(matches!(err, PresetError::Format { offset: 0, .. }));
    }

    #[test]
    fn short_header_is_format_error() {
        let err = BinaryContainer::decode(b"VST3\x01\0\0\0", Endianness::Little).unwrap_err();
        assert!(matches!(err, PresetError::Format { .. }));
    }

    #[test]
    fn section_past_end_is_format_error() {
        let mut bytes = encode(
            &Preset::new("Default").with_param("gain", 0.5),
            &gain_schema(),
            &class_id(),
            "bypass",
        )
        .unwrap();
        // Comp size field.
        bytes[76..84].copy_from_slice(&1000u64.to_le_bytes());
        let err = BinaryContainer::decode(&bytes, Endianness::Little).unwrap_err();
        assert!(
            matches!(err, PresetError::Format { offset: 48, ref reason } if reason.contains("Comp")),
            "got: {err}"
        );
    }

    #[test]
    fn chunk_list_offset_past_end_is_format_error() {
        let mut bytes = encode(
            &Preset::new("Default").with_param("gain", 0.5),
            &gain_schema(),
            &class_id(),
            "bypass",
        )
        .unwrap();
        bytes[40..48].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(BinaryContainer::decode(&bytes, Endianness::Little).is_err());
    }

    #[test]
    fn huge_entry_count_is_format_error() {
        let mut bytes = encode(
            &Preset::new("Default").with_param("gain", 0.5),
            &gain_schema(),
            &class_id(),
            "bypass",
        )
        .unwrap();
        bytes[60..64].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = BinaryContainer::decode(&bytes, Endianness::Little).unwrap_err();
        assert!(matches!(err, PresetError::Format { offset: 56, .. }));
    }

    /// Third-party files carry "Cont" and "Info" sections after "Comp".
    fn third_party_file(endian: Endianness) -> Vec<u8> {
        let put32 = |v: u32| match endian {
            Endianness::Little => v.to_le_bytes(),
            Endianness::Big => v.to_be_bytes(),
        };
        let put64 = |v: u64| match endian {
            Endianness::Little => v.to_le_bytes(),
            Endianness::Big => v.to_be_bytes(),
        };
        let comp = [1u8, 2, 3, 4];
        let cont = [9u8; 3];
        let info = "<MetaInfo></MetaInfo>".as_bytes();
        let list_offset = 48 + comp.len() + cont.len() + info.len();

        let mut out = Vec::new();
        out.extend_from_slice(b"VST3");
        out.extend_from_slice(&put32(1));
        out.extend_from_slice(&[b'A'; 32]);
        out.extend_from_slice(&put64(list_offset as u64));
        out.extend_from_slice(&comp);
        out.extend_from_slice(&cont);
        out.extend_from_slice(info);
        out.extend_from_slice(b"List");
        out.extend_from_slice(&put32(4));
        for (id, offset, size) in [
            (b"Comp", 48, comp.len()),
            (b"Cont", 52, cont.len()),
            (b"Info", 55, info.len()),
            (b"Xtra", 52, 0),
        ] {
            out.extend_from_slice(id);
            out.extend_from_slice(&put64(offset));
            out.extend_from_slice(&put64(size as u64));
        }
        out
    }

    #[test]
    fn decode_keeps_all_sections() {
        let container =
            BinaryContainer::decode(&third_party_file(Endianness::Little), Endianness::Little)
                .unwrap();
        assert_eq!(container.component_chunk(), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(container.section(CONT_ID), Some(&Section::Raw(vec![9, 9, 9])));
        assert_eq!(
            container.section(INFO_ID),
            Some(&Section::Text("<MetaInfo></MetaInfo>".into()))
        );
        assert_eq!(container.section("Xtra"), Some(&Section::Raw(Vec::new())));
    }

    #[test]
    fn decode_big_endian() {
        let container =
            BinaryContainer::decode(&third_party_file(Endianness::Big), Endianness::Big).unwrap();
        assert_eq!(container.version, 1);
        assert_eq!(container.entries.len(), 4);
        assert_eq!(container.entries[2].offset, 55);
    }

    #[test]
    fn summary_lists_entries() {
        let container =
            BinaryContainer::decode(&third_party_file(Endianness::Little), Endianness::Little)
                .unwrap();
        let text = container.summary();
        assert_eq!(text, container.to_string());
        assert!(text.starts_with("header_id                VST3\n"));
        assert!(text.contains("entry_count"));
        assert!(text.contains("Cont"));
        assert!(text.contains("<MetaInfo>"));
    }
}
