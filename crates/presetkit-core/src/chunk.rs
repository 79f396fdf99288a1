//! Component chunk packing: parameter values laid out in schema order.

use crate::container::Endianness;
use crate::error::PresetError;
use crate::preset::{ParameterMap, Preset};
use crate::schema::{Schema, StorageType};
use crate::value::Value;

/// Read one value per schema parameter from `chunk`.
///
/// A chunk shorter than the schema requires is a hard error. Trailing bytes
/// after the last parameter are ignored.
pub fn unpack(
    chunk: &[u8],
    schema: &Schema,
    endian: Endianness,
) -> Result<ParameterMap, PresetError> {
    let mut values = ParameterMap::new();
    let mut offset = 0usize;
    for param in schema.iter() {
        let width = param.storage.width();
        let field = chunk
            .get(offset..offset + width)
            .ok_or_else(|| PresetError::Truncation {
                param: param.name.clone(),
                offset,
                needed: width,
                available: chunk.len().saturating_sub(offset),
            })?;
        let value = match param.storage {
            StorageType::Integer => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(field);
                Value::from(endian.u32(buf))
            }
            StorageType::Float64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(field);
                Value::Float(endian.f64(buf))
            }
        };
        values.insert(param.name.clone(), value);
        offset += width;
    }
    if offset < chunk.len() {
        tracing::debug!(
            trailing = chunk.len() - offset,
            "component chunk longer than schema"
        );
    }
    Ok(values)
}

/// Pack a preset's values in schema order, little-endian.
///
/// Every schema parameter must have a value except `bypass_param`, which is
/// always written as 0. Values for names outside the schema are rejected.
pub fn pack(preset: &Preset, schema: &Schema, bypass_param: &str) -> Result<Vec<u8>, PresetError> {
    if let Some(stray) = preset.parameter.names().find(|name| !schema.contains(name)) {
        return Err(PresetError::unknown_parameter(&preset.name, stray));
    }

    let forced = Value::Int(0);
    let mut out = Vec::with_capacity(schema.chunk_size());
    for param in schema.iter() {
        let value = if param.name == bypass_param {
            &forced
        } else {
            preset
                .parameter
                .get(&param.name)
                .ok_or_else(|| PresetError::unknown_parameter(&preset.name, &param.name))?
        };
        let invalid = |reason: &str| PresetError::InvalidValue {
            preset: preset.name.clone(),
            param: param.name.clone(),
            reason: reason.to_string(),
        };
        match param.storage {
            StorageType::Integer => {
                let v = value
                    .as_i64()
                    .ok_or_else(|| invalid("expected an integer"))?;
                let v = u32::try_from(v)
                    .map_err(|_| invalid("integer out of range for 4-byte unsigned storage"))?;
                out.extend_from_slice(&v.to_le_bytes());
            }
            StorageType::Float64 => {
                let v = value.as_f64().ok_or_else(|| invalid("expected a number"))?;
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    Ok(out)
}
