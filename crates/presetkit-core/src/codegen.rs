//! C++ source generation for built-in factory presets.
//!
//! Produces two artifacts from a schema and a preset set:
//!
//! - the loader: `GlobalParameter::loadProgram(uint32_t index)`, a `switch`
//!   with one `case` per preset assigning every stored value;
//! - the table: `enum Preset { ... }` plus a `programName` array of display
//!   names.
//!
//! Both are rendered from the same canonical ordering, so the enum value used
//! as a `case` label is always the index of that preset's display name.

use crate::error::PresetError;
use crate::preset::PresetSet;
use crate::schema::{Schema, StorageType};

const INDENT: &str = "  ";

/// Generated loader and table sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    /// `loadProgram` definition.
    pub loader: String,
    /// `enum Preset` and `programName` array.
    pub table: String,
    /// Enumerator per preset, in table order.
    pub identifiers: Vec<String>,
}

/// Enumerator for a preset: `prefix` plus the name with non-identifier
/// characters replaced by `_`.
///
/// ```rust
/// use presetkit_core::preset_identifier;
///
/// assert_eq!(preset_identifier("preset", "Default"), "presetDefault");
/// assert_eq!(preset_identifier("preset", "80s Lead"), "preset80s_Lead");
/// ```
pub fn preset_identifier(prefix: &str, name: &str) -> String {
    let mut ident = String::with_capacity(prefix.len() + name.len());
    ident.push_str(prefix);
    ident.extend(
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }),
    );
    ident
}

/// Render loader and table sources.
///
/// Requires a "Default" preset. Values are assigned in schema order; the
/// parameter named `bypass_param` is always assigned 0.
pub fn generate(
    schema: &Schema,
    presets: &PresetSet,
    prefix: &str,
    bypass_param: &str,
) -> Result<GeneratedSource, PresetError> {
    let presets = presets.canonical();
    if !presets.iter().next().is_some_and(|p| p.is_default()) {
        return Err(PresetError::MissingDefaultPreset);
    }
    presets.validate(schema)?;

    let identifiers: Vec<String> = presets
        .iter()
        .map(|p| preset_identifier(prefix, &p.name))
        .collect();
    if let Some(dup) = identifiers
        .iter()
        .enumerate()
        .find(|(i, id)| identifiers[..*i].contains(*id))
        .map(|(_, id)| id)
    {
        return Err(PresetError::DuplicatePreset(dup.clone()));
    }

    let mut loader = String::from(
        "#include \"parameter.hpp\"\n\
         \n\
         // Generated from preset dump.\n\
         #ifndef TEST_BUILD\n\
         \n\
         void GlobalParameter::loadProgram(uint32_t index)\n\
         {\n\
         \x20 using ID = ParameterID::ID;\n\
         \n\
         \x20 switch (index) {\n\
         \x20   default:\n\
         \x20     resetParameter();\n\
         \x20     break;\n",
    );
    for (preset, ident) in presets.iter().zip(&identifiers) {
        loader += &format!("\n{}case {ident}: {{\n", INDENT.repeat(2));
        for param in schema.iter() {
            let Some(value) = preset.parameter.get(&param.name) else {
                continue;
            };
            let value = if param.name == bypass_param {
                "0".to_string()
            } else if value.as_f64().is_some_and(f64::is_finite) {
                value.to_string()
            } else {
                return Err(PresetError::InvalidValue {
                    preset: preset.name.clone(),
                    param: param.name.clone(),
                    reason: format!("'{value}' is not a finite number"),
                });
            };
            let setter = match param.storage {
                StorageType::Integer => "setFromInt",
                StorageType::Float64 => "setFromNormalized",
            };
            loader += &format!(
                "{}value[ID::{}]->{setter}({value});\n",
                INDENT.repeat(3),
                param.index_expr
            );
        }
        loader += &format!("{}}} break;\n", INDENT.repeat(2));
    }
    loader += &format!("{INDENT}}}\n}}\n\n#endif\n");

    let mut table = String::from("enum Preset {\n");
    for ident in &identifiers {
        table += &format!("{INDENT}{ident},\n");
    }
    table += &format!("\n{INDENT}Preset_ENUM_LENGTH,\n}};\n\n");
    table += &format!(
        "std::array<const char*, {}> programName{{\n",
        identifiers.len()
    );
    for preset in presets.iter() {
        table += &format!("{INDENT}\"{}\",\n", escape_c_string(&preset.name));
    }
    table += "};\n";

    tracing::debug!(presets = identifiers.len(), "generated preset sources");

    Ok(GeneratedSource {
        loader,
        table,
        identifiers,
    })
}

fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
