//! Parameter schema extraction from a plugin's `parameter.hpp`.
//!
//! The declaration source has two parts that matter:
//!
//! ```text
//! namespace ParameterID {
//! enum ID {
//!   bypass,
//!   attack0,
//!   decay0 = 65,        // attack0 spans 64 slots
//!   gain = 129,
//!   ID_ENUM_LENGTH,
//! };
//! }
//!
//! value[ID::bypass] = std::make_unique<IntValue>(0, Scales::boolScale, "bypass", kFlags);
//! value[ID::attack0 + i] = std::make_unique<LogValue>(0.0, Scales::envelopeA, label, kFlags);
//! ```
//!
//! Extraction runs in two stages. Stage one walks the enum and assigns every
//! entry its numeric index and stride. Stage two scans the construction
//! statements and resolves each against the enum, producing a
//! [`ParameterTemplate`] per entry. Templates are expanded into concrete
//! [`ParameterDef`]s before the [`Schema`] is returned, so nothing downstream
//! ever sees an array template.

use std::collections::HashMap;

use crate::error::PresetError;
use crate::schema::{OpaqueExpr, ParameterDef, Schema, StorageType};
use crate::value::Value;

/// Constructor that produces integer-stored parameters.
const INTEGER_CTOR: &str = "IntValue";

/// Marker preceding the plugin name in the license header.
const PLUGIN_NAME_MARKER: &str = "This file is part of ";

/// Result of extracting a declaration source unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSchema {
    /// Plugin name from the license header, if present.
    pub plugin_name: Option<String>,
    /// Parameters in declaration order.
    pub schema: Schema,
}

/// One entry of the parameter ID enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    /// Enumerator name.
    pub name: String,
    /// Numeric value.
    pub index: i64,
    /// Distance to the next enumerator. Greater than one for array bases.
    pub stride: i64,
}

/// A parameter as declared, before array expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterTemplate {
    /// A single parameter.
    Scalar {
        /// Enumerator name.
        name: String,
        /// Packed representation.
        storage: StorageType,
        /// Default expression text.
        default: String,
        /// Scale expression.
        scale: OpaqueExpr,
        /// Flag expression.
        flags: OpaqueExpr,
    },
    /// `count` parameters sharing one construction statement.
    ArrayTemplate {
        /// Enumerator name of the first element, ending in its index digit
        /// (`gain0`, `gain1`).
        base: String,
        /// Number of elements, the base entry's stride.
        count: usize,
        /// Loop variable substituted into `default_template`.
        var: String,
        /// Packed representation.
        storage: StorageType,
        /// Default expression with the loop variable unsubstituted.
        default_template: String,
        /// Scale expression.
        scale: OpaqueExpr,
        /// Flag expression.
        flags: OpaqueExpr,
    },
}

impl ParameterTemplate {
    /// Expand into concrete definitions.
    pub fn expand(&self) -> Vec<ParameterDef> {
        match self {
            ParameterTemplate::Scalar {
                name,
                storage,
                default,
                scale,
                flags,
            } => vec![ParameterDef {
                schema_index: 0,
                name: name.clone(),
                storage: *storage,
                index_expr: name.clone(),
                default: Value::parse_literal(default),
                scale: scale.clone(),
                flags: flags.clone(),
            }],
            ParameterTemplate::ArrayTemplate {
                base,
                count,
                var,
                storage,
                default_template,
                scale,
                flags,
            } => {
                let stem = array_stem(base);
                (0..*count)
                    .map(|i| ParameterDef {
                        schema_index: 0,
                        name: format!("{stem}{i}"),
                        storage: *storage,
                        index_expr: format!("{base} + {i}"),
                        default: Value::parse_literal(&substitute_word(
                            default_template,
                            var,
                            &i.to_string(),
                        )),
                        scale: scale.clone(),
                        flags: flags.clone(),
                    })
                    .collect()
            }
        }
    }
}

/// Element name stem of an array base: the base minus its trailing index
/// digit, so `gain0` and `gain1` both expand to `gain0, gain1, ...`.
fn array_stem(base: &str) -> &str {
    base.strip_suffix(|c: char| c.is_ascii_digit())
        .unwrap_or(base)
}

/// Extract the parameter schema from declaration source text.
pub fn extract_schema(source: &str) -> Result<ExtractedSchema, PresetError> {
    let plugin_name = plugin_name(source);
    let code = strip_comments(source);

    let (entries, enum_end) = parse_enum(&code)?;
    let constructions = scan_constructions(&code[enum_end..])?;
    if constructions.is_empty() {
        return Err(PresetError::malformed(
            "no parameter construction statements found",
        ));
    }

    let templates = resolve(&entries, constructions)?;
    let schema = Schema::from_defs(templates.iter().flat_map(ParameterTemplate::expand))?;

    tracing::debug!(
        plugin = plugin_name.as_deref().unwrap_or("<unnamed>"),
        enum_entries = entries.len(),
        parameters = schema.len(),
        "extracted parameter schema"
    );

    Ok(ExtractedSchema {
        plugin_name,
        schema,
    })
}

/// Parse only the parameter ID enumeration, terminator dropped.
pub fn enum_entries(source: &str) -> Result<Vec<EnumEntry>, PresetError> {
    parse_enum(&strip_comments(source)).map(|(entries, _)| entries)
}

fn plugin_name(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let (_, rest) = line.split_once(PLUGIN_NAME_MARKER)?;
        let name = rest.trim();
        let name = name.strip_suffix('.').unwrap_or(name);
        (!name.is_empty()).then(|| name.to_string())
    })
}

// ---------------------------------------------------------------------------
// Stage one: enumeration
// ---------------------------------------------------------------------------

/// Returns the entries and the byte offset just past the enum body.
fn parse_enum(code: &str) -> Result<(Vec<EnumEntry>, usize), PresetError> {
    let not_found = || PresetError::malformed("enum ParameterID::ID not found");

    let mut from = 0;
    let ns = loop {
        let at = find_word(code, "ParameterID", from).ok_or_else(not_found)?;
        if code[..at].trim_end().ends_with("namespace") {
            break at;
        }
        from = at + 1;
    };
    let enum_kw = find_word(code, "enum", ns).ok_or_else(not_found)?;
    let open = enum_kw + code[enum_kw..].find('{').ok_or_else(not_found)?;
    let close = open
        + code[open..]
            .find('}')
            .ok_or_else(|| PresetError::malformed("enum ParameterID::ID is not closed"))?;

    let mut symbols = integer_constants(&code[..ns]);
    let mut raw = Vec::new();
    let mut next = 0i64;
    for item in code[open + 1..close].split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (name, index) = match item.split_once('=') {
            Some((name, expr)) => {
                let name = name.trim();
                let index = eval_int(expr, &symbols).map_err(|reason| {
                    PresetError::malformed(format!("enum entry '{name}': {reason}"))
                })?;
                (name, index)
            }
            None => (item, next),
        };
        if !is_identifier(name) {
            return Err(PresetError::malformed(format!(
                "invalid enum entry '{item}'"
            )));
        }
        symbols.insert(name.to_string(), index);
        raw.push((name.to_string(), index));
        next = index + 1;
    }

    // The last entry is the length terminator; it only bounds the previous stride.
    if raw.len() < 2 {
        return Err(PresetError::malformed(
            "enum ParameterID::ID has no entries before its terminator",
        ));
    }
    let entries = raw
        .windows(2)
        .map(|pair| EnumEntry {
            name: pair[0].0.clone(),
            index: pair[0].1,
            stride: pair[1].1 - pair[0].1,
        })
        .collect();

    Ok((entries, close + 1))
}

/// Integer `const`/`constexpr` declarations, usable in enum values.
///
/// Declarations whose value is not an integer expression are skipped.
fn integer_constants(code: &str) -> HashMap<String, i64> {
    let mut symbols = HashMap::new();
    for stmt in code.split(';') {
        let Some(at) = find_word(stmt, "constexpr", 0).or_else(|| find_word(stmt, "const", 0))
        else {
            continue;
        };
        let Some((decl, expr)) = stmt[at..].split_once('=') else {
            continue;
        };
        let Some(name) = decl.split_whitespace().last() else {
            continue;
        };
        if let Ok(v) = eval_int(expr, &symbols) {
            symbols.insert(name.to_string(), v);
        }
    }
    symbols
}

/// Evaluate `+`, `-`, `*` and parentheses over integer literals and symbols.
fn eval_int(expr: &str, symbols: &HashMap<String, i64>) -> Result<i64, String> {
    let mut parser = ExprParser {
        input: expr.as_bytes(),
        pos: 0,
        symbols,
    };
    let value = parser.sum()?;
    parser.skip_ws();
    if parser.pos != parser.input.len() {
        return Err(format!("unexpected text in '{}'", expr.trim()));
    }
    Ok(value)
}

/// Recursive descent over a tiny integer expression grammar.
///
/// ```text
/// sum     ::= product ( ('+' | '-') product )*
/// product ::= atom ( '*' atom )*
/// atom    ::= literal | symbol | '(' sum ')'
/// ```
struct ExprParser<'a> {
    input: &'a [u8],
    pos: usize,
    symbols: &'a HashMap<String, i64>,
}

impl ExprParser<'_> {
    fn skip_ws(&mut self) {
        while self.input.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.input.get(self.pos).copied()
    }

    fn sum(&mut self) -> Result<i64, String> {
        let mut acc = self.product()?;
        loop {
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    acc = acc.checked_add(self.product()?).ok_or("overflow")?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    acc = acc.checked_sub(self.product()?).ok_or("overflow")?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn product(&mut self) -> Result<i64, String> {
        let mut acc = self.atom()?;
        while self.peek() == Some(b'*') {
            self.pos += 1;
            acc = acc.checked_mul(self.atom()?).ok_or("overflow")?;
        }
        Ok(acc)
    }

    fn atom(&mut self) -> Result<i64, String> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let v = self.sum()?;
                if self.peek() != Some(b')') {
                    return Err("expected ')'".to_string());
                }
                self.pos += 1;
                Ok(v)
            }
            Some(b) if b.is_ascii_alphanumeric() || b == b'_' => {
                let start = self.pos;
                while self
                    .input
                    .get(self.pos)
                    .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_' || b == b':')
                {
                    self.pos += 1;
                }
                let token = String::from_utf8_lossy(&self.input[start..self.pos]);
                if b.is_ascii_digit() {
                    parse_int_literal(&token).ok_or_else(|| format!("bad literal '{token}'"))
                } else {
                    let name = token.rsplit("::").next().unwrap_or(&token);
                    self.symbols
                        .get(name)
                        .copied()
                        .ok_or_else(|| format!("undefined symbol '{name}'"))
                }
            }
            Some(b) => Err(format!("unexpected '{}'", b as char)),
            None => Err("empty expression".to_string()),
        }
    }
}

fn parse_int_literal(token: &str) -> Option<i64> {
    let token = token.trim_end_matches(['u', 'U', 'l', 'L']);
    match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

// ---------------------------------------------------------------------------
// Stage two: construction statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Target {
    Scalar(String),
    Array { base: String, var: String },
}

impl Target {
    fn name(&self) -> &str {
        match self {
            Target::Scalar(name) | Target::Array { base: name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Construction {
    target: Target,
    storage: StorageType,
    default: String,
    scale: OpaqueExpr,
    flags: OpaqueExpr,
}

fn scan_constructions(code: &str) -> Result<Vec<Construction>, PresetError> {
    let mut found = Vec::new();
    for (at, _) in code.match_indices("value[") {
        if code[..at]
            .bytes()
            .next_back()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            continue;
        }
        let mut cursor = Cursor::new(code, at + "value".len());
        let Some((target, ctor, args)) = cursor.construction() else {
            continue;
        };
        let Some(target) = parse_target(target) else {
            if target.contains("ID::") {
                return Err(PresetError::malformed(format!(
                    "unsupported parameter target 'value[{}]'",
                    target.trim()
                )));
            }
            continue;
        };
        if args.len() < 2 {
            return Err(PresetError::malformed(format!(
                "construction of '{}' needs at least a default and a scale argument",
                target.name()
            )));
        }
        let storage = if ctor.rsplit("::").next() == Some(INTEGER_CTOR) {
            StorageType::Integer
        } else {
            StorageType::Float64
        };
        found.push(Construction {
            target,
            storage,
            default: args[0].clone(),
            scale: OpaqueExpr::new(args[1].as_str()),
            flags: OpaqueExpr::new(args.get(3).map(String::as_str).unwrap_or_default()),
        });
    }
    Ok(found)
}

/// `ID::name` or `ID::name + var`.
fn parse_target(text: &str) -> Option<Target> {
    let (_, rest) = text.rsplit_once("ID::")?;
    match rest.split_once('+') {
        Some((base, var)) => {
            let (base, var) = (base.trim(), var.trim());
            (is_identifier(base) && is_identifier(var)).then(|| Target::Array {
                base: base.to_string(),
                var: var.to_string(),
            })
        }
        None => {
            let name = rest.trim();
            is_identifier(name).then(|| Target::Scalar(name.to_string()))
        }
    }
}

/// Byte cursor over comment-free source.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, lit: &str) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    /// Consume `open ... close` with nesting and string literals; return the inside.
    fn balanced(&mut self, open: u8, close: u8) -> Option<&'a str> {
        self.skip_ws();
        if self.peek() != Some(open) {
            return None;
        }
        let bytes = self.src.as_bytes();
        let start = self.pos + 1;
        let mut depth = 0usize;
        let mut i = self.pos;
        while i < bytes.len() {
            match bytes[i] {
                b'"' | b'\'' => i = skip_quoted(bytes, i),
                b if b == open => depth += 1,
                b if b == close => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return Some(&self.src[start..i]);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// `[target] = std::make_unique<Ctor>(args);`
    fn construction(&mut self) -> Option<(&'a str, &'a str, Vec<String>)> {
        let target = self.balanced(b'[', b']')?;
        if !self.eat("=") || self.peek() == Some(b'=') {
            return None;
        }
        if !self.eat("std::make_unique") {
            return None;
        }
        let ctor = self.balanced(b'<', b'>')?.trim();
        let args = self.balanced(b'(', b')')?;
        if !self.eat(";") {
            return None;
        }
        Some((target, ctor, split_top_level(args)))
    }
}

/// Index of the closing quote of the literal opening at `start`.
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == quote => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Split on commas outside brackets and string literals.
fn split_top_level(args: &str) -> Vec<String> {
    let bytes = args.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_quoted(bytes, i),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(args[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    let last = args[start..].trim();
    if !last.is_empty() {
        parts.push(last.to_string());
    }
    parts
}

fn resolve(
    entries: &[EnumEntry],
    constructions: Vec<Construction>,
) -> Result<Vec<ParameterTemplate>, PresetError> {
    let mut by_name: HashMap<String, Construction> = HashMap::new();
    for c in constructions {
        let name = c.target.name().to_string();
        if !entries.iter().any(|e| e.name == name) {
            return Err(PresetError::malformed(format!(
                "construction targets '{name}', which is not in enum ParameterID::ID"
            )));
        }
        if by_name.insert(name.clone(), c).is_some() {
            return Err(PresetError::malformed(format!(
                "parameter '{name}' is constructed more than once"
            )));
        }
    }

    let mut templates = Vec::with_capacity(by_name.len());
    for entry in entries {
        let Some(c) = by_name.remove(&entry.name) else {
            tracing::debug!(entry = %entry.name, "enum entry has no construction; skipped");
            continue;
        };
        let template = match c.target {
            Target::Scalar(name) => ParameterTemplate::Scalar {
                name,
                storage: c.storage,
                default: c.default,
                scale: c.scale,
                flags: c.flags,
            },
            Target::Array { base, var } => {
                let count = usize::try_from(entry.stride)
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| {
                        PresetError::malformed(format!(
                            "array parameter '{base}' has non-positive stride {}",
                            entry.stride
                        ))
                    })?;
                ParameterTemplate::ArrayTemplate {
                    base,
                    count,
                    var,
                    storage: c.storage,
                    default_template: c.default,
                    scale: c.scale,
                    flags: c.flags,
                }
            }
        };
        templates.push(template);
    }
    Ok(templates)
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    bytes
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        && bytes.all(is_ident_byte)
}

/// Find `word` at or after `from`, bounded by non-identifier bytes.
fn find_word(code: &str, word: &str, from: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    code[from..]
        .match_indices(word)
        .map(|(i, _)| from + i)
        .find(|&at| {
            let before = at.checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(at + word.len()).copied();
            !before.is_some_and(is_ident_byte) && !after.is_some_and(is_ident_byte)
        })
}

/// Replace whole-word occurrences of `word`.
fn substitute_word(text: &str, word: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut from = 0;
    while let Some(at) = find_word(text, word, from) {
        out.push_str(&text[last..at]);
        out.push_str(replacement);
        last = at + word.len();
        from = last;
    }
    out.push_str(&text[last..]);
    out
}

/// Remove `//` and `/* */` comments, leaving string literals intact.
fn strip_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    let mut copied = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_quoted(bytes, i) + 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&source[copied..i]);
                i = source[i..].find('\n').map_or(bytes.len(), |n| i + n);
                copied = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&source[copied..i]);
                i = source[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
                out.push(' ');
                copied = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&source[copied.min(source.len())..]);
    out
}
