//! Fixed-width line encoding and decoding.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::error::{FieldDecodeError, FieldEncodeWarning, FormatError};
use super::schema::{FieldKind, FieldSchema, FieldSpec};
use super::types::{Record, Value};

/// Written into an alphanumeric slot whose value is explicitly null.
pub const NULL_SENTINEL: char = '\u{7f}';

/// Legacy null marker: the whole slot filled with this character.
pub const LEGACY_NULL_FILL: char = '~';

/// Characters that mark a slot as null when they make up its whole content.
pub const NULL_MARKERS: [char; 3] = ['\u{8}', NULL_SENTINEL, '\u{ff}'];

/// Stands in for embedded line breaks so a record stays on one line.
pub const LINE_BREAK_PLACEHOLDER: char = '\u{b}';

/// Codec behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Fail on the first field that cannot be encoded instead of leaving it blank.
    pub strict: bool,
    /// Decode `YYYYMMDD` date fields as `YYYY-MM-DD`.
    pub expand_dates: bool,
    /// Encode `YYYY-MM-DD` date fields as `YYYYMMDD`.
    pub contract_dates: bool,
    /// Lowercase name prefix identifying date fields.
    pub date_prefix: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict: false,
            expand_dates: false,
            contract_dates: false,
            date_prefix: "fec".into(),
        }
    }
}

/// Builder for [`CodecConfig`].
///
/// # Example
///
/// ```
/// use rece_formats::core::CodecConfigBuilder;
///
/// let config = CodecConfigBuilder::new()
///     .strict(true)
///     .expand_dates(true)
///     .contract_dates(true)
///     .build();
/// assert!(config.strict);
/// ```
#[derive(Debug, Default)]
pub struct CodecConfigBuilder {
    config: CodecConfig,
}

impl CodecConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on encode errors instead of warning.
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Expand `YYYYMMDD` dates on decode.
    pub fn expand_dates(mut self, expand: bool) -> Self {
        self.config.expand_dates = expand;
        self
    }

    /// Contract `YYYY-MM-DD` dates on encode.
    pub fn contract_dates(mut self, contract: bool) -> Self {
        self.config.contract_dates = contract;
        self
    }

    /// Set the date field name prefix (default `fec`).
    pub fn date_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.date_prefix = prefix.into().to_lowercase();
        self
    }

    pub fn build(self) -> CodecConfig {
        self.config
    }
}

/// Result of a lenient encode: the line plus every field that was left blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeReport {
    /// The encoded line, without a trailing newline.
    pub line: String,
    /// Fields that could not be written.
    pub warnings: Vec<FieldEncodeWarning>,
}

/// Encodes and decodes single fixed-width lines against a [`FieldSchema`].
#[derive(Debug, Clone, Default)]
pub struct RecordCodec {
    config: CodecConfig,
}

impl RecordCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode one line.
    ///
    /// Fields starting beyond the end of the line are omitted from the record;
    /// a truncated last field is decoded from the characters present.
    pub fn decode(&self, line: &str, schema: &FieldSchema) -> Result<Record, FieldDecodeError> {
        let chars: Vec<char> = line.trim_end_matches(['\r', '\n']).chars().collect();
        let mut record = Record::new();
        for (offset, field) in schema.offsets() {
            if offset >= chars.len() {
                break;
            }
            let end = (offset + field.width).min(chars.len());
            let raw: String = chars[offset..end].iter().collect();
            let value = self.decode_field(field, offset, &raw)?;
            record.insert(field.name, value);
        }
        Ok(record)
    }

    fn decode_field(
        &self,
        field: &FieldSpec,
        offset: usize,
        raw: &str,
    ) -> Result<Value, FieldDecodeError> {
        if is_null_slot(raw, field.width) {
            return Ok(Value::Null);
        }
        match field.kind {
            FieldKind::Alphanumeric => {
                let text = raw.trim_end_matches(' ');
                if self.config.expand_dates && self.is_date_field(field) {
                    return expand_date(field, offset, text);
                }
                Ok(Value::Text(text.replace(LINE_BREAK_PLACEHOLDER, "\n")))
            }
            FieldKind::Integer => {
                let text = raw.trim();
                if text.is_empty() {
                    return Ok(Value::Integer(0));
                }
                text.parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|e| FieldDecodeError::new(field.name, offset, text, e.to_string()))
            }
            FieldKind::Importe => decode_importe(field, offset, raw.trim()),
        }
    }

    /// Encode one line, without the trailing newline.
    ///
    /// In lenient mode fields that cannot be written are logged and left blank;
    /// use [`RecordCodec::encode_report`] to inspect them.
    pub fn encode(&self, record: &Record, schema: &FieldSchema) -> Result<String, FormatError> {
        self.encode_report(record, schema).map(|report| report.line)
    }

    /// Encode one line and return the warnings collected along the way.
    pub fn encode_report(
        &self,
        record: &Record,
        schema: &FieldSchema,
    ) -> Result<EncodeReport, FormatError> {
        let superseded = superseded_slots(schema);
        let mut line = vec![' '; schema.total_width()];
        let mut warnings = Vec::new();

        for (index, (offset, field)) in schema.offsets().enumerate() {
            match self.encode_field(field, offset, lookup(record, field.name)) {
                Ok(Some(slot)) => {
                    for (cell, ch) in line[offset..offset + field.width]
                        .iter_mut()
                        .zip(slot.chars())
                    {
                        *cell = ch;
                    }
                }
                Ok(None) => {}
                Err(warning) if superseded.contains(&index) => {
                    // A later alias slot carries the full value.
                    tracing::debug!(
                        schema = schema.name(),
                        field = %warning.field,
                        reason = %warning.reason,
                        "superseded slot left blank"
                    );
                }
                Err(warning) => {
                    if self.config.strict {
                        return Err(FormatError::FieldEncode(warning));
                    }
                    tracing::warn!(
                        schema = schema.name(),
                        field = %warning.field,
                        offset = warning.offset,
                        value = %warning.value,
                        reason = %warning.reason,
                        "field left blank"
                    );
                    warnings.push(warning);
                }
            }
        }

        Ok(EncodeReport {
            line: line.into_iter().collect(),
            warnings,
        })
    }

    fn encode_field(
        &self,
        field: &FieldSpec,
        offset: usize,
        value: Option<&Value>,
    ) -> Result<Option<String>, FieldEncodeWarning> {
        let width = field.width;
        let value = match value {
            None => return Ok(None),
            Some(Value::Null) if field.kind == FieldKind::Alphanumeric => {
                return Ok(Some(format!("{NULL_SENTINEL:<width$}")));
            }
            Some(Value::Null) => return Ok(None),
            Some(v) => v,
        };
        let fail = |reason: String| FieldEncodeWarning::new(field.name, offset, value.to_string(), reason);

        let slot = match field.kind {
            FieldKind::Alphanumeric => {
                let mut text = normalize_line_breaks(&value.to_string());
                if self.config.contract_dates && self.is_date_field(field) && !text.is_empty() {
                    text = contract_date(&text).ok_or_else(|| fail("not a YYYY-MM-DD date".into()))?;
                }
                if let Some(ch) = text.chars().find(|c| u32::from(*c) > 0xFF) {
                    return Err(fail(format!("character {ch:?} is not representable in Latin-1")));
                }
                let len = text.chars().count();
                if len > width {
                    return Err(fail(format!("{len} characters do not fit in width {width}")));
                }
                format!("{text:<width$}")
            }
            FieldKind::Integer => {
                if is_empty_text(value) {
                    return Ok(None);
                }
                let i = value.as_i64().ok_or_else(|| fail("not an integer".into()))?;
                format!("{i:0width$}")
            }
            FieldKind::Importe => {
                if is_empty_text(value) {
                    return Ok(None);
                }
                let amount = value.as_decimal().ok_or_else(|| fail("not an amount".into()))?;
                let mut scaled =
                    amount.round_dp_with_strategy(field.scale, RoundingStrategy::MidpointAwayFromZero);
                scaled.rescale(field.scale);
                format!("{:0width$}", scaled.mantissa())
            }
        };

        if field.kind != FieldKind::Alphanumeric && slot.len() > width {
            return Err(fail(format!("{} digits do not fit in width {width}", slot.len())));
        }
        Ok(Some(slot))
    }

    fn is_date_field(&self, field: &FieldSpec) -> bool {
        field.kind == FieldKind::Alphanumeric
            && field.width <= 8
            && field
                .name
                .to_lowercase()
                .starts_with(&self.config.date_prefix.to_lowercase())
    }
}

fn is_null_slot(raw: &str, width: usize) -> bool {
    if raw.chars().count() == width && raw.chars().all(|c| c == LEGACY_NULL_FILL) {
        return true;
    }
    let trimmed = raw.trim_end_matches(' ');
    !trimmed.is_empty() && trimmed.chars().all(|c| NULL_MARKERS.contains(&c))
}

fn decode_importe(field: &FieldSpec, offset: usize, text: &str) -> Result<Value, FieldDecodeError> {
    let invalid = |reason: String| FieldDecodeError::new(field.name, offset, text, reason);
    if text.is_empty() {
        return Decimal::try_from_i128_with_scale(0, field.scale)
            .map(Value::Decimal)
            .map_err(|e| invalid(e.to_string()));
    }

    if text.contains('.') {
        return Decimal::from_str(text)
            .map(Value::Decimal)
            .map_err(|e| invalid(e.to_string()));
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("not a number".into()));
    }
    let mantissa: i128 = digits.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    let mantissa = if negative { -mantissa } else { mantissa };
    Decimal::try_from_i128_with_scale(mantissa, field.scale)
        .map(Value::Decimal)
        .map_err(|e| invalid(e.to_string()))
}

fn expand_date(field: &FieldSpec, offset: usize, text: &str) -> Result<Value, FieldDecodeError> {
    if text.is_empty() {
        return Ok(Value::Null);
    }
    NaiveDate::parse_from_str(text, "%Y%m%d")
        .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
        .map_err(|e| FieldDecodeError::new(field.name, offset, text, format!("invalid date: {e}")))
}

fn contract_date(text: &str) -> Option<String> {
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d.format("%Y%m%d").to_string());
    }
    // Already contracted.
    (text.len() == 8 && NaiveDate::parse_from_str(text, "%Y%m%d").is_ok()).then(|| text.to_string())
}

fn normalize_line_breaks(text: &str) -> String {
    let placeholder = LINE_BREAK_PLACEHOLDER.to_string();
    text.replace("\r\n", &placeholder)
        .replace("\n\r", &placeholder)
        .replace(['\n', '\r'], &placeholder)
}

fn is_empty_text(value: &Value) -> bool {
    matches!(value, Value::Text(s) if s.trim().is_empty())
}

/// Looks up `name`, preferring a capitalised key (`Dato_adicional1`) when present.
fn lookup<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
    let mut chars = name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    if capitalized != name {
        if let Some(value) = record.get(&capitalized) {
            return Some(value);
        }
    }
    record.get(name)
}

/// Indices of slots whose name is re-used by a later alias field.
fn superseded_slots(schema: &FieldSchema) -> HashSet<usize> {
    let fields = schema.fields();
    (0..fields.len())
        .filter(|&i| {
            fields[i + 1..]
                .iter()
                .any(|later| later.alias && later.name == fields[i].name)
        })
        .collect()
}
