//! Declarative fixed-width record layouts.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::FormatError;

/// Field data type, as used by the RG 1361 / SIAP-RECE formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Left-justified, space-padded text.
    Alphanumeric,
    /// Zero-padded integer.
    Integer,
    /// Zero-padded fixed-point amount with an implied decimal point.
    Importe,
}

impl FieldKind {
    /// Short label used by layout listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Alphanumeric => "Alfanumerico",
            Self::Integer => "Numerico",
            Self::Importe => "Importe",
        }
    }
}

/// One field of a fixed-width layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Field name (record key).
    pub name: &'static str,
    /// Width in characters.
    pub width: usize,
    /// Data type.
    pub kind: FieldKind,
    /// Decimal digits for [`FieldKind::Importe`]; ignored otherwise.
    pub scale: u32,
    /// Intentional re-use of an earlier field name: the later slot wins on decode.
    pub alias: bool,
}

impl FieldSpec {
    /// Default number of decimals for amounts.
    pub const DEFAULT_SCALE: u32 = 2;
    /// Largest scale a decimal amount can carry.
    pub const MAX_SCALE: u32 = 28;

    pub const fn alpha(name: &'static str, width: usize) -> Self {
        Self {
            name,
            width,
            kind: FieldKind::Alphanumeric,
            scale: 0,
            alias: false,
        }
    }

    pub const fn int(name: &'static str, width: usize) -> Self {
        Self {
            name,
            width,
            kind: FieldKind::Integer,
            scale: 0,
            alias: false,
        }
    }

    /// Amount with the default scale of 2.
    pub const fn importe(name: &'static str, width: usize) -> Self {
        Self::importe_scaled(name, width, Self::DEFAULT_SCALE)
    }

    pub const fn importe_scaled(name: &'static str, width: usize, scale: u32) -> Self {
        Self {
            name,
            width,
            kind: FieldKind::Importe,
            scale,
            alias: false,
        }
    }

    /// Mark this field as an intentional duplicate of an earlier one.
    pub const fn alias(mut self) -> Self {
        self.alias = true;
        self
    }
}

/// A non-fatal observation about a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLint {
    /// Field name the lint refers to.
    pub field: String,
    /// Description.
    pub message: String,
}

impl std::fmt::Display for SchemaLint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// An ordered, immutable list of [`FieldSpec`]s describing one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    name: &'static str,
    fields: Cow<'static, [FieldSpec]>,
}

impl FieldSchema {
    /// Schema over a static field table (usable in `const` items).
    pub const fn from_static(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            name,
            fields: Cow::Borrowed(fields),
        }
    }

    /// Schema over an owned field list.
    pub fn new(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name,
            fields: Cow::Owned(fields),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Exact line length of a record: the sum of all widths.
    pub fn total_width(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// Fields paired with their zero-based start offset.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, &FieldSpec)> {
        self.fields.iter().scan(0usize, |offset, field| {
            let start = *offset;
            *offset += field.width;
            Some((start, field))
        })
    }

    /// Look up the first field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Reject layouts the codec cannot handle faithfully.
    pub fn validate(&self) -> Result<(), FormatError> {
        let mut seen = HashSet::new();
        for (offset, field) in self.offsets() {
            if field.width == 0 {
                return Err(FormatError::Schema(format!(
                    "{}: field {} at offset {offset} has zero width",
                    self.name, field.name
                )));
            }
            if field.kind == FieldKind::Importe && field.scale > FieldSpec::MAX_SCALE {
                return Err(FormatError::Schema(format!(
                    "{}: amount field {} has scale {}, at most {} is supported",
                    self.name,
                    field.name,
                    field.scale,
                    FieldSpec::MAX_SCALE
                )));
            }
            if field.kind == FieldKind::Importe && field.scale as usize >= field.width {
                return Err(FormatError::Schema(format!(
                    "{}: amount field {} has scale {} but width {}",
                    self.name, field.name, field.scale, field.width
                )));
            }
            if !seen.insert(field.name) && !field.alias {
                return Err(FormatError::Schema(format!(
                    "{}: duplicate field {} at offset {offset} (mark it as an alias)",
                    self.name, field.name
                )));
            }
        }
        Ok(())
    }

    /// Non-fatal findings, e.g. aliases that shadow nothing.
    pub fn lint(&self) -> Vec<SchemaLint> {
        let mut lints = Vec::new();
        let mut seen = HashSet::new();
        for field in self.fields.iter() {
            if field.alias && !seen.contains(field.name) {
                lints.push(SchemaLint {
                    field: field.name.to_string(),
                    message: format!("alias in {} has no earlier field to override", self.name),
                });
            }
            if field.kind != FieldKind::Importe && field.scale != 0 {
                lints.push(SchemaLint {
                    field: field.name.to_string(),
                    message: "scale is ignored for non-amount fields".into(),
                });
            }
            seen.insert(field.name);
        }
        lints
    }
}
