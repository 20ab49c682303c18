use thiserror::Error;

/// Errors that can occur while decoding, encoding or reshaping records.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// A fixed-width field could not be parsed as its declared kind.
    #[error(transparent)]
    FieldDecode(#[from] FieldDecodeError),

    /// A field could not be rendered into its slot (strict mode only).
    #[error("encode error: {0}")]
    FieldEncode(FieldEncodeWarning),

    /// A flat table or a set of tables does not have the expected shape.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A field schema is malformed.
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Text cannot be represented in the single-byte interchange charset.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(String),
}

/// A single fixed-width field whose raw text does not match its kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error reading field {field} at offset {offset} (value '{raw}'): {reason}")]
pub struct FieldDecodeError {
    /// Field name from the schema.
    pub field: String,
    /// Zero-based character offset of the field within the line.
    pub offset: usize,
    /// Raw slice taken from the line (trimmed).
    pub raw: String,
    /// Human-readable description of the failure.
    pub reason: String,
}

impl FieldDecodeError {
    pub(crate) fn new(
        field: impl Into<String>,
        offset: usize,
        raw: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            offset,
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

/// A field that could not be written into its slot.
///
/// In lenient mode these are collected and logged, and the slot stays blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEncodeWarning {
    /// Field name from the schema.
    pub field: String,
    /// Zero-based character offset of the slot.
    pub offset: usize,
    /// The value as text, for diagnostics.
    pub value: String,
    /// Human-readable description of the failure.
    pub reason: String,
}

impl std::fmt::Display for FieldEncodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot write field {} at offset {} (value '{}'): {}",
            self.field, self.offset, self.value, self.reason
        )
    }
}

impl FieldEncodeWarning {
    pub(crate) fn new(
        field: impl Into<String>,
        offset: usize,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            offset,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
