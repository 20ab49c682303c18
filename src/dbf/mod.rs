//! DBF-style table split of nested invoices.
//!
//! One logical table per record layout, with field names shortened to the
//! 10-character dBase limit. Child tables carry the header `id` as their
//! first column. Only the table model is produced here; writing the binary
//! `.dbf` container is left to the caller.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::{Dato, FieldKind, FieldSchema, FormatError, NestedInvoice, Record, Value};
use crate::txt::RecordType;

/// Longest dBase field name.
pub const MAX_NAME_LEN: usize = 10;
/// Character fields wider than this become memos.
pub const MAX_CHAR_WIDTH: usize = 250;
/// Widest numeric field.
pub const MAX_NUMERIC_WIDTH: usize = 17;

const ID_WIDTH: usize = 15;

const SPECIAL_NAMES: &[(&str, &str)] = &[
    ("Dato_adicional1", "datoadic01"),
    ("Dato_adicional2", "datoadic02"),
    ("Dato_adicional3", "datoadic03"),
    ("Dato_adicional4", "datoadic04"),
];

/// dBase column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DbfType {
    /// `C(n)`
    Character(usize),
    /// `N(n,d)`
    Numeric(usize, u32),
    /// `M`
    Memo,
}

impl fmt::Display for DbfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character(n) => write!(f, "C({n})"),
            Self::Numeric(n, d) => write!(f, "N({n},{d})"),
            Self::Memo => f.write_str("M"),
        }
    }
}

/// A column of a [`DbfTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbfField {
    /// Short dBase name.
    pub name: String,
    /// Record field it holds.
    pub source: &'static str,
    pub kind: DbfType,
}

impl fmt::Display for DbfField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.kind)
    }
}

/// One logical table: column definitions plus rows keyed by short name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfTable {
    /// File stem, at most 8 characters (`encabeza`, `detalle`, ...).
    pub name: &'static str,
    pub fields: Vec<DbfField>,
    pub rows: Vec<Record>,
}

/// Shorten a field name for dBase: special names first, otherwise
/// underscores removed, cut to 10 characters and lowercased. A name already
/// in `taken` gets its trailing characters replaced by a counter.
pub fn dbf_field_name(name: &str, taken: &HashSet<String>) -> String {
    let base = SPECIAL_NAMES
        .iter()
        .find(|(long, _)| *long == name)
        .map(|(_, short)| short.to_string())
        .unwrap_or_else(|| {
            name.chars()
                .filter(|c| *c != '_')
                .take(MAX_NAME_LEN)
                .collect::<String>()
                .to_lowercase()
        });
    if !taken.contains(&base) {
        return base;
    }
    (1usize..)
        .map(|n| {
            let suffix = n.to_string();
            let keep = MAX_NAME_LEN.saturating_sub(suffix.len());
            let stem: String = base.chars().take(keep).collect();
            format!("{stem}{suffix}")
        })
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

fn dbf_type(kind: FieldKind, width: usize, scale: u32) -> DbfType {
    if width > MAX_CHAR_WIDTH {
        return DbfType::Memo;
    }
    match kind {
        FieldKind::Alphanumeric => DbfType::Character(width),
        FieldKind::Integer => DbfType::Numeric(width.min(MAX_NUMERIC_WIDTH), 0),
        // room for the decimal point and the sign
        FieldKind::Importe => {
            let needed = (width + 1).max(scale as usize + 2);
            DbfType::Numeric(needed.min(MAX_NUMERIC_WIDTH), scale)
        }
    }
}

/// Column definitions for a fixed-width layout.
///
/// `tipo_reg` is dropped; an alias replaces the definition of the field it
/// shadows.
pub fn field_definitions(schema: &'static FieldSchema) -> Vec<DbfField> {
    let mut fields: Vec<DbfField> = Vec::new();
    let mut taken = HashSet::new();
    for spec in schema.fields() {
        if spec.name == "tipo_reg" {
            continue;
        }
        let kind = dbf_type(spec.kind, spec.width, spec.scale);
        if let Some(existing) = fields.iter_mut().find(|f| f.source == spec.name) {
            existing.kind = kind;
            continue;
        }
        let name = dbf_field_name(spec.name, &taken);
        taken.insert(name.clone());
        fields.push(DbfField {
            name,
            source: spec.name,
            kind,
        });
    }
    fields
}

fn child_field_definitions(schema: &'static FieldSchema) -> Vec<DbfField> {
    let mut fields = vec![DbfField {
        name: "id".into(),
        source: "id",
        kind: DbfType::Numeric(ID_WIDTH, 0),
    }];
    fields.extend(field_definitions(schema).into_iter().filter(|f| f.source != "id"));
    fields
}

fn table_name(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::Encabezado => "encabeza",
        RecordType::Detalle => "detalle",
        RecordType::Permiso => "permiso",
        RecordType::CmpAsoc => "comproba",
        RecordType::Iva => "iva",
        RecordType::Tributo => "tributo",
        RecordType::Opcional => "opcional",
        RecordType::Dato => "dato",
    }
}

fn coerce(value: Option<&Value>, field: &DbfField) -> Value {
    let value = value.filter(|v| !v.is_null() && v.as_str() != Some(""));
    match field.kind {
        DbfType::Memo => Value::from(value.map(Value::to_string).unwrap_or_default()),
        DbfType::Character(width) => {
            let text = value.map(Value::to_string).unwrap_or_default();
            Value::from(text.chars().take(width).collect::<String>())
        }
        DbfType::Numeric(_, 0) => {
            let n = value.and_then(|v| {
                let n = v.as_i64();
                if n.is_none() {
                    tracing::warn!(field = field.source, value = %v, "not a number, stored as 0");
                }
                n
            });
            Value::Integer(n.unwrap_or(0))
        }
        DbfType::Numeric(_, scale) => {
            let d = value.and_then(|v| {
                let d = v.as_decimal();
                if d.is_none() {
                    tracing::warn!(field = field.source, value = %v, "not an amount, stored as 0");
                }
                d
            });
            let mut d = d.map_or(Decimal::ZERO, |d| d.round_dp(scale));
            d.rescale(scale);
            Value::Decimal(d)
        }
    }
}

fn to_row(record: &Record, fields: &[DbfField]) -> Record {
    fields
        .iter()
        .map(|f| (f.name.clone(), coerce(record.get(f.source), f)))
        .collect()
}

fn dato_record(dato: &Dato) -> Record {
    let mut record = Record::new()
        .with("campo", dato.campo.as_str())
        .with("valor", dato.valor.clone());
    if let Some(pagina) = &dato.pagina {
        record.insert("pagina", pagina.as_str());
    }
    record
}

/// Split invoices into one table per layout, in [`RecordType::ALL`] order.
///
/// Invoices without a numeric `id` are numbered by position (1-based).
pub fn to_tables(invoices: &[NestedInvoice]) -> Vec<DbfTable> {
    let mut tables: Vec<DbfTable> = RecordType::ALL
        .into_iter()
        .map(|record_type| DbfTable {
            name: table_name(record_type),
            fields: match record_type {
                RecordType::Encabezado => field_definitions(record_type.schema()),
                _ => child_field_definitions(record_type.schema()),
            },
            rows: Vec::new(),
        })
        .collect();

    for (pos, invoice) in invoices.iter().enumerate() {
        let id = match invoice.header.get("id").and_then(Value::as_i64) {
            Some(id) => id,
            None => {
                let id = pos as i64 + 1;
                tracing::debug!(id, "invoice without id, numbered by position");
                id
            }
        };

        for (record_type, table) in RecordType::ALL.into_iter().zip(tables.iter_mut()) {
            let records: Vec<Record> = match record_type {
                RecordType::Encabezado => vec![invoice.header.clone()],
                RecordType::Dato => invoice.datos.iter().map(dato_record).collect(),
                _ => record_type
                    .group()
                    .map(|g| invoice.group(g).to_vec())
                    .unwrap_or_default(),
            };
            for mut record in records {
                record.insert("id", id);
                table.rows.push(to_row(&record, &table.fields));
            }
        }
    }
    tables
}

fn from_row(row: &Record, fields: &[DbfField]) -> Record {
    fields
        .iter()
        .filter_map(|f| row.get(&f.name).map(|v| (f.source, v.clone())))
        .collect()
}

fn row_id(row: &Record, table: &str) -> Result<i64, FormatError> {
    row.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| FormatError::SchemaMismatch(format!("{table}: row without a numeric id")))
}

/// Rebuild invoices from tables produced by [`to_tables`].
///
/// Invoices come out in header-table order; child rows are attached by `id`.
pub fn from_tables(tables: &[DbfTable]) -> Result<Vec<NestedInvoice>, FormatError> {
    let header_name = table_name(RecordType::Encabezado);
    let header_table = tables
        .iter()
        .find(|t| t.name == header_name)
        .ok_or_else(|| FormatError::SchemaMismatch(format!("missing table '{header_name}'")))?;

    let mut invoices = Vec::with_capacity(header_table.rows.len());
    let mut by_id: HashMap<i64, usize> = HashMap::new();
    for row in &header_table.rows {
        let id = row_id(row, header_name)?;
        if by_id.insert(id, invoices.len()).is_some() {
            return Err(FormatError::SchemaMismatch(format!(
                "{header_name}: duplicate id {id}"
            )));
        }
        invoices.push(NestedInvoice::new(from_row(row, &header_table.fields)));
    }

    for table in tables.iter().filter(|t| t.name != header_name) {
        let Some(record_type) = RecordType::ALL
            .into_iter()
            .find(|rt| table_name(*rt) == table.name)
        else {
            tracing::warn!(table = table.name, "unknown table, skipped");
            continue;
        };
        for row in &table.rows {
            let id = row_id(row, table.name)?;
            let index = *by_id.get(&id).ok_or_else(|| {
                FormatError::SchemaMismatch(format!("{}: id {id} matches no header", table.name))
            })?;
            let mut record = from_row(row, &table.fields);
            record.remove("id");
            let invoice = &mut invoices[index];
            match record_type.group() {
                Some(group) => invoice.group_mut(group).push(record),
                None => invoice.datos.push(record_dato(record)),
            }
        }
    }
    Ok(invoices)
}

fn record_dato(mut record: Record) -> Dato {
    Dato {
        campo: record.remove("campo").map(|v| v.to_string()).unwrap_or_default(),
        valor: record.remove("valor").unwrap_or_default(),
        pagina: record
            .remove("pagina")
            .map(|v| v.to_string())
            .filter(|p| !p.is_empty()),
    }
}
