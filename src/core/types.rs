use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::columns::GroupKind;
use super::error::FormatError;

/// A typed cell or field value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value {
    /// Missing value (absent cell, legacy null marker).
    #[default]
    Null,
    /// Alphanumeric text.
    Text(String),
    /// Integer (`Numerico`) value.
    Integer(i64),
    /// Fixed-point amount (`Importe`).
    Decimal(Decimal),
}

impl Value {
    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `true` for values that carry no data: null, empty text, `0`, `0.00`.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::Integer(i) => *i == 0,
            Self::Decimal(d) => d.is_zero(),
        }
    }

    /// Borrow the text, if this is a [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view: integers, whole decimals and numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Decimal(d) if d.fract().is_zero() => i64::try_from(d.trunc()).ok(),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Decimal view: decimals, integers and numeric text.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// Decimals travel as strings, like every other monetary value in the crate.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Decimal(d) => serializer.serialize_str(&d.to_string()),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, a string, an integer or a number")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Integer(i64::from(b)))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Integer(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        i64::try_from(u)
            .map(Value::Integer)
            .map_err(|_| E::custom(format!("integer {u} out of range")))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Decimal::from_f64(f)
            .map(|d| Value::Decimal(d.normalize()))
            .ok_or_else(|| E::custom(format!("number {f} is not representable as a decimal")))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Text(s))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// A decoded fixed-width line or one business object: field name → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` when every value is blank (see [`Value::is_blank`]).
    pub fn is_blank(&self) -> bool {
        self.0.values().all(Value::is_blank)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Free-form extra data attached to an invoice (`campo` = `valor`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dato {
    /// Field name.
    pub campo: String,
    /// Field value.
    pub valor: Value,
    /// Page selector used by printed formats (`P`, `U`, `T`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagina: Option<String>,
}

impl Dato {
    pub fn new(campo: impl Into<String>, valor: impl Into<Value>) -> Self {
        Self {
            campo: campo.into(),
            valor: valor.into(),
            pagina: None,
        }
    }
}

/// An invoice: header fields plus its repeating groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedInvoice {
    /// Header (encabezado) fields.
    #[serde(flatten)]
    pub header: Record,
    /// Line items.
    #[serde(default)]
    pub detalles: Vec<Record>,
    /// VAT subtotals.
    #[serde(default)]
    pub ivas: Vec<Record>,
    /// Other taxes.
    #[serde(default)]
    pub tributos: Vec<Record>,
    /// Associated documents.
    #[serde(default)]
    pub cbtes_asoc: Vec<Record>,
    /// Export permits.
    #[serde(default)]
    pub permisos: Vec<Record>,
    /// Payment instruments.
    #[serde(default)]
    pub formas_pago: Vec<Record>,
    /// Optional web-service data.
    #[serde(default)]
    pub opcionales: Vec<Record>,
    /// Extra key/value pairs not covered by any layout.
    #[serde(default)]
    pub datos: Vec<Dato>,
}

impl NestedInvoice {
    pub fn new(header: Record) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    /// Items of one repeating group.
    pub fn group(&self, kind: GroupKind) -> &[Record] {
        match kind {
            GroupKind::Detalles => &self.detalles,
            GroupKind::Ivas => &self.ivas,
            GroupKind::Tributos => &self.tributos,
            GroupKind::CbtesAsoc => &self.cbtes_asoc,
            GroupKind::Permisos => &self.permisos,
            GroupKind::FormasPago => &self.formas_pago,
            GroupKind::Opcionales => &self.opcionales,
        }
    }

    /// Mutable items of one repeating group.
    pub fn group_mut(&mut self, kind: GroupKind) -> &mut Vec<Record> {
        match kind {
            GroupKind::Detalles => &mut self.detalles,
            GroupKind::Ivas => &mut self.ivas,
            GroupKind::Tributos => &mut self.tributos,
            GroupKind::CbtesAsoc => &mut self.cbtes_asoc,
            GroupKind::Permisos => &mut self.permisos,
            GroupKind::FormasPago => &mut self.formas_pago,
            GroupKind::Opcionales => &mut self.opcionales,
        }
    }
}

/// A spreadsheet-shaped table: column names plus positional rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTable {
    /// Distinct column names.
    pub header: Vec<String>,
    /// Data rows, each exactly `header.len()` cells long.
    pub rows: Vec<Vec<Value>>,
}

impl FlatTable {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Append a row, rejecting rows that do not match the header width.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), FormatError> {
        if row.len() != self.header.len() {
            return Err(FormatError::SchemaMismatch(format!(
                "row {} has {} cells, header has {} columns",
                self.rows.len() + 1,
                row.len(),
                self.header.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Cell of a row by column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("").is_blank());
        assert!(Value::Integer(0).is_blank());
        assert!(Value::Decimal(Decimal::new(0, 2)).is_blank());
        assert!(!Value::from("x").is_blank());
        assert!(!Value::Integer(3).is_blank());
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::from(" 42 ").as_i64(), Some(42));
        assert_eq!(Value::Decimal(Decimal::new(500, 2)).as_i64(), Some(5));
        assert_eq!(Value::Decimal(Decimal::new(550, 2)).as_i64(), None);
        assert_eq!(Value::from("12.5").as_decimal(), Some(Decimal::new(125, 1)));
        assert_eq!(Value::Null.as_decimal(), None);
    }

    #[test]
    fn push_row_checks_width() {
        let mut t = FlatTable::new(vec!["a".into(), "b".into()]);
        assert!(t.push_row(vec![Value::Null, Value::from("x")]).is_ok());
        assert!(matches!(
            t.push_row(vec![Value::Null]),
            Err(FormatError::SchemaMismatch(_))
        ));
        assert_eq!(t.cell(0, "b"), Some(&Value::from("x")));
    }

    #[test]
    fn group_accessors_match_fields() {
        let mut inv = NestedInvoice::default();
        inv.group_mut(GroupKind::Ivas)
            .push(Record::new().with("iva_id", 5));
        assert_eq!(inv.ivas.len(), 1);
        assert_eq!(inv.group(GroupKind::Ivas).len(), 1);
        assert!(inv.group(GroupKind::Detalles).is_empty());
    }
}
