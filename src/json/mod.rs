//! JSON import/export of nested invoices.
//!
//! Output is a pretty-printed array with sorted keys and four-space
//! indentation. Amounts are written as strings, so a
//! [`Value::Decimal`](crate::core::Value::Decimal) reads back as text;
//! JSON integers read back as [`Value::Integer`](crate::core::Value::Integer)
//! and other numbers as decimals.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::core::{FormatError, NestedInvoice};

fn json_err(e: serde_json::Error) -> FormatError {
    FormatError::Json(e.to_string())
}

/// Serialize invoices as a JSON array.
pub fn to_json(invoices: &[NestedInvoice]) -> Result<String, FormatError> {
    // Going through `serde_json::Value` sorts object keys.
    let value = serde_json::to_value(invoices).map_err(json_err)?;
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser).map_err(json_err)?;
    String::from_utf8(buf).map_err(|e| FormatError::Json(format!("UTF-8 error: {e}")))
}

/// Parse a JSON array of invoices, or a single invoice object.
pub fn from_json(text: &str) -> Result<Vec<NestedInvoice>, FormatError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(json_err)?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(json_err),
        serde_json::Value::Object(_) => {
            serde_json::from_value(value).map(|inv| vec![inv]).map_err(json_err)
        }
        other => Err(FormatError::Json(format!(
            "expected an array or an object, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dato, Record, Value};
    use rust_decimal::Decimal;

    #[test]
    fn keys_are_sorted() {
        let inv = NestedInvoice::new(Record::new().with("zona", "x").with("cae", "123"));
        let text = to_json(&[inv]).unwrap();
        let cae = text.find("\"cae\"").unwrap();
        let zona = text.find("\"zona\"").unwrap();
        let detalles = text.find("\"detalles\"").unwrap();
        assert!(cae < detalles && detalles < zona);
        assert!(text.contains("\n        \"cae\""));
    }

    #[test]
    fn value_kinds_on_read() {
        let invs = from_json(
            r#"{"cbte_nro": 7, "imp_total": 121.5, "nombre": "ACME", "cae": null,
                "datos": [{"campo": "obs", "valor": "ok"}]}"#,
        )
        .unwrap();
        let header = &invs[0].header;
        assert_eq!(header.get("cbte_nro"), Some(&Value::Integer(7)));
        assert_eq!(header.get("imp_total"), Some(&Value::Decimal(Decimal::new(1215, 1))));
        assert_eq!(header.get("nombre"), Some(&Value::from("ACME")));
        assert_eq!(header.get("cae"), Some(&Value::Null));
        assert_eq!(invs[0].datos, vec![Dato::new("obs", "ok")]);
        assert!(invs[0].detalles.is_empty());
    }

    #[test]
    fn decimals_are_strings() {
        let inv = NestedInvoice::new(Record::new().with("imp_total", Decimal::new(12100, 2)));
        let text = to_json(&[inv]).unwrap();
        assert!(text.contains("\"imp_total\": \"121.00\""));
    }

    #[test]
    fn rejects_scalars() {
        assert!(matches!(from_json("42"), Err(FormatError::Json(_))));
        assert!(matches!(from_json("[1"), Err(FormatError::Json(_))));
    }
}
