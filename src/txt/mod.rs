//! SIAP-RECE style TXT interchange files.
//!
//! Each line is one fixed-width record whose first character is its type:
//! `0` header, `1` line item, `2` export permit, `3` associated document,
//! `4` VAT, `5` other tax, `6` optional datum, `9` extra datum. Files are
//! ISO-8859-1; use [`decode_latin1`] and [`encode_latin1`] at the byte
//! boundary.
//!
//! # Example
//!
//! ```
//! use rece_formats::core::{NestedInvoice, Record, RecordCodec};
//! use rece_formats::txt::{read_txt, write_txt};
//!
//! let codec = RecordCodec::default();
//! let mut invoice = NestedInvoice::new(Record::new().with("cbte_nro", 7).with("id", 1));
//! invoice.ivas.push(Record::new().with("iva_id", 5));
//!
//! let text = write_txt(&[invoice], &codec).unwrap();
//! let batch = read_txt(&text, &codec);
//! assert!(batch.is_clean());
//! assert_eq!(batch.invoices[0].ivas.len(), 1);
//! ```

mod file;
mod layouts;

pub use crate::latin1::{decode_latin1, encode_latin1};
pub use file::{LineFailure, TxtBatch, read_txt, write_txt};
pub use layouts::{
    CMP_ASOC, DATO, DETALLE, ENCABEZADO, IVA, OPCIONAL, PERMISO, RecordType, TRIBUTO, layout_help,
};
