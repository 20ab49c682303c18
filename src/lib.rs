//! # rece-formats
//!
//! Interchange formats for Argentine electronic invoices (RG 1361 / SIAP
//! RECE style): positional fixed-width text, delimited spreadsheets, JSON
//! and DBF-style tables, all converging on one nested invoice model.
//!
//! Amounts use [`rust_decimal::Decimal`]; no floating point on the wire.
//!
//! ## Quick Start
//!
//! ```rust
//! use rece_formats::core::*;
//!
//! const SCHEMA: FieldSchema = FieldSchema::from_static(
//!     "example",
//!     &[FieldSpec::alpha("codigo", 5), FieldSpec::importe("importe", 6)],
//! );
//! let codec = RecordCodec::default();
//!
//! let record = codec.decode("AB   012345", &SCHEMA).unwrap();
//! assert_eq!(record.get("codigo"), Some(&Value::from("AB")));
//! assert_eq!(codec.encode(&record, &SCHEMA).unwrap(), "AB   012345");
//!
//! let table = TabularFlattener::default().flatten(&[]);
//! assert!(table.header.contains(&"cbt_numero".to_string()));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Record model, fixed-width codec, column naming, flattening |
//! | `txt` | RECE text file layouts, multi-record reader and writer, Latin-1 |
//! | `sheet` | Delimited (CSV) spreadsheet import/export, UTF-8 or Latin-1 |
//! | `json` | JSON import/export of nested invoices |
//! | `dbf` | DBF-style table split with 10-character field names |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "txt")]
pub mod txt;

#[cfg(feature = "sheet")]
pub mod sheet;

#[cfg(feature = "json")]
pub mod json;

#[cfg(any(feature = "txt", feature = "sheet"))]
mod latin1;

#[cfg(feature = "dbf")]
pub mod dbf;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
