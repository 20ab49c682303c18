//! Delimited spreadsheet (CSV) import and export of [`FlatTable`]s.
//!
//! Files are read with either `;` or `,` as delimiter, detected from the
//! first bytes; files are always written with `;`. Input that is not valid
//! UTF-8 is read as ISO-8859-1, the charset legacy RECE tools export.
//!
//! # Example
//!
//! ```
//! use rece_formats::core::{FlatTable, Value};
//! use rece_formats::sheet::{read_csv, write_csv};
//!
//! let text = "cbt_numero,imp_total\n 1 ,121.00\n2,\n";
//! let table = read_csv(text.as_bytes()).unwrap();
//! assert_eq!(table.cell(0, "cbt_numero"), Some(&Value::from("1")));
//! assert_eq!(table.cell(1, "imp_total"), Some(&Value::Null));
//!
//! let mut out = Vec::new();
//! write_csv(&table, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "cbt_numero;imp_total\n1;121.00\n2;\n");
//! ```

use std::collections::HashSet;
use std::fmt::Display;
use std::io::{Read, Write};

use csv::{ReaderBuilder, WriterBuilder};

use crate::core::{FlatTable, FormatError, Value};
use crate::latin1::{decode_utf8_or_latin1, encode_latin1};

/// Number of leading characters inspected by [`sniff_delimiter`].
pub const SNIFF_LEN: usize = 256;

/// Delimiter used when writing.
pub const OUTPUT_DELIMITER: u8 = b';';

/// Character set of a written sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1; text outside it is an [`FormatError::Encoding`].
    Latin1,
}

fn csv_err(e: impl Display) -> FormatError {
    FormatError::Csv(e.to_string())
}

/// Guess the delimiter of a sheet: `;` or `,`, whichever is more frequent
/// in the first [`SNIFF_LEN`] characters outside quotes. Ties pick `;`.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let mut in_quotes = false;
    let (mut semicolons, mut commas) = (0usize, 0usize);
    for c in sample.chars().take(SNIFF_LEN) {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => semicolons += 1,
            ',' if !in_quotes => commas += 1,
            _ => {}
        }
    }
    if commas > semicolons { b',' } else { b';' }
}

/// Read a sheet whose first row holds the column names.
///
/// Cells are trimmed; empty cells become [`Value::Null`], everything else
/// [`Value::Text`]. Short rows are padded with nulls and long rows truncated
/// to the header width. Rows with no data at all are skipped.
pub fn read_csv<R: Read>(mut reader: R) -> Result<FlatTable, FormatError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(csv_err)?;
    let text = decode_utf8_or_latin1(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let delimiter = sniff_delimiter(text);

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = rdr.records();

    let header: Vec<String> = match records.next() {
        Some(first) => first.map_err(csv_err)?.iter().map(|c| c.trim().to_string()).collect(),
        None => return Ok(FlatTable::default()),
    };
    let mut seen = HashSet::new();
    if let Some(dup) = header.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(FormatError::SchemaMismatch(format!("duplicate column '{dup}'")));
    }

    let width = header.len();
    let mut table = FlatTable::new(header);
    for (idx, record) in records.enumerate() {
        let record = record.map_err(csv_err)?;
        let mut row: Vec<Value> = record
            .iter()
            .map(|cell| match cell.trim() {
                "" => Value::Null,
                text => Value::from(text),
            })
            .collect();
        if row.iter().all(Value::is_null) {
            continue;
        }
        if row.len() > width {
            tracing::warn!(
                row = idx + 2,
                cells = row.len(),
                columns = width,
                "row longer than header, extra cells dropped"
            );
        }
        row.resize(width, Value::Null);
        table.push_row(row)?;
    }
    Ok(table)
}

/// Write a UTF-8 sheet with a header row, `;` delimited; nulls are empty cells.
pub fn write_csv<W: Write>(table: &FlatTable, writer: W) -> Result<(), FormatError> {
    write_records(table, writer)
}

/// Like [`write_csv`], in the given character set.
pub fn write_csv_encoded<W: Write>(
    table: &FlatTable,
    mut writer: W,
    encoding: SheetEncoding,
) -> Result<(), FormatError> {
    match encoding {
        SheetEncoding::Utf8 => write_records(table, writer),
        SheetEncoding::Latin1 => {
            let mut buf = Vec::new();
            write_records(table, &mut buf)?;
            let text = String::from_utf8(buf).map_err(csv_err)?;
            writer.write_all(&encode_latin1(&text)?).map_err(csv_err)
        }
    }
}

fn write_records<W: Write>(table: &FlatTable, writer: W) -> Result<(), FormatError> {
    let mut wtr = WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .from_writer(writer);
    wtr.write_record(&table.header).map_err(csv_err)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))
            .map_err(csv_err)?;
    }
    wtr.flush().map_err(csv_err)
}
