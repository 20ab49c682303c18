//! Multi-record TXT files: one header line followed by its child lines.

use crate::core::{Dato, FormatError, NestedInvoice, Record, RecordCodec};

use super::layouts::{DATO, ENCABEZADO, RecordType};

/// A line that could not be turned into part of an invoice.
#[derive(Debug)]
pub struct LineFailure {
    /// 1-based line number.
    pub line: usize,
    pub error: FormatError,
}

/// Outcome of reading a TXT file.
#[derive(Debug, Default)]
pub struct TxtBatch {
    /// Invoices, in file order.
    pub invoices: Vec<NestedInvoice>,
    /// Lines that were skipped, with the reason.
    pub failures: Vec<LineFailure>,
}

impl TxtBatch {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse a TXT file into invoices.
///
/// A bad line does not abort the batch: it is recorded in
/// [`TxtBatch::failures`] and reading continues. Child lines after a header
/// that failed to decode are reported as orphans.
pub fn read_txt(text: &str, codec: &RecordCodec) -> TxtBatch {
    let mut batch = TxtBatch::default();
    let mut current: Option<NestedInvoice> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        match read_line(line, codec, &mut current, &mut batch.invoices) {
            Ok(()) => {}
            Err(error) => {
                tracing::warn!(line = line_no, error = %error, "TXT line skipped");
                batch.failures.push(LineFailure {
                    line: line_no,
                    error,
                });
            }
        }
    }

    if let Some(invoice) = current.take() {
        batch.invoices.push(invoice);
    }
    batch
}

fn read_line(
    line: &str,
    codec: &RecordCodec,
    current: &mut Option<NestedInvoice>,
    done: &mut Vec<NestedInvoice>,
) -> Result<(), FormatError> {
    let first = line.chars().next().unwrap_or(' ');
    let record_type = RecordType::from_code(first).ok_or_else(|| {
        FormatError::SchemaMismatch(format!("unknown record type '{first}'"))
    })?;

    if record_type == RecordType::Encabezado {
        if let Some(invoice) = current.take() {
            done.push(invoice);
        }
        let header = decode(line, codec, record_type)?;
        *current = Some(NestedInvoice::new(header));
        return Ok(());
    }

    let invoice = current.as_mut().ok_or_else(|| {
        FormatError::SchemaMismatch(format!(
            "{} record without a preceding header",
            record_type.schema().name()
        ))
    })?;
    let record = decode(line, codec, record_type)?;
    match record_type.group() {
        Some(group) => invoice.group_mut(group).push(record),
        None => invoice.datos.push(record_to_dato(record)),
    }
    Ok(())
}

fn decode(line: &str, codec: &RecordCodec, record_type: RecordType) -> Result<Record, FormatError> {
    let mut record = codec.decode(line, record_type.schema())?;
    record.remove("tipo_reg");
    Ok(record)
}

fn record_to_dato(mut record: Record) -> Dato {
    let campo = record.remove("campo").map(|v| v.to_string()).unwrap_or_default();
    let valor = record.remove("valor").unwrap_or_default();
    let pagina = record
        .remove("pagina")
        .map(|v| v.to_string())
        .filter(|p| !p.is_empty());
    Dato {
        campo,
        valor,
        pagina,
    }
}

fn dato_to_record(dato: &Dato) -> Record {
    let mut record = Record::new()
        .with("tipo_reg", i64::from(RecordType::Dato.code()))
        .with("campo", dato.campo.as_str())
        .with("valor", dato.valor.clone());
    if let Some(pagina) = &dato.pagina {
        record.insert("pagina", pagina.as_str());
    }
    record
}

/// Write invoices as a TXT file, one newline-terminated line per record.
///
/// Fails only in strict mode, on the first field that does not fit.
pub fn write_txt(invoices: &[NestedInvoice], codec: &RecordCodec) -> Result<String, FormatError> {
    let mut out = String::new();
    for invoice in invoices {
        let mut header = invoice.header.clone();
        header.insert("tipo_reg", i64::from(RecordType::Encabezado.code()));
        if !header.contains_key("cbte_nro") {
            if let Some(numero) = header.get("cbt_numero").cloned() {
                header.insert("cbte_nro", numero);
            }
        }
        push_line(&mut out, codec.encode(&header, &ENCABEZADO)?);

        for record_type in RecordType::ALL {
            let Some(group) = record_type.group() else {
                continue;
            };
            for item in invoice.group(group) {
                let mut item = item.clone();
                item.insert("tipo_reg", i64::from(record_type.code()));
                push_line(&mut out, codec.encode(&item, record_type.schema())?);
            }
        }

        if !invoice.formas_pago.is_empty() {
            tracing::warn!(
                count = invoice.formas_pago.len(),
                "formas_pago have no TXT record type, skipped"
            );
        }

        for dato in &invoice.datos {
            push_line(&mut out, codec.encode(&dato_to_record(dato), &DATO)?);
        }
    }
    Ok(out)
}

fn push_line(out: &mut String, line: String) {
    out.push_str(&line);
    out.push('\n');
}
