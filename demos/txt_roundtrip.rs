use rece_formats::core::*;
use rece_formats::txt::*;
use rust_decimal_macros::dec;

fn main() {
    let mut invoice = NestedInvoice::new(
        Record::new()
            .with("id", 1)
            .with("tipo_cbte", 6)
            .with("punto_vta", 4002)
            .with("cbte_nro", 1501)
            .with("fecha_cbte", "20240615")
            .with("nombre_cliente", "Peña Hnos.")
            .with("imp_total", dec!(121.00))
            .with("moneda_id", "PES")
            .with("moneda_ctz", dec!(1)),
    );
    invoice.detalles.push(
        Record::new()
            .with("codigo", "P001")
            .with("ds", "Abono mensual")
            .with("qty", dec!(1))
            .with("precio", dec!(100))
            .with("importe", dec!(100))
            .with("iva_id", 5),
    );
    invoice.ivas.push(
        Record::new()
            .with("iva_id", 5)
            .with("base_imp", dec!(100))
            .with("importe", dec!(21)),
    );

    let codec = RecordCodec::default();
    let text = write_txt(&[invoice], &codec).expect("TXT export failed");
    println!("=== RECE TXT ===");
    for line in text.lines() {
        let head: String = line.chars().take(40).collect();
        println!("{head} ({} chars)", line.chars().count());
    }

    let bytes = encode_latin1(&text).expect("not Latin-1");
    println!("\n{} bytes on disk", bytes.len());

    let batch = read_txt(&decode_latin1(&bytes), &codec);
    println!("read back {} invoice(s), {} failure(s)", batch.invoices.len(), batch.failure_count());
    let header = &batch.invoices[0].header;
    for field in ["cbte_nro", "nombre_cliente", "imp_total"] {
        println!("  {field}: {}", header.get(field).map(ToString::to_string).unwrap_or_default());
    }
}
