use rece_formats::core::*;
use rece_formats::sheet::*;

const PLANILLA: &str = "\
tipo_cbte;punto_vta;cbt_numero;nombre;imp_total;codigo1;descripcion1;cantidad1;codigo2;descripcion2;cantidad2;iva_id_1;iva_importe_1;sucursal
6;5;101;Consumidor Final;121.00;A1;Lapicera;1;A2;Regla;2;5;21.00;Centro
6;5;102;Otro Cliente;60.50;B1;Cuaderno;1;;;;;;
";

fn main() {
    let table = read_csv(PLANILLA.as_bytes()).expect("CSV import failed");
    println!("=== Sheet: {} columns, {} rows ===", table.header.len(), table.len());

    let flattener = TabularFlattener::default();
    let invoices = match flattener.unflatten(&table) {
        Ok(invoices) => invoices,
        Err(e) => {
            println!("  Unflatten failed: {e}");
            return;
        }
    };
    for inv in &invoices {
        println!(
            "cbte {}: {} detail line(s), {} VAT line(s), {} extra value(s)",
            inv.header.get("cbte_nro").map(ToString::to_string).unwrap_or_default(),
            inv.detalles.len(),
            inv.ivas.len(),
            inv.datos.len()
        );
    }

    let mut out = Vec::new();
    write_csv_encoded(&flattener.flatten(&invoices), &mut out, SheetEncoding::Latin1)
        .expect("CSV export failed");
    println!("\nre-exported {} bytes as Latin-1", out.len());
}
