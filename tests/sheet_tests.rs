#![cfg(feature = "sheet")]

use rece_formats::core::*;
use rece_formats::sheet::*;
use rust_decimal_macros::dec;

const PLANILLA: &str = "\
id;tipo_cbte;punto_vta;cbt_numero;fecha_cbte;nombre;imp_total;codigo1;descripcion1;cantidad1;precio1;codigo2;descripcion2;cantidad2;precio2;iva_id_1;iva_base_imp_1;iva_importe_1;observaciones
1;6;5;101;20240615;Consumidor Final;121.00;A1;Lapicera;1;100.00;;;;;5;100.00;21.00;sin cargo
2;6;5;102;20240616;Otro Cliente;60.50;B2;Cuaderno;2;25.00;B3;Goma;0;0.00;;;;
";

#[test]
fn csv_to_invoices() {
    let table = read_csv(PLANILLA.as_bytes()).unwrap();
    assert_eq!(table.len(), 2);

    let invoices = TabularFlattener::default().unflatten(&table).unwrap();
    assert_eq!(invoices.len(), 2);

    let first = &invoices[0];
    assert_eq!(first.header.get("cbte_nro"), Some(&Value::from("101")));
    assert_eq!(first.detalles.len(), 1);
    assert_eq!(first.detalles[0].get("ds"), Some(&Value::from("Lapicera")));
    assert_eq!(first.ivas.len(), 1);
    assert_eq!(first.ivas[0].get("base_imp"), Some(&Value::from("100.00")));
    assert_eq!(first.datos, vec![Dato::new("observaciones", "sin cargo")]);

    let second = &invoices[1];
    assert_eq!(second.detalles.len(), 2);
    assert!(second.ivas.is_empty());
    assert!(second.datos.is_empty());
}

#[test]
fn comma_delimited_sheets_are_detected() {
    let text = "cbt_numero,codigo1,cantidad1\n7,X,3\n";
    let table = read_csv(text.as_bytes()).unwrap();
    assert_eq!(table.header, vec!["cbt_numero", "codigo1", "cantidad1"]);
    let invoices = TabularFlattener::default().unflatten(&table).unwrap();
    assert_eq!(invoices[0].detalles[0].get("qty"), Some(&Value::from("3")));
}

#[test]
fn invoices_to_csv() {
    let mut inv = NestedInvoice::new(
        Record::new()
            .with("cbte_nro", 7)
            .with("nombre", "Cliente; con punto y coma")
            .with("imp_total", dec!(121.00)),
    );
    inv.detalles.push(Record::new().with("codigo", "A").with("qty", 1));

    let table = TabularFlattener::default().flatten(&[inv]);
    let mut out = Vec::new();
    write_csv(&table, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("id;tipo_cbte;punto_vta;cbt_numero;"));
    let row = lines.next().unwrap();
    assert!(row.contains("\"Cliente; con punto y coma\""));
    assert!(row.contains(";121.00;"));
    assert!(lines.next().is_none());
}

#[test]
fn csv_round_trip_keeps_cells_as_text() {
    let table = read_csv(PLANILLA.as_bytes()).unwrap();
    let mut out = Vec::new();
    write_csv(&table, &mut out).unwrap();
    let again = read_csv(out.as_slice()).unwrap();
    assert_eq!(again, table);
}

#[test]
fn unflatten_then_flatten_restores_known_cells() {
    let flattener = TabularFlattener::default();
    let table = read_csv(PLANILLA.as_bytes()).unwrap();
    let flat = flattener.flatten(&flattener.unflatten(&table).unwrap());
    assert_eq!(flat.cell(0, "cbt_numero"), Some(&Value::from("101")));
    assert_eq!(flat.cell(0, "precio1"), Some(&Value::from("100.00")));
    assert_eq!(flat.cell(1, "codigo2"), Some(&Value::from("B3")));
    assert_eq!(flat.cell(0, "observaciones"), Some(&Value::from("sin cargo")));
}

#[test]
fn latin1_sheets_are_read() {
    let mut bytes = b"cbt_numero;nombre;descripcion1;cantidad1\n9;".to_vec();
    bytes.extend_from_slice(&[0xD1, b'a', b'n', b'd', 0xFA]);
    bytes.extend_from_slice(b" SRL;Caf\xE9;1\n");

    let table = read_csv(bytes.as_slice()).unwrap();
    assert_eq!(table.cell(0, "nombre"), Some(&Value::from("Ñandú SRL")));

    let invoices = TabularFlattener::default().unflatten(&table).unwrap();
    assert_eq!(invoices[0].detalles[0].get("ds"), Some(&Value::from("Café")));
}

#[test]
fn latin1_write_round_trip() {
    let inv = NestedInvoice::new(Record::new().with("cbte_nro", 3).with("nombre", "Peña"));
    let table = TabularFlattener::default().flatten(&[inv]);

    let mut out = Vec::new();
    write_csv_encoded(&table, &mut out, SheetEncoding::Latin1).unwrap();
    assert!(String::from_utf8(out.clone()).is_err());
    assert!(out.windows(4).any(|w| w == b"Pe\xF1a"));

    let again = read_csv(out.as_slice()).unwrap();
    assert_eq!(again.cell(0, "nombre"), Some(&Value::from("Peña")));
}
