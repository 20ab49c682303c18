#![cfg(feature = "txt")]

use rece_formats::core::*;
use rece_formats::txt::*;
use rust_decimal_macros::dec;

fn invoice() -> NestedInvoice {
    let mut inv = NestedInvoice::new(
        Record::new()
            .with("id", 42)
            .with("webservice", "wsfev1")
            .with("fecha_cbte", "20240615")
            .with("tipo_cbte", 201)
            .with("punto_vta", 12345)
            .with("cbte_nro", 77)
            .with("nombre_cliente", "Ñandú Hnos. SRL")
            .with("imp_total", dec!(1210.00))
            .with("moneda_ctz", dec!(1.000000))
            .with("obs_generales", "linea 1\nlinea 2")
            .with("Dato_adicional1", "adicional"),
    );
    inv.detalles.push(
        Record::new()
            .with("codigo", "P001")
            .with("qty", dec!(2))
            .with("umed", 7)
            .with("precio", dec!(500))
            .with("importe", dec!(1000))
            .with("iva_id", 5)
            .with("ds", "Servicio mensual"),
    );
    inv.permisos.push(Record::new().with("id_permiso", "99999AAXX999999A").with("dst_merc", 225));
    inv.cbtes_asoc.push(
        Record::new()
            .with("cbte_tipo", 1)
            .with("cbte_punto_vta", 2)
            .with("cbte_nro", 1234)
            .with("cbte_fecha", 20240101),
    );
    inv.ivas.push(
        Record::new()
            .with("iva_id", 5)
            .with("base_imp", dec!(1000))
            .with("importe", dec!(210)),
    );
    inv.tributos.push(
        Record::new()
            .with("tributo_id", 99)
            .with("desc", "Impuesto municipal")
            .with("base_imp", dec!(100))
            .with("alic", dec!(1))
            .with("importe", dec!(1)),
    );
    inv.opcionales.push(Record::new().with("opcional_id", "2101").with("valor", "0123456789"));
    inv.datos.push(Dato {
        campo: "leyenda".into(),
        valor: Value::from("Gracias por su compra"),
        pagina: Some("U".into()),
    });
    inv
}

#[test]
fn line_widths_and_record_types() {
    let codec = RecordCodec::default();
    let text = write_txt(&[invoice()], &codec).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 8);

    let types: String = lines.iter().map(|l| l.chars().next().unwrap()).collect();
    assert_eq!(types, "01234569");
    assert_eq!(lines[0].chars().count(), ENCABEZADO.total_width());
    assert_eq!(lines[1].chars().count(), DETALLE.total_width());
    assert_eq!(lines[7].chars().count(), DATO.total_width());
    assert!(text.ends_with('\n'));
}

#[test]
fn write_then_read() {
    let codec = RecordCodec::default();
    let text = write_txt(&[invoice()], &codec).unwrap();
    let batch = read_txt(&text, &codec);
    assert!(batch.is_clean(), "{:?}", batch.failures);
    assert_eq!(batch.invoices.len(), 1);

    let inv = &batch.invoices[0];
    let h = &inv.header;
    assert!(!h.contains_key("tipo_reg"));
    assert_eq!(h.get("id"), Some(&Value::Integer(42)));
    assert_eq!(h.get("tipo_cbte"), Some(&Value::Integer(201)));
    assert_eq!(h.get("punto_vta"), Some(&Value::Integer(12345)));
    assert_eq!(h.get("cbte_nro"), Some(&Value::Integer(77)));
    assert_eq!(h.get("nombre_cliente"), Some(&Value::from("Ñandú Hnos. SRL")));
    assert_eq!(h.get("imp_total"), Some(&Value::Decimal(dec!(1210))));
    assert_eq!(h.get("moneda_ctz"), Some(&Value::Decimal(dec!(1))));
    assert_eq!(h.get("obs_generales"), Some(&Value::from("linea 1\nlinea 2")));
    assert_eq!(h.get("Dato_adicional1"), Some(&Value::from("adicional")));

    assert_eq!(inv.detalles.len(), 1);
    let d = &inv.detalles[0];
    assert_eq!(d.get("qty"), Some(&Value::Decimal(dec!(2))));
    assert_eq!(d.get("ds"), Some(&Value::from("Servicio mensual")));
    assert!(!d.contains_key("id"));

    assert_eq!(inv.permisos[0].get("dst_merc"), Some(&Value::Integer(225)));
    assert_eq!(inv.cbtes_asoc[0].get("cbte_fecha"), Some(&Value::Integer(20240101)));
    assert_eq!(inv.ivas[0].get("importe"), Some(&Value::Decimal(dec!(210))));
    assert_eq!(inv.tributos[0].get("desc"), Some(&Value::from("Impuesto municipal")));
    assert_eq!(inv.opcionales[0].get("valor"), Some(&Value::from("0123456789")));
    assert_eq!(
        inv.datos,
        vec![Dato {
            campo: "leyenda".into(),
            valor: Value::from("Gracias por su compra"),
            pagina: Some("U".into()),
        }]
    );
}

#[test]
fn alias_slots_carry_wide_values_without_warnings() {
    let mut header = invoice().header;
    header.insert("tipo_reg", 0);
    let report = RecordCodec::default().encode_report(&header, &ENCABEZADO).unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    // the narrow slot stays blank
    assert_eq!(&report.line[15..17], "  ");
}

#[test]
fn several_invoices_in_one_file() {
    let codec = RecordCodec::default();
    let mut second = NestedInvoice::new(Record::new().with("id", 43).with("cbte_nro", 78));
    second.ivas.push(Record::new().with("iva_id", 4));
    let text = write_txt(&[invoice(), second], &codec).unwrap();

    let batch = read_txt(&text, &codec);
    assert_eq!(batch.invoices.len(), 2);
    assert_eq!(batch.invoices[1].header.get("cbte_nro"), Some(&Value::Integer(78)));
    assert_eq!(batch.invoices[1].ivas.len(), 1);
    assert!(batch.invoices[1].detalles.is_empty());
}

#[test]
fn cbt_numero_fills_cbte_nro_on_write() {
    let codec = RecordCodec::default();
    let inv = NestedInvoice::new(Record::new().with("cbt_numero", 5));
    let batch = read_txt(&write_txt(&[inv], &codec).unwrap(), &codec);
    assert_eq!(batch.invoices[0].header.get("cbte_nro"), Some(&Value::Integer(5)));
}

#[test]
fn bad_lines_are_collected() {
    let codec = RecordCodec::default();
    let text = "400005\n0\n400021\n7garbage\n4ABCDE\n";
    let batch = read_txt(text, &codec);

    assert_eq!(batch.invoices.len(), 1);
    assert_eq!(batch.invoices[0].ivas.len(), 1);
    assert_eq!(batch.invoices[0].ivas[0].get("iva_id"), Some(&Value::Integer(21)));

    assert_eq!(batch.failure_count(), 3);
    let lines: Vec<usize> = batch.failures.iter().map(|f| f.line).collect();
    assert_eq!(lines, vec![1, 4, 5]);
    assert!(matches!(batch.failures[0].error, FormatError::SchemaMismatch(_)));
    assert!(matches!(batch.failures[2].error, FormatError::FieldDecode(_)));
}

#[test]
fn children_of_a_broken_header_are_orphans() {
    let codec = RecordCodec::default();
    let mut header = String::from("0");
    header.push_str(&" ".repeat(6 + 8));
    header.push_str("XX");
    let text = format!("{header}\n400005\n");

    let batch = read_txt(&text, &codec);
    assert!(batch.invoices.is_empty());
    assert_eq!(batch.failure_count(), 2);
}

#[test]
fn strict_mode_fails_on_overflow() {
    let strict = RecordCodec::new(CodecConfigBuilder::new().strict(true).build());
    let mut inv = invoice();
    inv.ivas[0].insert("iva_id", 1_000_000);
    let err = write_txt(&[inv], &strict).unwrap_err();
    assert!(matches!(err, FormatError::FieldEncode(ref w) if w.field == "iva_id"));
}

#[test]
fn latin1_file_round_trip() {
    let codec = RecordCodec::default();
    let text = write_txt(&[invoice()], &codec).unwrap();
    let bytes = encode_latin1(&text).unwrap();
    assert_eq!(bytes.len(), text.chars().count());

    let batch = read_txt(&decode_latin1(&bytes), &codec);
    assert_eq!(
        batch.invoices[0].header.get("nombre_cliente"),
        Some(&Value::from("Ñandú Hnos. SRL"))
    );
}

#[test]
fn date_expansion_on_read() {
    let codec = RecordCodec::new(CodecConfigBuilder::new().expand_dates(true).contract_dates(true).build());
    let inv = NestedInvoice::new(Record::new().with("fecha_cbte", "2024-06-15").with("cbte_nro", 1));
    let text = write_txt(&[inv], &codec).unwrap();
    assert_eq!(&text[7..15], "20240615");
    let batch = read_txt(&text, &codec);
    assert_eq!(batch.invoices[0].header.get("fecha_cbte"), Some(&Value::from("2024-06-15")));
}

#[test]
fn help_lists_every_layout() {
    let help = layout_help();
    for record_type in RecordType::ALL {
        assert!(help.contains(record_type.title()));
    }
    assert!(help.contains("tipo_cod_aut"));
}
