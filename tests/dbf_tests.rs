#![cfg(feature = "dbf")]

use std::collections::HashSet;

use rece_formats::core::*;
use rece_formats::dbf::*;
use rece_formats::txt::{DATO, ENCABEZADO};
use rust_decimal_macros::dec;

fn invoices() -> Vec<NestedInvoice> {
    let mut a = NestedInvoice::new(
        Record::new()
            .with("id", 10)
            .with("cbte_nro", 1)
            .with("nombre_cliente", "Cliente A")
            .with("imp_total", dec!(121))
            .with("Dato_adicional2", "extra"),
    );
    a.detalles.push(Record::new().with("codigo", "P1").with("qty", dec!(1)).with("ds", "Uno"));
    a.detalles.push(Record::new().with("codigo", "P2").with("qty", dec!(2)).with("ds", "Dos"));
    a.ivas.push(Record::new().with("iva_id", 5).with("importe", dec!(21)));

    let mut b = NestedInvoice::new(Record::new().with("id", 11).with("cbte_nro", 2));
    b.datos.push(Dato::new("leyenda", "hola"));
    vec![a, b]
}

#[test]
fn one_table_per_layout() {
    let tables = to_tables(&invoices());
    let names: Vec<&str> = tables.iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec!["encabeza", "detalle", "permiso", "comproba", "iva", "tributo", "opcional", "dato"]
    );
    assert!(names.iter().all(|n| n.len() <= 8));

    let detalle = &tables[1];
    assert_eq!(detalle.rows.len(), 2);
    assert_eq!(detalle.rows[1].get("id"), Some(&Value::Integer(10)));
    assert_eq!(detalle.rows[1].get("codigo"), Some(&Value::from("P2")));
}

#[test]
fn nulls_are_coerced() {
    let tables = to_tables(&invoices());
    let header = &tables[0].rows[1];
    assert_eq!(header.get("nombreclie"), Some(&Value::from("")));
    assert_eq!(header.get("imptotal"), Some(&Value::Decimal(dec!(0.000))));
    assert_eq!(header.get("tipocbte"), Some(&Value::Integer(0)));
    assert_eq!(header.get("datoadic02"), Some(&Value::from("")));
    assert_eq!(tables[0].rows[0].get("datoadic02"), Some(&Value::from("extra")));
}

#[test]
fn tables_back_to_invoices() {
    let back = from_tables(&to_tables(&invoices())).unwrap();
    assert_eq!(back.len(), 2);

    let a = &back[0];
    assert_eq!(a.header.get("id"), Some(&Value::Integer(10)));
    assert_eq!(a.header.get("nombre_cliente"), Some(&Value::from("Cliente A")));
    assert_eq!(a.header.get("Dato_adicional2"), Some(&Value::from("extra")));
    assert_eq!(a.detalles.len(), 2);
    assert_eq!(a.detalles[0].get("ds"), Some(&Value::from("Uno")));
    assert!(!a.detalles[0].contains_key("id"));
    assert_eq!(a.ivas[0].get("importe"), Some(&Value::Decimal(dec!(21))));

    let b = &back[1];
    assert!(b.detalles.is_empty());
    assert_eq!(b.datos, vec![Dato::new("leyenda", "hola")]);
}

#[test]
fn invoices_without_id_are_numbered() {
    let invs = vec![
        NestedInvoice::new(Record::new().with("cbte_nro", 1)),
        NestedInvoice::new(Record::new().with("cbte_nro", 2)),
    ];
    let tables = to_tables(&invs);
    let ids: Vec<_> = tables[0].rows.iter().map(|r| r.get("id").cloned()).collect();
    assert_eq!(ids, vec![Some(Value::Integer(1)), Some(Value::Integer(2))]);
}

#[test]
fn duplicate_header_ids_are_rejected() {
    let invs = vec![
        NestedInvoice::new(Record::new().with("id", 1)),
        NestedInvoice::new(Record::new().with("id", 1)),
    ];
    let err = from_tables(&to_tables(&invs)).unwrap_err();
    assert!(matches!(err, FormatError::SchemaMismatch(_)));
}

#[test]
fn missing_header_table() {
    let mut tables = to_tables(&invoices());
    tables.remove(0);
    assert!(from_tables(&tables).is_err());
}

#[test]
fn field_names_fit_dbase() {
    for schema in [&ENCABEZADO, &DATO] {
        let fields = field_definitions(schema);
        let unique: HashSet<_> = fields.iter().map(|f| f.name.clone()).collect();
        assert_eq!(unique.len(), fields.len());
        assert!(fields.iter().all(|f| f.name.len() <= MAX_NAME_LEN));
    }
    let dato = field_definitions(&DATO);
    let listing: Vec<String> = dato.iter().map(ToString::to_string).collect();
    assert_eq!(listing, vec!["campo C(30)", "valor M", "pagina C(3)"]);
}

#[test]
fn dbf_names() {
    let taken = HashSet::new();
    assert_eq!(dbf_field_name("Dato_adicional1", &taken), "datoadic01");
    assert_eq!(dbf_field_name("fecha_serv_desde", &taken), "fechaservd");
}
