//! SIAP-RECE record layouts.

use std::fmt::Write;

use crate::core::{FieldKind, FieldSchema, FieldSpec, GroupKind};

/// Invoice header, record type `0`.
pub static ENCABEZADO: FieldSchema = FieldSchema::from_static(
    "encabezado",
    &[
        FieldSpec::int("tipo_reg", 1),
        FieldSpec::alpha("webservice", 6),
        FieldSpec::alpha("fecha_cbte", 8),
        FieldSpec::int("tipo_cbte", 2),
        FieldSpec::int("punto_vta", 4),
        FieldSpec::int("cbte_nro", 8),
        FieldSpec::int("tipo_expo", 1),
        FieldSpec::alpha("permiso_existente", 1),
        FieldSpec::int("pais_dst_cmp", 3),
        FieldSpec::alpha("nombre_cliente", 200),
        FieldSpec::int("tipo_doc", 2),
        FieldSpec::int("nro_doc", 11),
        FieldSpec::alpha("domicilio_cliente", 300),
        FieldSpec::alpha("id_impositivo", 50),
        FieldSpec::importe_scaled("imp_total", 15, 3),
        FieldSpec::importe_scaled("imp_tot_conc", 15, 3),
        FieldSpec::importe_scaled("imp_neto", 15, 3),
        FieldSpec::importe_scaled("impto_liq", 15, 3),
        FieldSpec::importe_scaled("impto_liq_nri", 15, 3),
        FieldSpec::importe_scaled("imp_op_ex", 15, 3),
        FieldSpec::importe("impto_perc", 15),
        FieldSpec::importe_scaled("imp_iibb", 15, 3),
        FieldSpec::importe_scaled("impto_perc_mun", 15, 3),
        FieldSpec::importe_scaled("imp_internos", 15, 3),
        FieldSpec::importe_scaled("imp_trib", 15, 3),
        FieldSpec::alpha("moneda_id", 3),
        FieldSpec::importe_scaled("moneda_ctz", 10, 6),
        FieldSpec::alpha("obs_comerciales", 1000),
        FieldSpec::alpha("obs_generales", 1000),
        FieldSpec::alpha("forma_pago", 50),
        FieldSpec::alpha("incoterms", 3),
        FieldSpec::alpha("incoterms_ds", 20),
        FieldSpec::alpha("idioma_cbte", 1),
        FieldSpec::alpha("zona", 5),
        FieldSpec::alpha("fecha_venc_pago", 8),
        FieldSpec::int("presta_serv", 1),
        FieldSpec::alpha("fecha_serv_desde", 8),
        FieldSpec::alpha("fecha_serv_hasta", 8),
        FieldSpec::alpha("cae", 14),
        FieldSpec::alpha("fecha_vto", 8),
        FieldSpec::alpha("resultado", 1),
        FieldSpec::alpha("reproceso", 1),
        FieldSpec::alpha("motivos_obs", 1000),
        FieldSpec::int("id", 15),
        FieldSpec::alpha("telefono_cliente", 50),
        FieldSpec::alpha("localidad_cliente", 50),
        FieldSpec::alpha("provincia_cliente", 50),
        FieldSpec::int("formato_id", 10),
        FieldSpec::alpha("email", 100),
        FieldSpec::alpha("pdf", 100),
        FieldSpec::alpha("err_code", 6),
        FieldSpec::alpha("err_msg", 1000),
        FieldSpec::alpha("Dato_adicional1", 30),
        FieldSpec::alpha("Dato_adicional2", 30),
        FieldSpec::alpha("Dato_adicional3", 30),
        FieldSpec::alpha("Dato_adicional4", 30),
        FieldSpec::importe_scaled("descuento", 15, 3),
        FieldSpec::int("cbt_desde", 8),
        FieldSpec::int("cbt_hasta", 8),
        FieldSpec::int("concepto", 1),
        FieldSpec::importe_scaled("no_usar", 15, 3),
        FieldSpec::importe_scaled("imp_iva", 15, 3),
        FieldSpec::alpha("emision_tipo", 4),
        FieldSpec::importe_scaled("imp_subtotal", 15, 3),
        FieldSpec::int("cat_iva", 2),
        // FCE: wider copies of the document type and point of sale
        FieldSpec::int("tipo_cbte", 3).alias(),
        FieldSpec::int("punto_vta", 5).alias(),
        FieldSpec::alpha("tipo_cod_aut", 1),
    ],
);

/// Line item, record type `1`.
pub static DETALLE: FieldSchema = FieldSchema::from_static(
    "detalle",
    &[
        FieldSpec::int("tipo_reg", 1),
        FieldSpec::alpha("codigo", 30),
        FieldSpec::importe("qty", 12),
        FieldSpec::int("umed", 2),
        FieldSpec::importe_scaled("precio", 15, 3),
        FieldSpec::importe_scaled("importe", 14, 3),
        FieldSpec::int("iva_id", 5),
        FieldSpec::alpha("ds", 4000),
        FieldSpec::alpha("ncm", 15),
        FieldSpec::alpha("sec", 15),
        FieldSpec::importe("bonif", 15),
        FieldSpec::importe("imp_iva", 15),
        FieldSpec::alpha("despacho", 20),
        FieldSpec::int("u_mtx", 10),
        FieldSpec::alpha("cod_mtx", 30),
        FieldSpec::alpha("dato_a", 15),
        FieldSpec::alpha("dato_b", 15),
        FieldSpec::alpha("dato_c", 15),
        FieldSpec::alpha("dato_d", 15),
        FieldSpec::alpha("dato_e", 15),
    ],
);

/// Export permit, record type `2`.
pub static PERMISO: FieldSchema = FieldSchema::from_static(
    "permiso",
    &[
        FieldSpec::int("tipo_reg", 1),
        FieldSpec::alpha("id_permiso", 16),
        FieldSpec::int("dst_merc", 3),
    ],
);

/// Associated document, record type `3`.
pub static CMP_ASOC: FieldSchema = FieldSchema::from_static(
    "cmp_asoc",
    &[
        FieldSpec::int("tipo_reg", 1),
        FieldSpec::int("cbte_tipo", 3),
        FieldSpec::int("cbte_punto_vta", 4),
        FieldSpec::int("cbte_nro", 8),
        FieldSpec::int("cbte_fecha", 8),
        FieldSpec::int("cbte_cuit", 11),
    ],
);

/// VAT subtotal, record type `4`.
pub static IVA: FieldSchema = FieldSchema::from_static(
    "iva",
    &[
        FieldSpec::int("tipo_reg", 1),
        FieldSpec::int("iva_id", 5),
        FieldSpec::importe_scaled("base_imp", 15, 3),
        FieldSpec::importe_scaled("importe", 15, 3),
    ],
);

/// Other tax, record type `5`.
pub static TRIBUTO: FieldSchema = FieldSchema::from_static(
    "tributo",
    &[
        FieldSpec::int("tipo_reg", 1),
        FieldSpec::int("tributo_id", 5),
        FieldSpec::alpha("desc", 100),
        FieldSpec::importe_scaled("base_imp", 15, 3),
        FieldSpec::importe("alic", 15),
        FieldSpec::importe_scaled("importe", 15, 3),
    ],
);

/// Optional web-service datum, record type `6`.
pub static OPCIONAL: FieldSchema = FieldSchema::from_static(
    "opcional",
    &[
        FieldSpec::int("tipo_reg", 1),
        FieldSpec::alpha("opcional_id", 4),
        FieldSpec::alpha("valor", 250),
    ],
);

/// Extra datum, record type `9`.
pub static DATO: FieldSchema = FieldSchema::from_static(
    "dato",
    &[
        FieldSpec::int("tipo_reg", 1),
        FieldSpec::alpha("campo", 30),
        FieldSpec::alpha("valor", 1000),
        // P: first page, U: last page, T: all pages
        FieldSpec::alpha("pagina", 3),
    ],
);

/// Record type, identified by the first character of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Encabezado,
    Detalle,
    Permiso,
    CmpAsoc,
    Iva,
    Tributo,
    Opcional,
    Dato,
}

impl RecordType {
    /// All record types, in file order.
    pub const ALL: [RecordType; 8] = [
        Self::Encabezado,
        Self::Detalle,
        Self::Permiso,
        Self::CmpAsoc,
        Self::Iva,
        Self::Tributo,
        Self::Opcional,
        Self::Dato,
    ];

    /// `tipo_reg` value.
    pub fn code(&self) -> u8 {
        match self {
            Self::Encabezado => 0,
            Self::Detalle => 1,
            Self::Permiso => 2,
            Self::CmpAsoc => 3,
            Self::Iva => 4,
            Self::Tributo => 5,
            Self::Opcional => 6,
            Self::Dato => 9,
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| char::from(b'0' + t.code()) == c)
    }

    pub fn schema(&self) -> &'static FieldSchema {
        match self {
            Self::Encabezado => &ENCABEZADO,
            Self::Detalle => &DETALLE,
            Self::Permiso => &PERMISO,
            Self::CmpAsoc => &CMP_ASOC,
            Self::Iva => &IVA,
            Self::Tributo => &TRIBUTO,
            Self::Opcional => &OPCIONAL,
            Self::Dato => &DATO,
        }
    }

    /// Repeating group fed by this record type, if any.
    pub fn group(&self) -> Option<GroupKind> {
        match self {
            Self::Detalle => Some(GroupKind::Detalles),
            Self::Permiso => Some(GroupKind::Permisos),
            Self::CmpAsoc => Some(GroupKind::CbtesAsoc),
            Self::Iva => Some(GroupKind::Ivas),
            Self::Tributo => Some(GroupKind::Tributos),
            Self::Opcional => Some(GroupKind::Opcionales),
            Self::Encabezado | Self::Dato => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Encabezado => "Encabezado",
            Self::Detalle => "Detalle Item",
            Self::Permiso => "Permiso",
            Self::CmpAsoc => "Comprobante Asociado",
            Self::Iva => "Iva",
            Self::Tributo => "Tributo",
            Self::Opcional => "Opcional",
            Self::Dato => "Datos Adicionales",
        }
    }
}

/// Human-readable listing of every layout: name, 1-based position, width,
/// kind and decimals.
pub fn layout_help() -> String {
    let mut out = String::from("Formato:\n");
    for record_type in RecordType::ALL {
        let schema = record_type.schema();
        let _ = writeln!(out, "== {} ({}) ==", record_type.title(), record_type.code());
        for (offset, field) in schema.offsets() {
            let scale = match field.kind {
                FieldKind::Importe => field.scale.to_string(),
                _ => "-".into(),
            };
            let _ = writeln!(
                out,
                " * {:<20} pos {:>4}  width {:>4}  {:<12} decimals {}",
                field.name,
                offset + 1,
                field.width,
                field.kind.label(),
                scale
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_layouts_are_valid() {
        for record_type in RecordType::ALL {
            let schema = record_type.schema();
            assert!(schema.validate().is_ok(), "{}", schema.name());
            assert!(schema.lint().is_empty(), "{}", schema.name());
            assert_eq!(schema.fields()[0].name, "tipo_reg");
        }
    }

    #[test]
    fn record_type_codes() {
        assert_eq!(RecordType::from_code('9'), Some(RecordType::Dato));
        assert_eq!(RecordType::from_code('0'), Some(RecordType::Encabezado));
        assert_eq!(RecordType::from_code('7'), None);
        assert_eq!(RecordType::from_code('X'), None);
    }

    #[test]
    fn widths() {
        assert_eq!(PERMISO.total_width(), 20);
        assert_eq!(CMP_ASOC.total_width(), 35);
        assert_eq!(IVA.total_width(), 36);
    }

    #[test]
    fn help_lists_positions() {
        let help = layout_help();
        assert!(help.contains("== Detalle Item (1) =="));
        assert!(help.lines().any(|l| l.contains("codigo") && l.contains("pos    2")));
    }
}
