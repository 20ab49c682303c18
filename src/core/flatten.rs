//! Nested invoices ⇄ flat spreadsheet rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::columns::{ColumnKey, ColumnNamer, GroupKind};
use super::error::FormatError;
use super::types::{Dato, FlatTable, NestedInvoice, Record, Value};

/// Header columns always emitted by [`TabularFlattener::flatten`], in order.
pub const HEADER_COLUMNS: &[&str] = &[
    "id",
    "tipo_cbte",
    "punto_vta",
    "cbt_numero",
    "fecha_cbte",
    "tipo_doc",
    "nro_doc",
    "moneda_id",
    "moneda_ctz",
    "imp_neto",
    "imp_iva",
    "imp_trib",
    "imp_op_ex",
    "imp_tot_conc",
    "imp_total",
    "concepto",
    "fecha_venc_pago",
    "fecha_serv_desde",
    "fecha_serv_hasta",
    "cae",
    "fecha_vto",
    "resultado",
    "motivo",
    "reproceso",
    "nombre",
    "domicilio",
    "localidad",
    "telefono",
    "categoria",
    "email",
    "numero_cliente",
    "numero_orden_compra",
    "condicion_frente_iva",
    "numero_cotizacion",
    "numero_remito",
    "obs_generales",
    "obs_comerciales",
    "cuit",
    "idioma",
    "nombre_cliente",
    "domicilio_cliente",
    "telefono_cliente",
    "localidad_cliente",
    "provincia_cliente",
    "id_impositivo",
    "tipo_expo",
    "incoterms",
    "incoterms_ds",
    "pais_dst_cmp",
    "idioma_cbte",
    "permiso_existente",
    "forma_pago",
    "pdf",
];

/// Flattener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenConfig {
    /// Known header columns, in emission order.
    pub header_columns: Vec<String>,
    /// `(record field, column)` pairs for header fields stored under another column name.
    pub renames: Vec<(String, String)>,
    /// Columns a table must have to be unflattened.
    pub required_columns: Vec<String>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            header_columns: HEADER_COLUMNS.iter().map(|c| c.to_string()).collect(),
            renames: vec![("cbte_nro".into(), "cbt_numero".into())],
            required_columns: vec!["cbt_numero".into()],
        }
    }
}

#[derive(Debug, Clone)]
enum Column {
    Header { field: String },
    Group(ColumnKey),
    Extra,
}

/// Converts [`NestedInvoice`]s to a [`FlatTable`] and back.
#[derive(Debug, Clone, Default)]
pub struct TabularFlattener {
    config: FlattenConfig,
}

impl TabularFlattener {
    pub fn new(config: FlattenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Record field stored under `column`.
    fn field_for_column<'a>(&'a self, column: &'a str) -> &'a str {
        self.config
            .renames
            .iter()
            .find(|(_, c)| c == column)
            .map_or(column, |(f, _)| f.as_str())
    }

    fn is_header_column(&self, column: &str) -> bool {
        self.config.header_columns.iter().any(|c| c == column)
    }

    /// Header keys consumed by a known column, directly or through a rename.
    fn is_known_field(&self, field: &str) -> bool {
        self.is_header_column(field)
            || self
                .config
                .renames
                .iter()
                .any(|(f, c)| f == field && self.is_header_column(c))
    }

    /// Flatten invoices into one row each.
    ///
    /// Columns are the known header columns, then one numbered column set per
    /// group position, then extra columns in first-seen order.
    pub fn flatten(&self, records: &[NestedInvoice]) -> FlatTable {
        let mut names: Vec<String> = self.config.header_columns.clone();
        let mut columns: Vec<Column> = names
            .iter()
            .map(|c| Column::Header {
                field: self.field_for_column(c).to_string(),
            })
            .collect();

        for group in GroupKind::ALL {
            let count = records.iter().map(|r| r.group(group).len()).max().unwrap_or(0);
            for index in 1..=count {
                for key in ColumnKey::slot_keys(group, index) {
                    names.push(key.column_name());
                    columns.push(Column::Group(key));
                }
            }
        }

        let mut taken: HashSet<String> = names.iter().cloned().collect();
        let extras: Vec<Vec<(String, Value)>> = records.iter().map(|r| self.extra_cells(r)).collect();
        for (name, _) in extras.iter().flatten() {
            if taken.insert(name.clone()) {
                names.push(name.clone());
                columns.push(Column::Extra);
            }
        }

        let mut table = FlatTable::new(names);
        for (record, extra) in records.iter().zip(&extras) {
            let extra: HashMap<&str, &Value> = extra
                .iter()
                .rev()
                .map(|(name, value)| (name.as_str(), value))
                .collect();
            let row = table
                .header
                .iter()
                .zip(&columns)
                .map(|(name, column)| match column {
                    Column::Header { field } => record
                        .header
                        .get(field)
                        .or_else(|| record.header.get(name))
                        .cloned()
                        .unwrap_or_default(),
                    Column::Group(key) => record
                        .group(key.group)
                        .get(key.index - 1)
                        .and_then(|item| item.get(key.field()))
                        .cloned()
                        .unwrap_or_default(),
                    Column::Extra => extra.get(name.as_str()).map(|v| (*v).clone()).unwrap_or_default(),
                })
                .collect();
            table.rows.push(row);
        }
        table
    }

    /// Cells of a record with no fixed column: unknown header fields, group
    /// item fields outside the layout, then `datos`.
    fn extra_cells(&self, record: &NestedInvoice) -> Vec<(String, Value)> {
        let mut cells = Vec::new();

        for (field, value) in record.header.iter() {
            if !self.is_known_field(field) {
                cells.push((field.clone(), value.clone()));
            }
        }

        for group in GroupKind::ALL {
            let layout = group.layout();
            for (i, item) in record.group(group).iter().enumerate() {
                for (field, value) in item.iter() {
                    if layout.column_base(field).is_none() {
                        cells.push((ColumnNamer::suffix(field, i + 1, layout.suffix), value.clone()));
                    }
                }
            }
        }

        for dato in &record.datos {
            cells.push((dato.campo.clone(), dato.valor.clone()));
        }

        let fixed: Vec<&(String, Value)> = cells
            .iter()
            .filter(|(name, _)| self.is_header_column(name) || ColumnKey::parse(name).is_some())
            .collect();
        for (name, _) in fixed {
            tracing::warn!(column = %name, "extra value collides with a fixed column, skipped");
        }
        cells.retain(|(name, _)| !self.is_header_column(name) && ColumnKey::parse(name).is_none());
        cells
    }

    /// Rebuild invoices from a flat table, matching columns by name.
    pub fn unflatten(&self, table: &FlatTable) -> Result<Vec<NestedInvoice>, FormatError> {
        for required in &self.config.required_columns {
            if table.column_index(required).is_none() {
                return Err(FormatError::SchemaMismatch(format!(
                    "missing required column '{required}'"
                )));
            }
        }

        let columns: Vec<Column> = table
            .header
            .iter()
            .map(|name| {
                if self.is_header_column(name) {
                    Column::Header {
                        field: self.field_for_column(name).to_string(),
                    }
                } else if let Some(key) = ColumnKey::parse(name) {
                    Column::Group(key)
                } else {
                    Column::Extra
                }
            })
            .collect();

        let repetitions: HashMap<GroupKind, usize> = GroupKind::ALL
            .iter()
            .map(|&g| {
                let prefix = g.layout().presence_prefix();
                (g, ColumnNamer::max_repetition(&table.header, &prefix))
            })
            .collect();

        let mut invoices = Vec::with_capacity(table.rows.len());
        for (row_no, row) in table.rows.iter().enumerate() {
            if row.len() != table.header.len() {
                return Err(FormatError::SchemaMismatch(format!(
                    "row {} has {} cells, header has {} columns",
                    row_no + 1,
                    row.len(),
                    table.header.len()
                )));
            }

            let mut invoice = NestedInvoice::default();
            // only cells that are present are grouped, so sparse indices stay cheap
            let mut slots: BTreeMap<(GroupKind, usize), Vec<(usize, ColumnKey)>> = BTreeMap::new();
            let mut leftovers: Vec<usize> = Vec::new();

            for (pos, (column, cell)) in columns.iter().zip(row).enumerate() {
                if cell.is_null() {
                    continue;
                }
                match column {
                    Column::Header { field } => {
                        invoice.header.insert(field.clone(), cell.clone());
                    }
                    Column::Group(key)
                        if repetitions
                            .get(&key.group)
                            .is_some_and(|&max| (1..max).contains(&key.index)) =>
                    {
                        slots.entry((key.group, key.index)).or_default().push((pos, *key));
                    }
                    Column::Group(_) | Column::Extra => leftovers.push(pos),
                }
            }

            for ((group, index), cells) in slots {
                let presence = group.layout().presence;
                if !cells.iter().any(|(_, key)| key.field() == presence) {
                    tracing::debug!(
                        row = row_no + 1,
                        group = group.name(),
                        index,
                        "slot without presence value kept as datos"
                    );
                    leftovers.extend(cells.iter().map(|(pos, _)| *pos));
                    continue;
                }
                let item = cells.iter().fold(Record::new(), |item, (pos, key)| {
                    item.with(key.field(), row[*pos].clone())
                });
                invoice.group_mut(group).push(item);
            }

            leftovers.sort_unstable();
            invoice.datos = leftovers
                .into_iter()
                .map(|pos| Dato::new(table.header[pos].clone(), row[pos].clone()))
                .collect();

            let trimmed = trim_trailing_blank(&mut invoice.detalles);
            if trimmed > 0 {
                tracing::debug!(row = row_no + 1, trimmed, "removed trailing blank detail lines");
            }
            invoices.push(invoice);
        }
        Ok(invoices)
    }
}

/// Drop trailing items whose fields are all blank; returns how many were removed.
fn trim_trailing_blank(items: &mut Vec<Record>) -> usize {
    let before = items.len();
    while items.last().is_some_and(Record::is_blank) {
        items.pop();
    }
    before - items.len()
}
