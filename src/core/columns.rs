//! Numbered column names for repeating groups.
//!
//! Internally a grouped cell is addressed by a [`ColumnKey`] triple
//! (group, 1-based index, field). Suffixed strings such as `cantidad2` or
//! `iva_id_3` only exist at the flat-table boundary.

use serde::{Deserialize, Serialize};

/// How the repetition index is appended to a column base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suffix {
    /// `codigo1`, `cantidad2` (detail lines).
    Concatenated,
    /// `iva_id_1`, `tributo_importe_2` (tax, VAT, document groups).
    Underscored,
}

impl Suffix {
    /// Text placed between the base name and the index.
    pub fn separator(&self) -> &'static str {
        match self {
            Self::Concatenated => "",
            Self::Underscored => "_",
        }
    }
}

/// Builds and parses numbered column names.
pub struct ColumnNamer;

impl ColumnNamer {
    /// Column name for `base` at 1-based `index`.
    pub fn suffix(base: &str, index: usize, style: Suffix) -> String {
        format!("{base}{}{index}", style.separator())
    }

    /// The index of `column` if it is `base` + separator + digits.
    pub fn index_of(column: &str, base: &str, style: Suffix) -> Option<usize> {
        let prefix = format!("{base}{}", style.separator());
        digits_after(column, &prefix)
    }

    /// `max(n) + 1` over all columns spelled `prefix` + digits, or 0 if none.
    ///
    /// Columns whose tail after `prefix` is not purely digits are ignored,
    /// as are indices too large to count past.
    pub fn max_repetition<S: AsRef<str>>(header: &[S], prefix: &str) -> usize {
        header
            .iter()
            .filter_map(|column| digits_after(column.as_ref(), prefix))
            .filter_map(|n| n.checked_add(1))
            .max()
            .unwrap_or(0)
    }
}

fn digits_after(column: &str, prefix: &str) -> Option<usize> {
    let tail = column.strip_prefix(prefix)?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// The repeating groups of an invoice, in flattening order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKind {
    Detalles,
    Ivas,
    Tributos,
    CbtesAsoc,
    Permisos,
    FormasPago,
    Opcionales,
}

impl GroupKind {
    /// All groups, in the order their columns are emitted.
    pub const ALL: [GroupKind; 7] = [
        Self::Detalles,
        Self::Ivas,
        Self::Tributos,
        Self::CbtesAsoc,
        Self::Permisos,
        Self::FormasPago,
        Self::Opcionales,
    ];

    /// Name of the group list (`detalles`, `ivas`, ...).
    pub fn name(&self) -> &'static str {
        self.layout().name
    }

    /// Column layout of the group.
    pub fn layout(&self) -> &'static GroupLayout {
        match self {
            Self::Detalles => &DETALLES,
            Self::Ivas => &IVAS,
            Self::Tributos => &TRIBUTOS,
            Self::CbtesAsoc => &CBTES_ASOC,
            Self::Permisos => &PERMISOS,
            Self::FormasPago => &FORMAS_PAGO,
            Self::Opcionales => &OPCIONALES,
        }
    }
}

/// Column mapping of one repeating group.
#[derive(Debug, PartialEq, Eq)]
pub struct GroupLayout {
    /// Group list name.
    pub name: &'static str,
    /// Index suffix convention.
    pub suffix: Suffix,
    /// `(record field, column base)` pairs, in column order.
    pub fields: &'static [(&'static str, &'static str)],
    /// Record field whose cell decides whether a numbered slot holds an item.
    pub presence: &'static str,
}

impl GroupLayout {
    /// Column base for a record field.
    pub fn column_base(&self, field: &str) -> Option<&'static str> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, c)| *c)
    }

    /// Column prefix of the presence field, e.g. `cantidad` or `iva_id_`.
    pub fn presence_prefix(&self) -> String {
        let base = self.column_base(self.presence).unwrap_or(self.presence);
        format!("{base}{}", self.suffix.separator())
    }
}

static DETALLES: GroupLayout = GroupLayout {
    name: "detalles",
    suffix: Suffix::Concatenated,
    fields: &[
        ("codigo", "codigo"),
        ("ds", "descripcion"),
        ("umed", "umed"),
        ("qty", "cantidad"),
        ("precio", "precio"),
        ("importe", "importe"),
        ("iva_id", "iva_id"),
        ("imp_iva", "imp_iva"),
        ("bonif", "bonif"),
        ("despacho", "numero_despacho"),
        ("dato_a", "dato_a"),
        ("dato_b", "dato_b"),
        ("dato_c", "dato_c"),
        ("dato_d", "dato_d"),
        ("dato_e", "dato_e"),
        ("ncm", "ncm"),
        ("sec", "sec"),
        ("u_mtx", "u_mtx"),
        ("cod_mtx", "cod_mtx"),
    ],
    presence: "qty",
};

static IVAS: GroupLayout = GroupLayout {
    name: "ivas",
    suffix: Suffix::Underscored,
    fields: &[
        ("iva_id", "iva_id"),
        ("base_imp", "iva_base_imp"),
        ("importe", "iva_importe"),
    ],
    presence: "iva_id",
};

static TRIBUTOS: GroupLayout = GroupLayout {
    name: "tributos",
    suffix: Suffix::Underscored,
    fields: &[
        ("tributo_id", "tributo_id"),
        ("desc", "tributo_desc"),
        ("base_imp", "tributo_base_imp"),
        ("alic", "tributo_alic"),
        ("importe", "tributo_importe"),
    ],
    presence: "tributo_id",
};

static CBTES_ASOC: GroupLayout = GroupLayout {
    name: "cbtes_asoc",
    suffix: Suffix::Underscored,
    fields: &[
        ("cbte_tipo", "cbte_tipo"),
        ("cbte_punto_vta", "cbte_punto_vta"),
        ("cbte_nro", "cbte_nro"),
        ("cbte_fecha", "cbte_fecha"),
        ("cbte_cuit", "cbte_cuit"),
    ],
    presence: "cbte_tipo",
};

static PERMISOS: GroupLayout = GroupLayout {
    name: "permisos",
    suffix: Suffix::Underscored,
    fields: &[("id_permiso", "id_permiso"), ("dst_merc", "dst_merc")],
    presence: "id_permiso",
};

static FORMAS_PAGO: GroupLayout = GroupLayout {
    name: "formas_pago",
    suffix: Suffix::Underscored,
    fields: &[
        ("codigo", "forma_pago_codigo"),
        ("descripcion", "forma_pago_descripcion"),
    ],
    presence: "codigo",
};

static OPCIONALES: GroupLayout = GroupLayout {
    name: "opcionales",
    suffix: Suffix::Underscored,
    fields: &[("opcional_id", "opcional_id"), ("valor", "opcional_valor")],
    presence: "opcional_id",
};

/// A grouped cell address: group, 1-based index, and field slot in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub group: GroupKind,
    pub index: usize,
    slot: usize,
}

impl ColumnKey {
    /// Key for `field` of `group` at `index`, if the layout has that field.
    pub fn new(group: GroupKind, index: usize, field: &str) -> Option<Self> {
        let slot = group.layout().fields.iter().position(|(f, _)| *f == field)?;
        Some(Self { group, index, slot })
    }

    /// Every key of one numbered slot, in layout order.
    pub fn slot_keys(group: GroupKind, index: usize) -> impl Iterator<Item = ColumnKey> {
        (0..group.layout().fields.len()).map(move |slot| Self { group, index, slot })
    }

    /// Record field name.
    pub fn field(&self) -> &'static str {
        self.group.layout().fields[self.slot].0
    }

    /// Suffixed column name.
    pub fn column_name(&self) -> String {
        let layout = self.group.layout();
        ColumnNamer::suffix(layout.fields[self.slot].1, self.index, layout.suffix)
    }

    /// Recognize a suffixed column name as a grouped cell.
    pub fn parse(column: &str) -> Option<Self> {
        GroupKind::ALL.iter().find_map(|&group| {
            let layout = group.layout();
            layout.fields.iter().enumerate().find_map(|(slot, (_, base))| {
                ColumnNamer::index_of(column, base, layout.suffix)
                    .map(|index| Self { group, index, slot })
            })
        })
    }
}
