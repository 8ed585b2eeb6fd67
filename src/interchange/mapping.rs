//! Mapping registry: field identifiers ↔ spreadsheet column labels
//!
//! Field identifiers are storage column names. Every entity kind has a layout:
//! an ordered list of sections, one per embedded component, each listing its
//! mapped fields in declaration order. The layout order is the column order of
//! exported tables, and the same table answers import header lookups, so the
//! two directions cannot drift apart.
//!
//! The registry is built from `static` data and never mutated; callers hold a
//! `&'static MappingRegistry` from [`MappingRegistry::standard`].

use crate::types::EntityKind;

/// How a mapped cell is coerced on import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Currency,
    Date,
}

/// What happens to a mapped column when a sheet is imported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportRole {
    /// Stored verbatim under the field name
    Column,
    /// Computed or denormalised on export; ignored on import
    ExportOnly,
    /// Natural key resolved to a storage id, stored under `column`
    ForeignKey { column: &'static str },
    /// Stored verbatim, plus a secondary token stored under `column`
    Derived { column: &'static str },
}

/// Sub-entity a section of a layout reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Product,
    Purchase,
    Order,
    /// Computed valuation figures of report entities
    Valuation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLabel {
    pub field: &'static str,
    pub label: &'static str,
    pub value_type: ValueType,
    pub role: ImportRole,
}

impl FieldLabel {
    pub fn is_importable(&self) -> bool {
        self.role != ImportRole::ExportOnly
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub component: Component,
    pub fields: &'static [FieldLabel],
}

/// Workbook sheet bound to a storage table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetTable {
    pub sheet: &'static str,
    pub table: &'static str,
    pub kind: EntityKind,
}

const fn field(
    field: &'static str,
    label: &'static str,
    value_type: ValueType,
    role: ImportRole,
) -> FieldLabel {
    FieldLabel {
        field,
        label,
        value_type,
        role,
    }
}

use ImportRole::{Column, ExportOnly};
use ValueType::{Currency, Date, Integer, Text};

const PRODUCT_ID: ImportRole = ImportRole::ForeignKey {
    column: "product_id",
};
const ORDER_ID_FORMAT: ImportRole = ImportRole::Derived {
    column: "order_id_format",
};

//==============================================================================
// Layouts
//==============================================================================

const PRODUCT_LAYOUT: &[Section] = &[Section {
    component: Component::Product,
    fields: &[
        field("name", "Nama Item", Text, Column),
        field("sku", "SKU", Text, Column),
        field("stock", "Jumlah Sekarang", Integer, Column),
    ],
}];

const PURCHASE_LAYOUT: &[Section] = &[
    Section {
        component: Component::Purchase,
        fields: &[
            field("quantity_order", "Jumlah Pemesanan", Integer, Column),
            field("quantity_accepted", "Jumlah Diterima", Integer, Column),
            field("description", "Catatan", Text, Column),
            field("invoice_number", "Nomer Kuitansi", Text, Column),
            field("cost", "Harga Beli", Currency, Column),
            field("date", "Waktu", Date, Column),
            field("total", "Total", Integer, ExportOnly),
        ],
    },
    Section {
        component: Component::Product,
        fields: &[
            field("name", "Nama Barang", Text, ExportOnly),
            field("sku", "SKU", Text, PRODUCT_ID),
        ],
    },
];

const ORDER_LAYOUT: &[Section] = &[
    Section {
        component: Component::Order,
        fields: &[
            field("quantity", "Jumlah Keluar", Integer, Column),
            field("description", "Catatan", Text, ORDER_ID_FORMAT),
            field("date", "Waktu", Date, Column),
            field("price", "Harga Jual", Currency, Column),
            field("total", "Total", Integer, ExportOnly),
        ],
    },
    Section {
        component: Component::Product,
        fields: &[
            field("name", "Nama Barang", Text, ExportOnly),
            field("sku", "SKU", Text, PRODUCT_ID),
        ],
    },
];

const PRODUCT_VALUE_LAYOUT: &[Section] = &[
    Section {
        component: Component::Product,
        fields: &[
            field("name", "Nama Item", Text, ExportOnly),
            field("sku", "SKU", Text, ExportOnly),
            field("stock", "Jumlah", Integer, ExportOnly),
        ],
    },
    Section {
        component: Component::Valuation,
        fields: &[
            field("average_cost", "Rata-Rata Harga Beli", Integer, ExportOnly),
            field("total", "Total", Integer, ExportOnly),
        ],
    },
];

const ORDER_VALUE_LAYOUT: &[Section] = &[
    Section {
        component: Component::Order,
        fields: &[
            field("order_id_format", "ID Pesanan", Text, ExportOnly),
            field("quantity", "Jumlah", Integer, ExportOnly),
            field("date", "Waktu", Date, ExportOnly),
            field("price", "Harga Jual", Integer, ExportOnly),
        ],
    },
    Section {
        component: Component::Valuation,
        fields: &[
            field("average_cost", "Harga Beli", Integer, ExportOnly),
            field("total", "Total", Integer, ExportOnly),
            field("profit", "Laba", Integer, ExportOnly),
        ],
    },
    Section {
        component: Component::Product,
        fields: &[
            field("name", "Nama Barang", Text, ExportOnly),
            field("sku", "SKU", Text, ExportOnly),
        ],
    },
];

//==============================================================================
// Summary blocks
//==============================================================================

const PRODUCT_SUMMARY_LABELS: &[(&str, &str)] = &[
    ("date_print", "Tanggal Cetak"),
    ("total_sku", "Jumlah SKU"),
    ("total_product", "Jumlah Total Barang"),
    ("total_value", "Total Nilai"),
];

const ORDER_SUMMARY_LABELS: &[(&str, &str)] = &[
    ("date_print", "Tanggal Cetak"),
    ("date", "Tanggal"),
    ("total_price", "Total Omzet"),
    ("total_profit", "Laba Kotor"),
    ("total_sold", "Total Penjualan"),
    ("total_item", "Total Barang"),
];

//==============================================================================
// Sheets
//==============================================================================

const SHEETS: &[SheetTable] = &[
    SheetTable {
        sheet: "Catatan Jumlah Barang",
        table: "product",
        kind: EntityKind::Product,
    },
    SheetTable {
        sheet: "Catatan Barang Masuk",
        table: "purchase",
        kind: EntityKind::PurchaseWithProduct,
    },
    SheetTable {
        sheet: "Catatan Barang Keluar",
        table: "orders",
        kind: EntityKind::OrderWithProduct,
    },
];

/// Legacy header spellings accepted on import only
const IMPORT_ALIASES: &[(EntityKind, &str, &str)] = &[(
    EntityKind::PurchaseWithProduct,
    "Nomer Kwitansi",
    "invoice_number",
)];

//==============================================================================
// Registry
//==============================================================================

#[derive(Debug)]
pub struct MappingRegistry {
    sheets: &'static [SheetTable],
    aliases: &'static [(EntityKind, &'static str, &'static str)],
}

static STANDARD: MappingRegistry = MappingRegistry {
    sheets: SHEETS,
    aliases: IMPORT_ALIASES,
};

impl MappingRegistry {
    /// The process-wide registry
    pub fn standard() -> &'static MappingRegistry {
        &STANDARD
    }

    /// Ordered sections of a tabular kind; empty for summary kinds
    pub fn layout(&self, kind: EntityKind) -> &'static [Section] {
        match kind {
            EntityKind::Product => PRODUCT_LAYOUT,
            EntityKind::PurchaseWithProduct => PURCHASE_LAYOUT,
            EntityKind::OrderWithProduct => ORDER_LAYOUT,
            EntityKind::ProductAverageValue => PRODUCT_VALUE_LAYOUT,
            EntityKind::OrderValue => ORDER_VALUE_LAYOUT,
            EntityKind::ProductValueSummary | EntityKind::OrderValueSummary => &[],
        }
    }

    /// Export direction. `None` means the field is not part of the tabular form.
    pub fn label_for(
        &self,
        kind: EntityKind,
        component: Component,
        field: &str,
    ) -> Option<&'static str> {
        self.layout(kind)
            .iter()
            .filter(|section| section.component == component)
            .flat_map(|section| section.fields.iter())
            .find(|f| f.field == field)
            .map(|f| f.label)
    }

    /// Import direction: a trimmed header label to the field it fills.
    /// Export-only columns resolve to `None`.
    pub fn field_for(&self, kind: EntityKind, label: &str) -> Option<&'static FieldLabel> {
        let fields = || {
            self.layout(kind)
                .iter()
                .flat_map(|section| section.fields.iter())
                .filter(|f| f.is_importable())
        };

        fields().find(|f| f.label == label).or_else(|| {
            let (_, _, target) = self
                .aliases
                .iter()
                .find(|(k, alias, _)| *k == kind && *alias == label)?;
            fields().find(|f| f.field == *target)
        })
    }

    /// Header labels of a tabular kind in column order
    pub fn labels(&self, kind: EntityKind) -> Vec<&'static str> {
        self.layout(kind)
            .iter()
            .flat_map(|section| section.fields.iter())
            .map(|f| f.label)
            .collect()
    }

    /// Label/field pairs of a summary block, in print order
    pub fn summary_labels(&self, kind: EntityKind) -> &'static [(&'static str, &'static str)] {
        match kind {
            EntityKind::ProductValueSummary => PRODUCT_SUMMARY_LABELS,
            EntityKind::OrderValueSummary => ORDER_SUMMARY_LABELS,
            _ => &[],
        }
    }

    pub fn table_for_sheet(&self, sheet: &str) -> Option<&'static SheetTable> {
        self.sheets.iter().find(|s| s.sheet == sheet)
    }

    pub fn sheet_for_kind(&self, kind: EntityKind) -> Option<&'static SheetTable> {
        self.sheets.iter().find(|s| s.kind == kind)
    }

    /// File (and worksheet) name used when a kind is exported
    pub fn export_name(&self, kind: EntityKind) -> &'static str {
        match self.sheet_for_kind(kind) {
            Some(sheet) => sheet.sheet,
            None => match kind {
                EntityKind::ProductAverageValue | EntityKind::ProductValueSummary => {
                    "Laporan Nilai Barang"
                }
                _ => "Laporan Penjualan",
            },
        }
    }

    /// The field whose value must be resolved to a storage id, if any
    pub fn foreign_key_field(&self, kind: EntityKind) -> Option<&'static FieldLabel> {
        self.importable(kind)
            .find(|f| matches!(f.role, ImportRole::ForeignKey { .. }))
    }

    /// The field that carries a secondary value split into its own column, if any
    pub fn derived_field(&self, kind: EntityKind) -> Option<&'static FieldLabel> {
        self.importable(kind)
            .find(|f| matches!(f.role, ImportRole::Derived { .. }))
    }

    fn importable(&self, kind: EntityKind) -> impl Iterator<Item = &'static FieldLabel> {
        self.layout(kind)
            .iter()
            .flat_map(|section| section.fields.iter())
            .filter(|f| f.is_importable())
    }
}
