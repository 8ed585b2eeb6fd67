//! Tabular exporter: domain entities → labelled rows

use super::coercion::{format_date, format_number};
use super::mapping::{Component, MappingRegistry};
use crate::types::{
    EntityKind, ExportData, Order, OrderWithProduct, OrderWithProductValue, Product,
    ProductAvgValue, Purchase, PurchaseWithProduct, Row, SummaryAvgValue,
    SummaryOrderWithProductValue,
};
use tracing::{debug, warn};

/// Reads one field of `T` as cell text
struct Accessor<T> {
    field: &'static str,
    value: fn(&T) -> String,
}

// Accessor tables list every field in declaration order. Fields the registry
// does not map for a kind are dropped while building the row.

const PRODUCT_FIELDS: &[Accessor<Product>] = &[
    Accessor { field: "product_id", value: |p| format_number(p.product_id) },
    Accessor { field: "name", value: |p| p.name.clone() },
    Accessor { field: "sku", value: |p| p.sku.clone() },
    Accessor { field: "stock", value: |p| format_number(p.stock) },
];

const PURCHASE_FIELDS: &[Accessor<Purchase>] = &[
    Accessor { field: "purchase_id", value: |p| format_number(p.purchase_id) },
    Accessor { field: "product_id", value: |p| format_number(p.product_id) },
    Accessor { field: "quantity_order", value: |p| format_number(p.quantity_order) },
    Accessor { field: "quantity_accepted", value: |p| format_number(p.quantity_accepted) },
    Accessor { field: "description", value: |p| p.description.clone() },
    Accessor { field: "invoice_number", value: |p| p.invoice_number.clone() },
    Accessor { field: "cost", value: |p| format_number(p.cost) },
    Accessor { field: "date", value: |p| format_date(&p.date) },
    Accessor { field: "is_finish", value: |p| p.is_finish.to_string() },
    Accessor { field: "total", value: |p| format_number(p.total) },
];

const ORDER_FIELDS: &[Accessor<Order>] = &[
    Accessor { field: "order_id", value: |o| format_number(o.order_id) },
    Accessor { field: "order_id_format", value: |o| o.order_id_format.clone() },
    Accessor { field: "product_id", value: |o| format_number(o.product_id) },
    Accessor { field: "quantity", value: |o| format_number(o.quantity) },
    Accessor { field: "description", value: |o| o.description.clone() },
    Accessor { field: "date", value: |o| format_date(&o.date) },
    Accessor { field: "price", value: |o| format_number(o.price) },
    Accessor { field: "total", value: |o| format_number(o.total) },
];

const PRODUCT_VALUATION_FIELDS: &[Accessor<ProductAvgValue>] = &[
    Accessor { field: "average_cost", value: |v| format_number(v.average_cost) },
    Accessor { field: "total", value: |v| format_number(v.total) },
];

const ORDER_VALUATION_FIELDS: &[Accessor<OrderWithProductValue>] = &[
    Accessor { field: "average_cost", value: |v| format_number(v.average_cost) },
    Accessor { field: "total", value: |v| format_number(v.total) },
    Accessor { field: "profit", value: |v| format_number(v.profit) },
];

/// Accumulates the header (first element only) and the data row of one entity
struct RowBuilder<'a> {
    registry: &'a MappingRegistry,
    kind: EntityKind,
    header: Option<Row>,
    row: Row,
}

impl<'a> RowBuilder<'a> {
    fn new(registry: &'a MappingRegistry, kind: EntityKind, with_header: bool) -> Self {
        Self {
            registry,
            kind,
            header: with_header.then(Vec::new),
            row: Vec::new(),
        }
    }

    fn section<T>(&mut self, component: Component, fields: &[Accessor<T>], entity: &T) {
        for accessor in fields {
            let Some(label) = self.registry.label_for(self.kind, component, accessor.field)
            else {
                continue;
            };
            if let Some(header) = self.header.as_mut() {
                header.push(label.to_string());
            }
            self.row.push((accessor.value)(entity));
        }
    }
}

/// An entity that can fill the sections of its kind's layout
trait Tabular {
    /// Returns false when this entity has no such component
    fn write_component(&self, component: Component, builder: &mut RowBuilder<'_>) -> bool;
}

impl Tabular for Product {
    fn write_component(&self, component: Component, builder: &mut RowBuilder<'_>) -> bool {
        match component {
            Component::Product => builder.section(component, PRODUCT_FIELDS, self),
            _ => return false,
        }
        true
    }
}

impl Tabular for PurchaseWithProduct {
    fn write_component(&self, component: Component, builder: &mut RowBuilder<'_>) -> bool {
        match component {
            Component::Purchase => builder.section(component, PURCHASE_FIELDS, &self.purchase),
            Component::Product => builder.section(component, PRODUCT_FIELDS, &self.product),
            _ => return false,
        }
        true
    }
}

impl Tabular for OrderWithProduct {
    fn write_component(&self, component: Component, builder: &mut RowBuilder<'_>) -> bool {
        match component {
            Component::Order => builder.section(component, ORDER_FIELDS, &self.order),
            Component::Product => builder.section(component, PRODUCT_FIELDS, &self.product),
            _ => return false,
        }
        true
    }
}

impl Tabular for ProductAvgValue {
    fn write_component(&self, component: Component, builder: &mut RowBuilder<'_>) -> bool {
        match component {
            Component::Product => builder.section(component, PRODUCT_FIELDS, &self.product),
            Component::Valuation => builder.section(component, PRODUCT_VALUATION_FIELDS, self),
            _ => return false,
        }
        true
    }
}

impl Tabular for OrderWithProductValue {
    fn write_component(&self, component: Component, builder: &mut RowBuilder<'_>) -> bool {
        let inner = &self.order_with_product;
        match component {
            Component::Order => builder.section(component, ORDER_FIELDS, &inner.order),
            Component::Valuation => builder.section(component, ORDER_VALUATION_FIELDS, self),
            Component::Product => builder.section(component, PRODUCT_FIELDS, &inner.product),
            Component::Purchase => return false,
        }
        true
    }
}

/// Projects entities into rows using a mapping registry
pub struct TabularExporter<'a> {
    registry: &'a MappingRegistry,
}

impl Default for TabularExporter<'static> {
    fn default() -> Self {
        Self::new(MappingRegistry::standard())
    }
}

impl<'a> TabularExporter<'a> {
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self { registry }
    }

    /// Rows for `data` exported as `kind`.
    ///
    /// Collections produce a header row followed by one row per element, in
    /// input order; an empty collection produces nothing. Summaries produce
    /// one-cell `label : value` lines. Data that does not belong to `kind`
    /// produces nothing.
    pub fn export_to_rows(&self, kind: EntityKind, data: &ExportData) -> Vec<Row> {
        if data.kind() != kind {
            debug!(kind = %kind, data = %data.kind(), "export data does not match kind");
            return Vec::new();
        }

        match data {
            ExportData::Products(items) => self.table_rows(kind, items),
            ExportData::Purchases(items) => self.table_rows(kind, items),
            ExportData::Orders(items) => self.table_rows(kind, items),
            ExportData::ProductValues(items) => self.table_rows(kind, items),
            ExportData::OrderValues(items) => self.table_rows(kind, items),
            ExportData::ProductSummary(summary) => {
                self.summary_rows(kind, |field| product_summary_value(summary, field))
            }
            ExportData::OrderSummary(summary) => {
                self.summary_rows(kind, |field| order_summary_value(summary, field))
            }
        }
    }

    fn table_rows<T: Tabular>(&self, kind: EntityKind, items: &[T]) -> Vec<Row> {
        let layout = self.registry.layout(kind);
        if layout.is_empty() {
            return Vec::new();
        }

        let mut rows = Vec::with_capacity(items.len() + 1);
        for (index, item) in items.iter().enumerate() {
            let mut builder = RowBuilder::new(self.registry, kind, index == 0);
            for section in layout {
                if !item.write_component(section.component, &mut builder) {
                    warn!(kind = %kind, component = ?section.component, "entity lacks component");
                    return Vec::new();
                }
            }
            if let Some(header) = builder.header {
                rows.push(header);
            }
            rows.push(builder.row);
        }
        rows
    }

    fn summary_rows(&self, kind: EntityKind, value: impl Fn(&str) -> String) -> Vec<Row> {
        self.registry
            .summary_labels(kind)
            .iter()
            .map(|(field, label)| vec![format!("{} : {}", label, value(*field))])
            .collect()
    }
}

fn product_summary_value(summary: &SummaryAvgValue, field: &str) -> String {
    match field {
        "date_print" => summary.date_print.clone(),
        "total_sku" => format_number(summary.total_sku),
        "total_product" => format_number(summary.total_product),
        "total_value" => format_number(summary.total_value),
        _ => String::new(),
    }
}

fn order_summary_value(summary: &SummaryOrderWithProductValue, field: &str) -> String {
    match field {
        "date_print" => summary.date_print.clone(),
        "date" => summary.date.clone(),
        "total_price" => format_number(summary.total_price),
        "total_profit" => format_number(summary.total_profit),
        "total_sold" => format_number(summary.total_sold),
        "total_item" => format_number(summary.total_item),
        _ => String::new(),
    }
}
