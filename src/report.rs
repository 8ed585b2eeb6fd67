//! Valuation reports and per-kind export
//!
//! A report is a table plus a summary block. Written out, the summary lines
//! come first, then one empty line, then the table.

use crate::error::{IjahError, IjahResult};
use crate::interchange::coercion::format_date;
use crate::interchange::TabularExporter;
use crate::storage::Storage;
use crate::types::{
    DateRange, EntityKind, ExportData, OrderWithProductValue, ProductAvgValue, Row,
    SummaryAvgValue, SummaryOrderWithProductValue,
};
use crate::writer::{write_export, ExportFormat};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductValueReport {
    pub values: Vec<ProductAvgValue>,
    pub summary: SummaryAvgValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderValueReport {
    pub orders: Vec<OrderWithProductValue>,
    pub summary: SummaryOrderWithProductValue,
}

fn overflow(what: &str) -> IjahError {
    IjahError::Export(format!("{} does not fit in a 64-bit integer", what))
}

fn accumulate(sum: &mut i64, value: i64, what: &str) -> IjahResult<()> {
    *sum = sum.checked_add(value).ok_or_else(|| overflow(what))?;
    Ok(())
}

/// Stock value of every product at its average purchase cost
pub fn product_value_report(storage: &Storage, now: NaiveDateTime) -> IjahResult<ProductValueReport> {
    let values = storage.fetch_product_values()?;

    let mut summary = SummaryAvgValue {
        date_print: format_date(&now),
        ..Default::default()
    };
    for value in &values {
        summary.total_sku += 1;
        accumulate(&mut summary.total_product, value.product.stock, "total stock")?;
        accumulate(&mut summary.total_value, value.total, "total value")?;
    }

    Ok(ProductValueReport { values, summary })
}

/// Sales in `range`, each valued against its product's average purchase cost.
///
/// Profit is the order total minus the average cost of one unit, not of the
/// quantity sold.
pub fn order_value_report(
    storage: &Storage,
    range: &DateRange,
    now: NaiveDateTime,
) -> IjahResult<OrderValueReport> {
    let orders = storage.fetch_orders(Some(range))?;

    let mut summary = SummaryOrderWithProductValue {
        date_print: format_date(&now),
        date: range.label(),
        ..Default::default()
    };
    let mut average_costs: HashMap<i64, i64> = HashMap::new();
    let mut valued = Vec::with_capacity(orders.len());

    for order_with_product in orders {
        let product_id = order_with_product.order.product_id;
        let average_cost = match average_costs.get(&product_id) {
            Some(cost) => *cost,
            None => {
                let cost = storage
                    .fetch_product_value(product_id)?
                    .map(|value| value.average_cost)
                    .unwrap_or_default();
                average_costs.insert(product_id, cost);
                cost
            }
        };

        let total = order_with_product.order.total;
        let profit = total
            .checked_sub(average_cost)
            .ok_or_else(|| overflow("profit"))?;

        accumulate(&mut summary.total_price, total, "total price")?;
        accumulate(&mut summary.total_profit, profit, "total profit")?;
        accumulate(&mut summary.total_item, order_with_product.order.quantity, "total items")?;
        summary.total_sold += 1;

        valued.push(OrderWithProductValue {
            order_with_product,
            average_cost,
            total,
            profit,
        });
    }

    Ok(OrderValueReport {
        orders: valued,
        summary,
    })
}

impl ProductValueReport {
    pub fn to_rows(&self, exporter: &TabularExporter<'_>) -> Vec<Row> {
        with_summary(
            exporter.export_to_rows(
                EntityKind::ProductValueSummary,
                &ExportData::ProductSummary(self.summary.clone()),
            ),
            exporter.export_to_rows(
                EntityKind::ProductAverageValue,
                &ExportData::ProductValues(self.values.clone()),
            ),
        )
    }
}

impl OrderValueReport {
    pub fn to_rows(&self, exporter: &TabularExporter<'_>) -> Vec<Row> {
        with_summary(
            exporter.export_to_rows(
                EntityKind::OrderValueSummary,
                &ExportData::OrderSummary(self.summary.clone()),
            ),
            exporter.export_to_rows(
                EntityKind::OrderValue,
                &ExportData::OrderValues(self.orders.clone()),
            ),
        )
    }
}

fn with_summary(mut summary: Vec<Row>, table: Vec<Row>) -> Vec<Row> {
    summary.push(Vec::new());
    summary.extend(table);
    summary
}

fn require_range(kind: EntityKind, range: Option<&DateRange>) -> IjahResult<&DateRange> {
    range.ok_or_else(|| {
        IjahError::Export(format!("'{}' export needs a date_start and date_end", kind))
    })
}

/// Fetch what `kind` needs and project it into rows.
///
/// Order valuation kinds require a date range; purchases and orders use it
/// as a filter when given. The report kinds include their summary block.
pub fn rows_for_kind(
    storage: &Storage,
    kind: EntityKind,
    range: Option<&DateRange>,
    now: NaiveDateTime,
) -> IjahResult<Vec<Row>> {
    let exporter = TabularExporter::default();

    let rows = match kind {
        EntityKind::Product => {
            exporter.export_to_rows(kind, &ExportData::Products(storage.fetch_products()?))
        }
        EntityKind::PurchaseWithProduct => {
            exporter.export_to_rows(kind, &ExportData::Purchases(storage.fetch_purchases(range)?))
        }
        EntityKind::OrderWithProduct => {
            exporter.export_to_rows(kind, &ExportData::Orders(storage.fetch_orders(range)?))
        }
        EntityKind::ProductAverageValue => product_value_report(storage, now)?.to_rows(&exporter),
        EntityKind::ProductValueSummary => exporter.export_to_rows(
            kind,
            &ExportData::ProductSummary(product_value_report(storage, now)?.summary),
        ),
        EntityKind::OrderValue => {
            order_value_report(storage, require_range(kind, range)?, now)?.to_rows(&exporter)
        }
        EntityKind::OrderValueSummary => exporter.export_to_rows(
            kind,
            &ExportData::OrderSummary(
                order_value_report(storage, require_range(kind, range)?, now)?.summary,
            ),
        ),
    };
    Ok(rows)
}

/// Export one kind to `<dir>/<export name>.<ext>` and return the path
pub fn export_kind(
    storage: &Storage,
    kind: EntityKind,
    range: Option<&DateRange>,
    dir: &Path,
    format: ExportFormat,
    now: NaiveDateTime,
) -> IjahResult<PathBuf> {
    info!(kind = %kind, format = %format, "exporting");
    let rows = rows_for_kind(storage, kind, range, now)?;
    let name = crate::interchange::MappingRegistry::standard().export_name(kind);
    write_export(dir, name, format, &rows)
}
