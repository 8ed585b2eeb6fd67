//! Write side for hand-entered products, purchases and orders
//!
//! Inserts go through [`RowWriter`] exactly like imported rows; updates are
//! built from the same column list. Purchases are stored together with their
//! delivery details in one transaction.

use super::{RowWriter, Storage};
use crate::error::{IjahError, IjahResult};
use crate::interchange::coercion::{format_date, format_number, parse_date, split_order_reference};
use crate::types::{OrderInput, ProductInput, PurchaseDetailInput, PurchaseInput, SeedRecord};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use tracing::info;

/// A table and its integer key column
struct Target {
    table: &'static str,
    key: &'static str,
}

const PRODUCT: Target = Target {
    table: "product",
    key: "product_id",
};
const PURCHASE: Target = Target {
    table: "purchase",
    key: "purchase_id",
};
const PURCHASE_DETAIL: Target = Target {
    table: "purchase_detail",
    key: "purchase_detail_id",
};
const ORDER: Target = Target {
    table: "orders",
    key: "order_id",
};

fn entry_date(text: &str) -> IjahResult<String> {
    Ok(format_date(&parse_date(text)?))
}

fn product_record(input: &ProductInput) -> SeedRecord {
    SeedRecord::new(PRODUCT.table)
        .with("name", input.name.trim())
        .with("sku", input.sku.trim())
        .with("stock", format_number(input.stock))
}

fn purchase_record(input: &PurchaseInput) -> IjahResult<SeedRecord> {
    Ok(SeedRecord::new(PURCHASE.table)
        .with("product_id", format_number(input.product_id))
        .with("quantity_order", format_number(input.quantity_order))
        .with("quantity_accepted", format_number(input.quantity_accepted))
        .with("description", input.description.as_str())
        .with("invoice_number", input.invoice_number.trim())
        .with("cost", format_number(input.cost))
        .with("date", entry_date(&input.date)?)
        .with("is_finish", if input.is_finish { "1" } else { "0" }))
}

fn detail_record(purchase_id: i64, input: &PurchaseDetailInput) -> IjahResult<SeedRecord> {
    Ok(SeedRecord::new(PURCHASE_DETAIL.table)
        .with("purchase_id", format_number(purchase_id))
        .with("quantity", format_number(input.quantity))
        .with("description", input.description.as_str())
        .with("date", entry_date(&input.date)?))
}

/// An empty order code is taken from a `<note> <code>` description
fn order_record(input: &OrderInput) -> IjahResult<SeedRecord> {
    let code = match input.order_id_format.trim() {
        "" => split_order_reference(&input.description),
        code => code.to_string(),
    };
    Ok(SeedRecord::new(ORDER.table)
        .with("order_id_format", code)
        .with("product_id", format_number(input.product_id))
        .with("quantity", format_number(input.quantity))
        .with("description", input.description.as_str())
        .with("date", entry_date(&input.date)?)
        .with("price", format_number(input.price)))
}

/// Insert `record`, or overwrite row `id` when one is given. Returns the row id.
fn upsert(conn: &Connection, target: &Target, record: &SeedRecord, id: Option<i64>) -> IjahResult<i64> {
    let Some(id) = id else {
        conn.insert(record)?;
        return Ok(conn.last_insert_rowid());
    };

    let assignments: Vec<String> = record
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", c.column, i + 1))
        .collect();
    let query = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        target.table,
        assignments.join(", "),
        target.key,
        record.columns.len() + 1
    );

    let mut values: Vec<Value> = record
        .columns
        .iter()
        .map(|c| Value::Text(c.value.clone()))
        .collect();
    values.push(Value::Integer(id));

    if conn.execute(&query, params_from_iter(values))? == 0 {
        return Err(IjahError::RecordNotFound {
            table: target.table,
            id,
        });
    }
    Ok(id)
}

/// Purchases and orders must point at an existing product
fn ensure_product(conn: &Connection, product_id: i64) -> IjahResult<()> {
    conn.query_row(
        "SELECT product_id FROM product WHERE product_id = ?1",
        [product_id],
        |row| row.get::<_, i64>(0),
    )
    .optional()?
    .map(|_| ())
    .ok_or(IjahError::RecordNotFound {
        table: PRODUCT.table,
        id: product_id,
    })
}

impl Storage {
    /// Insert or update a product; returns its id
    pub fn store_product(&self, input: &ProductInput) -> IjahResult<i64> {
        let id = upsert(&self.conn, &PRODUCT, &product_record(input), input.product_id)?;
        info!(product_id = id, sku = %input.sku, "product stored");
        Ok(id)
    }

    /// Delete a product by id. Returns false when there was no such product.
    pub fn delete_product(&self, product_id: i64) -> IjahResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM product WHERE product_id = ?1", [product_id])?;
        if deleted > 0 {
            info!(product_id, "product deleted");
        }
        Ok(deleted > 0)
    }

    /// Insert or update a purchase and store its details. Either everything
    /// is written or nothing is.
    pub fn store_purchase(&mut self, input: &PurchaseInput) -> IjahResult<i64> {
        let record = purchase_record(input)?;

        let tx = self.conn.transaction()?;
        ensure_product(&tx, input.product_id)?;
        let purchase_id = upsert(&tx, &PURCHASE, &record, input.purchase_id)?;
        for detail in &input.details {
            upsert(
                &tx,
                &PURCHASE_DETAIL,
                &detail_record(purchase_id, detail)?,
                detail.purchase_detail_id,
            )?;
        }
        tx.commit()?;

        info!(
            purchase_id,
            details = input.details.len(),
            "purchase stored"
        );
        Ok(purchase_id)
    }

    /// Insert or update a sale; returns its id
    pub fn store_order(&self, input: &OrderInput) -> IjahResult<i64> {
        let record = order_record(input)?;
        ensure_product(&self.conn, input.product_id)?;
        let order_id = upsert(&self.conn, &ORDER, &record, input.order_id)?;
        info!(order_id, "order stored");
        Ok(order_id)
    }
}
