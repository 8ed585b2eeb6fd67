//! Read side: entities assembled from joined rows

use super::Storage;
use crate::error::IjahResult;
use crate::interchange::coercion::{format_date, parse_stored_date};
use crate::types::{
    DateRange, Order, OrderWithProduct, Product, ProductAvgValue, Purchase, PurchaseDetail,
    PurchaseWithProduct,
};
use chrono::NaiveDateTime;
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, OptionalExtension, Row};

const SELECT_PRODUCT: &str = "
    SELECT
        product_id,
        name,
        sku,
        stock
    FROM product
";

const SELECT_PURCHASE: &str = "
    SELECT
        purchase.purchase_id,
        purchase.product_id,
        purchase.quantity_order,
        purchase.quantity_accepted,
        purchase.description,
        purchase.invoice_number,
        purchase.cost,
        purchase.date,
        purchase.is_finish,
        product.name,
        product.sku,
        product.stock
    FROM purchase
    JOIN product ON purchase.product_id = product.product_id
";

const SELECT_PURCHASE_DETAIL: &str = "
    SELECT
        purchase_detail_id,
        purchase_id,
        quantity,
        description,
        date
    FROM purchase_detail
";

const SELECT_ORDER: &str = "
    SELECT
        orders.order_id,
        orders.order_id_format,
        orders.product_id,
        orders.quantity,
        orders.description,
        orders.date,
        orders.price,
        product.name,
        product.sku,
        product.stock
    FROM orders
    JOIN product ON orders.product_id = product.product_id
";

const SELECT_PRODUCT_VALUE: &str = "
    SELECT
        product.product_id,
        product.name,
        product.sku,
        product.stock,
        COALESCE(ROUND(AVG(purchase.cost)), 0) AS average_cost
    FROM product
    LEFT JOIN purchase ON product.product_id = purchase.product_id
";

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_stored_date(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Money columns are DECIMAL and may come back as INTEGER or REAL
fn money_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<i64> {
    let value: f64 = row.get(idx)?;
    Ok(value.round() as i64)
}

/// `value` (read from column `idx`) times `factor`; overflow is a range error
fn checked_total(value: i64, factor: i64, idx: usize) -> rusqlite::Result<i64> {
    value
        .checked_mul(factor)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        product_id: row.get(0)?,
        name: row.get(1)?,
        sku: row.get(2)?,
        stock: row.get(3)?,
    })
}

fn purchase_from_row(row: &Row<'_>) -> rusqlite::Result<PurchaseWithProduct> {
    let product_id: i64 = row.get(1)?;
    let quantity_order: i64 = row.get(2)?;
    let cost = money_column(row, 6)?;
    Ok(PurchaseWithProduct {
        purchase: Purchase {
            purchase_id: row.get(0)?,
            product_id,
            quantity_order,
            quantity_accepted: row.get(3)?,
            description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            invoice_number: row.get(5)?,
            cost,
            date: date_column(row, 7)?,
            is_finish: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
            total: checked_total(cost, quantity_order, 6)?,
        },
        product: Product {
            product_id,
            name: row.get(9)?,
            sku: row.get(10)?,
            stock: row.get(11)?,
        },
    })
}

fn purchase_detail_from_row(row: &Row<'_>) -> rusqlite::Result<PurchaseDetail> {
    Ok(PurchaseDetail {
        purchase_detail_id: row.get(0)?,
        purchase_id: row.get(1)?,
        quantity: row.get(2)?,
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        date: date_column(row, 4)?,
    })
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<OrderWithProduct> {
    let product_id: i64 = row.get(2)?;
    let quantity: i64 = row.get(3)?;
    let price = money_column(row, 6)?;
    Ok(OrderWithProduct {
        order: Order {
            order_id: row.get(0)?,
            order_id_format: row.get(1)?,
            product_id,
            quantity,
            description: row.get(4)?,
            date: date_column(row, 5)?,
            price,
            total: checked_total(price, quantity, 6)?,
        },
        product: Product {
            product_id,
            name: row.get(7)?,
            sku: row.get(8)?,
            stock: row.get(9)?,
        },
    })
}

fn product_value_from_row(row: &Row<'_>) -> rusqlite::Result<ProductAvgValue> {
    let product = product_from_row(row)?;
    let average_cost = money_column(row, 4)?;
    Ok(ProductAvgValue {
        total: checked_total(average_cost, product.stock, 4)?,
        product,
        average_cost,
    })
}

fn range_params(range: &DateRange) -> [Value; 2] {
    [
        Value::Text(format_date(&range.start_bound())),
        Value::Text(format_date(&range.end_bound())),
    ]
}

impl Storage {
    pub fn fetch_products(&self) -> IjahResult<Vec<Product>> {
        let query = format!("{} ORDER BY product_id", SELECT_PRODUCT);
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map([], product_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn fetch_product(&self, product_id: i64) -> IjahResult<Option<Product>> {
        let query = format!("{} WHERE product_id = ?1", SELECT_PRODUCT);
        Ok(self
            .conn
            .query_row(&query, [product_id], product_from_row)
            .optional()?)
    }

    /// Purchases with their product, optionally limited to a day range
    pub fn fetch_purchases(&self, range: Option<&DateRange>) -> IjahResult<Vec<PurchaseWithProduct>> {
        let mut query = SELECT_PURCHASE.to_string();
        let params: Vec<Value> = match range {
            Some(range) => {
                query.push_str(" WHERE purchase.date > ?1 AND purchase.date <= ?2");
                range_params(range).to_vec()
            }
            None => Vec::new(),
        };
        query.push_str(" ORDER BY purchase.purchase_id");

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(params), purchase_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn fetch_purchase(&self, purchase_id: i64) -> IjahResult<Option<PurchaseWithProduct>> {
        let query = format!("{} WHERE purchase.purchase_id = ?1", SELECT_PURCHASE);
        Ok(self
            .conn
            .query_row(&query, [purchase_id], purchase_from_row)
            .optional()?)
    }

    /// Deliveries recorded against one purchase, oldest first
    pub fn fetch_purchase_details(&self, purchase_id: i64) -> IjahResult<Vec<PurchaseDetail>> {
        let query = format!(
            "{} WHERE purchase_id = ?1 ORDER BY purchase_detail_id",
            SELECT_PURCHASE_DETAIL
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map([purchase_id], purchase_detail_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Orders with their product, optionally limited to a day range
    pub fn fetch_orders(&self, range: Option<&DateRange>) -> IjahResult<Vec<OrderWithProduct>> {
        let mut query = SELECT_ORDER.to_string();
        let params: Vec<Value> = match range {
            Some(range) => {
                query.push_str(" WHERE orders.date > ?1 AND orders.date <= ?2");
                range_params(range).to_vec()
            }
            None => Vec::new(),
        };
        query.push_str(" ORDER BY orders.order_id");

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(params), order_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn fetch_order(&self, order_id: i64) -> IjahResult<Option<OrderWithProduct>> {
        let query = format!("{} WHERE orders.order_id = ?1", SELECT_ORDER);
        Ok(self
            .conn
            .query_row(&query, [order_id], order_from_row)
            .optional()?)
    }

    /// Every product valued at its average purchase cost
    pub fn fetch_product_values(&self) -> IjahResult<Vec<ProductAvgValue>> {
        let query = format!(
            "{} GROUP BY product.product_id ORDER BY product.product_id",
            SELECT_PRODUCT_VALUE
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map([], product_value_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn fetch_product_value(&self, product_id: i64) -> IjahResult<Option<ProductAvgValue>> {
        let query = format!(
            "{} WHERE product.product_id = ?1 GROUP BY product.product_id",
            SELECT_PRODUCT_VALUE
        );
        Ok(self
            .conn
            .query_row(&query, [product_id], product_value_from_row)
            .optional()?)
    }
}
