//! SQLite store for products, purchases and orders

mod query;
mod record;
mod seed;

pub use seed::{ReferenceResolver, RowWriter};

use crate::error::IjahResult;
use crate::types::SeedRecord;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS product (
    product_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(30) NOT NULL,
    sku VARCHAR(30) NOT NULL UNIQUE,
    stock INT UNSIGNED NOT NULL
);

CREATE TABLE IF NOT EXISTS purchase (
    purchase_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INT UNSIGNED NOT NULL,
    quantity_order INT UNSIGNED NOT NULL,
    quantity_accepted INT UNSIGNED NOT NULL,
    description TEXT DEFAULT (''),
    invoice_number VARCHAR(30) NOT NULL,
    cost DECIMAL(10, 2) NOT NULL,
    date TEXT NOT NULL,
    is_finish BOOLEAN DEFAULT (0)
);

CREATE TABLE IF NOT EXISTS purchase_detail (
    purchase_detail_id INTEGER PRIMARY KEY AUTOINCREMENT,
    purchase_id INT UNSIGNED NOT NULL,
    quantity INT UNSIGNED NOT NULL,
    description TEXT DEFAULT (''),
    date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    order_id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id_format VARCHAR(30) NOT NULL,
    product_id INT UNSIGNED NOT NULL,
    quantity INT UNSIGNED NOT NULL,
    description TEXT NOT NULL,
    date TEXT NOT NULL,
    price DECIMAL(10, 2) NOT NULL
);
"#;

/// Owns the database connection
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) a database file; parent directories are created
    pub fn open<P: AsRef<Path>>(path: P) -> IjahResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open a database file and create any missing tables
    pub fn open_migrated<P: AsRef<Path>>(path: P) -> IjahResult<Self> {
        let storage = Self::open(path)?;
        storage.migrate()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> IjahResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Start a transaction; dropping it without commit rolls back
    pub fn transaction(&mut self) -> IjahResult<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Create missing tables
    pub fn migrate(&self) -> IjahResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        info!("storage schema is up to date");
        Ok(())
    }

    /// Insert the two demo products
    pub fn seed_demo(&self) -> IjahResult<()> {
        let records = [
            SeedRecord::new("product")
                .with("name", "BULUGUL MARAM")
                .with("sku", "SSI-D00791077-MM-BM")
                .with("stock", "10"),
            SeedRecord::new("product")
                .with("name", "RIYADUS SHALIHIN")
                .with("sku", "SSI-D00791077-MM-RS")
                .with("stock", "20"),
        ];
        for record in &records {
            self.conn.insert(record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let storage = Storage::open_in_memory().unwrap();
        storage.migrate().unwrap();
        storage.migrate().unwrap();

        let tables: i64 = storage
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('product', 'purchase', 'purchase_detail', 'orders')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn test_seed_demo_products() {
        let storage = Storage::open_in_memory().unwrap();
        storage.migrate().unwrap();
        storage.seed_demo().unwrap();

        let products = storage.fetch_products().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].sku, "SSI-D00791077-MM-BM");
        assert_eq!(products[1].stock, 20);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ijahshop.db");
        Storage::open_migrated(&path).unwrap();
        assert!(path.exists());
    }
}
