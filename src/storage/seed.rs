//! Import seams: natural-key resolution and dynamic row insertion

use crate::error::{IjahError, IjahResult};
use crate::types::SeedRecord;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use tracing::{debug, warn};

/// Resolves a natural key to the id storage assigned to it
pub trait ReferenceResolver {
    /// Product id for a SKU. Queried fresh on every call so rows inserted
    /// earlier in the same import are visible.
    fn resolve_sku(&self, sku: &str) -> IjahResult<i64>;
}

/// Inserts one row given as ordered (column, value) pairs
pub trait RowWriter {
    fn insert(&self, record: &SeedRecord) -> IjahResult<()>;
}

impl ReferenceResolver for Connection {
    fn resolve_sku(&self, sku: &str) -> IjahResult<i64> {
        self.query_row(
            "SELECT product_id FROM product WHERE sku = ?1",
            [sku],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| IjahError::ReferenceNotFound(sku.to_string()))
    }
}

impl RowWriter for Connection {
    /// Column names are not checked against the schema; an unknown column
    /// surfaces as the storage error of the statement.
    fn insert(&self, record: &SeedRecord) -> IjahResult<()> {
        if record.is_empty() {
            debug!(table = %record.table, "skipping empty seed record");
            return Ok(());
        }

        let columns: Vec<&str> = record.columns.iter().map(|c| c.column.as_str()).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let query = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            record.table,
            columns.join(","),
            placeholders.join(",")
        );

        self.execute(
            &query,
            params_from_iter(record.columns.iter().map(|c| c.value.as_str())),
        )
        .map_err(|e| {
            warn!(error = %e, query = %query, "failed insert into DB");
            IjahError::Storage(e)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    fn storage() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        storage.migrate().unwrap();
        storage
    }

    #[test]
    fn test_resolve_sku_after_insert() {
        let storage = storage();
        let conn = storage.connection();
        assert!(matches!(
            conn.resolve_sku("SSI-D00791015-LL-BWH"),
            Err(IjahError::ReferenceNotFound(_))
        ));

        conn.insert(
            &SeedRecord::new("product")
                .with("name", "Zalekia Plain Casual Blouse")
                .with("sku", "SSI-D00791015-LL-BWH")
                .with("stock", "8"),
        )
        .unwrap();
        assert_eq!(conn.resolve_sku("SSI-D00791015-LL-BWH").unwrap(), 1);
    }

    #[test]
    fn test_insert_binds_values_positionally() {
        let storage = storage();
        let conn = storage.connection();
        conn.insert(
            &SeedRecord::new("product")
                .with("stock", "42")
                .with("sku", "SKU-1")
                .with("name", "Kaos Polos"),
        )
        .unwrap();

        let (name, stock): (String, i64) = conn
            .query_row("SELECT name, stock FROM product WHERE sku = 'SKU-1'", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "Kaos Polos");
        assert_eq!(stock, 42);
    }

    #[test]
    fn test_unknown_column_is_a_storage_error() {
        let storage = storage();
        let result = storage
            .connection()
            .insert(&SeedRecord::new("product").with("colour", "red"));
        assert!(matches!(result, Err(IjahError::Storage(_))));
    }

    #[test]
    fn test_constraint_violation_is_a_storage_error() {
        let storage = storage();
        let conn = storage.connection();
        let record = SeedRecord::new("product")
            .with("name", "A")
            .with("sku", "DUP")
            .with("stock", "1");
        conn.insert(&record).unwrap();
        assert!(matches!(conn.insert(&record), Err(IjahError::Storage(_))));
    }
}
