//! Storage integration tests: schema, seams and the fetch API

use chrono::NaiveDate;
use ijahshop::storage::{ReferenceResolver, RowWriter, Storage};
use ijahshop::types::{DateRange, SeedRecord};
use ijahshop::IjahError;
use tempfile::TempDir;

fn storage() -> Storage {
    let storage = Storage::open_in_memory().unwrap();
    storage.migrate().unwrap();
    storage
}

fn order(date: &str) -> SeedRecord {
    SeedRecord::new("orders")
        .with("order_id_format", "ID-1")
        .with("product_id", "1")
        .with("quantity", "1")
        .with("description", "Pesanan ID-1")
        .with("date", date)
        .with("price", "10000")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, d).unwrap()
}

#[test]
fn test_database_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("files").join("ijahshop.db");

    {
        let storage = Storage::open_migrated(&path).unwrap();
        storage.seed_demo().unwrap();
    }

    let storage = Storage::open_migrated(&path).unwrap();
    let products = storage.fetch_products().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(
        storage.connection().resolve_sku("SSI-D00791077-MM-RS").unwrap(),
        2
    );
}

#[test]
fn test_resolver_sees_uncommitted_rows_in_transaction() {
    let mut storage = storage();
    let tx = storage.transaction().unwrap();
    tx.insert(
        &SeedRecord::new("product")
            .with("name", "Kaos")
            .with("sku", "K-1")
            .with("stock", "3"),
    )
    .unwrap();
    assert_eq!(tx.resolve_sku("K-1").unwrap(), 1);
    drop(tx);

    assert!(matches!(
        storage.connection().resolve_sku("K-1"),
        Err(IjahError::ReferenceNotFound(_))
    ));
}

#[test]
fn test_range_excludes_start_midnight_and_includes_end_of_day() {
    let storage = storage();
    storage.seed_demo().unwrap();
    let conn = storage.connection();
    for date in [
        "2018-01-01 00:00:00",
        "2018-01-01 00:00:01",
        "2018-01-05 23:59:59",
        "2018-01-06 00:00:00",
    ] {
        conn.insert(&order(date)).unwrap();
    }

    let range = DateRange::new(day(1), day(5));
    let dates: Vec<String> = storage
        .fetch_orders(Some(&range))
        .unwrap()
        .iter()
        .map(|o| o.order.date.to_string())
        .collect();
    assert_eq!(dates, vec!["2018-01-01 00:00:01", "2018-01-05 23:59:59"]);

    assert_eq!(storage.fetch_orders(None).unwrap().len(), 4);
}

#[test]
fn test_corrupt_stored_date_is_a_storage_error() {
    let storage = storage();
    storage.seed_demo().unwrap();
    storage.connection().insert(&order("kemarin")).unwrap();

    assert!(matches!(
        storage.fetch_orders(None),
        Err(IjahError::Storage(_))
    ));
}

#[test]
fn test_purchase_fetch_by_id() {
    let storage = storage();
    storage.seed_demo().unwrap();
    storage
        .connection()
        .insert(
            &SeedRecord::new("purchase")
                .with("product_id", "2")
                .with("quantity_order", "4")
                .with("quantity_accepted", "3")
                .with("description", "Kurang satu")
                .with("invoice_number", "20180102-69539")
                .with("cost", "52000.00")
                .with("date", "2018-01-02 10:00:00")
                .with("is_finish", "1"),
        )
        .unwrap();

    let purchase = storage.fetch_purchase(1).unwrap().unwrap();
    assert_eq!(purchase.purchase.cost, 52_000);
    assert_eq!(purchase.purchase.total, 208_000);
    assert!(purchase.purchase.is_finish);
    assert_eq!(purchase.product.sku, "SSI-D00791077-MM-RS");
    assert!(storage.fetch_purchase(2).unwrap().is_none());
}

#[test]
fn test_product_value_rounds_average_cost() {
    let storage = storage();
    storage.seed_demo().unwrap();
    for cost in ["1000", "1001"] {
        storage
            .connection()
            .insert(
                &SeedRecord::new("purchase")
                    .with("product_id", "1")
                    .with("quantity_order", "1")
                    .with("quantity_accepted", "1")
                    .with("invoice_number", "INV")
                    .with("cost", cost)
                    .with("date", "2018-01-02 10:00:00"),
            )
            .unwrap();
    }

    let value = storage.fetch_product_value(1).unwrap().unwrap();
    // AVG = 1000.5, ROUND rounds half away from zero
    assert_eq!(value.average_cost, 1001);
    assert_eq!(value.total, 1001 * 10);
}
