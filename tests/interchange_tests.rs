//! Interchange integration tests
//!
//! Export rows, workbooks built with rust_xlsxwriter, and imports into
//! in-memory storage.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use ijahshop::interchange::{
    read_workbook, MappingRegistry, SpreadsheetImporter, TabularExporter, UnresolvedReference,
};
use ijahshop::storage::{RowWriter, Storage};
use ijahshop::types::{
    EntityKind, ExportData, Order, OrderWithProduct, OrderWithProductValue, Product,
    ProductAvgValue, Purchase, PurchaseWithProduct, Row, SeedRecord, Sheet,
};
use ijahshop::writer::write_xlsx;
use ijahshop::IjahError;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 1, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn fixed_now() -> NaiveDateTime {
    at(20, 12, 0)
}

fn row(cells: &[&str]) -> Row {
    cells.iter().map(|c| c.to_string()).collect()
}

fn storage() -> Storage {
    let storage = Storage::open_in_memory().unwrap();
    storage.migrate().unwrap();
    storage
}

/// Multi-sheet workbook; empty cells are left blank
fn write_workbook(path: &Path, sheets: &[(&str, Vec<Row>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, cells) in rows.iter().enumerate() {
            for (c, cell) in cells.iter().enumerate() {
                if !cell.is_empty() {
                    worksheet
                        .write_string(r as u32, c as u16, cell.as_str())
                        .unwrap();
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

fn product(id: i64, name: &str, sku: &str, stock: i64) -> Product {
    Product {
        product_id: id,
        name: name.to_string(),
        sku: sku.to_string(),
        stock,
    }
}

/// Storage with two products, two purchases and two orders
fn shop() -> Storage {
    let storage = storage();
    let conn = storage.connection();
    for (name, sku, stock) in [
        ("Zalekia Plain Casual Blouse", "SSI-D00791015-LL-BWH", "8"),
        ("Deva Lace Dress", "SSI-D01037807-X3-BRW", "12"),
    ] {
        conn.insert(
            &SeedRecord::new("product")
                .with("name", name)
                .with("sku", sku)
                .with("stock", stock),
        )
        .unwrap();
    }
    for (product_id, cost, date, note) in [
        ("1", "74000", "2018-01-03 08:30:00", "Masih menunggu"),
        ("2", "52000", "2018-01-04 10:15:00", ""),
    ] {
        conn.insert(
            &SeedRecord::new("purchase")
                .with("product_id", product_id)
                .with("quantity_order", "10")
                .with("quantity_accepted", "8")
                .with("description", note)
                .with("invoice_number", "20180102-69539")
                .with("cost", cost)
                .with("date", date),
        )
        .unwrap();
    }
    for (product_id, code, date) in [
        ("1", "ID-20180109-853724", "2018-01-09 14:00:00"),
        ("2", "ID-20180110-853725", "2018-01-10 09:45:00"),
    ] {
        conn.insert(
            &SeedRecord::new("orders")
                .with("order_id_format", code)
                .with("product_id", product_id)
                .with("quantity", "2")
                .with("description", format!("Pesanan {}", code))
                .with("date", date)
                .with("price", "115000"),
        )
        .unwrap();
    }
    storage
}

fn export(kind: EntityKind, data: ExportData) -> Vec<Row> {
    TabularExporter::default().export_to_rows(kind, &data)
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT SHAPE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_every_tabular_kind_has_header_plus_one_row_per_item() {
    let shop = shop();
    let product_values = shop.fetch_product_values().unwrap();
    let orders = shop.fetch_orders(None).unwrap();
    let order_values: Vec<OrderWithProductValue> = orders
        .iter()
        .cloned()
        .map(|order_with_product| OrderWithProductValue {
            average_cost: 74_000,
            total: order_with_product.order.total,
            profit: order_with_product.order.total - 74_000,
            order_with_product,
        })
        .collect();

    let cases = vec![
        (EntityKind::Product, ExportData::Products(shop.fetch_products().unwrap())),
        (EntityKind::PurchaseWithProduct, ExportData::Purchases(shop.fetch_purchases(None).unwrap())),
        (EntityKind::OrderWithProduct, ExportData::Orders(orders)),
        (EntityKind::ProductAverageValue, ExportData::ProductValues(product_values)),
        (EntityKind::OrderValue, ExportData::OrderValues(order_values)),
    ];

    let registry = MappingRegistry::standard();
    for (kind, data) in cases {
        let rows = export(kind, data);
        assert_eq!(rows.len(), 3, "{} rows", kind);
        assert_eq!(rows[0], registry.labels(kind), "{} header", kind);
        for data_row in &rows[1..] {
            assert_eq!(data_row.len(), rows[0].len(), "{} arity", kind);
        }
    }
}

#[test]
fn test_empty_collection_exports_nothing() {
    assert!(export(EntityKind::OrderWithProduct, ExportData::Orders(vec![])).is_empty());
}

#[test]
fn test_purchase_export_row() {
    let rows = export(
        EntityKind::PurchaseWithProduct,
        ExportData::Purchases(vec![PurchaseWithProduct {
            purchase: Purchase {
                purchase_id: 7,
                product_id: 1,
                quantity_order: 10,
                quantity_accepted: 8,
                description: "Masih menunggu".to_string(),
                invoice_number: "20180102-69539".to_string(),
                cost: 74_000,
                date: at(3, 8, 30),
                is_finish: false,
                total: 740_000,
            },
            product: product(1, "Zalekia Plain Casual Blouse", "SSI-D00791015-LL-BWH", 8),
        }]),
    );

    assert_eq!(
        rows[1],
        row(&[
            "10",
            "8",
            "Masih menunggu",
            "20180102-69539",
            "74000",
            "2018-01-03 08:30:00",
            "740000",
            "Zalekia Plain Casual Blouse",
            "SSI-D00791015-LL-BWH",
        ])
    );
}

#[test]
fn test_summary_kind_renders_label_lines() {
    let rows = export(
        EntityKind::ProductValueSummary,
        ExportData::ProductSummary(ijahshop::types::SummaryAvgValue {
            date_print: "2018-01-20 12:00:00".to_string(),
            total_sku: 2,
            total_product: 20,
            total_value: 1_216_000,
        }),
    );
    assert_eq!(
        rows,
        vec![
            row(&["Tanggal Cetak : 2018-01-20 12:00:00"]),
            row(&["Jumlah SKU : 2"]),
            row(&["Jumlah Total Barang : 20"]),
            row(&["Total Nilai : 1216000"]),
        ]
    );
}

#[test]
fn test_mismatched_data_exports_nothing() {
    let rows = export(
        EntityKind::OrderWithProduct,
        ExportData::ProductValues(vec![ProductAvgValue::default()]),
    );
    assert!(rows.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUND TRIPS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_product_round_trip_through_xlsx() {
    let source = shop();
    let products = source.fetch_products().unwrap();
    let rows = export(EntityKind::Product, ExportData::Products(products.clone()));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("products.xlsx");
    let sheet = MappingRegistry::standard().export_name(EntityKind::Product);
    write_xlsx(&path, sheet, &rows).unwrap();

    let mut target = storage();
    let summary = SpreadsheetImporter::default()
        .import_workbook(&mut target, &path)
        .unwrap();
    assert_eq!(summary.records_written, 2);

    assert_eq!(target.fetch_products().unwrap(), products);
}

#[test]
fn test_whole_shop_round_trip_keeps_dates_and_references() {
    let source = shop();
    let registry = MappingRegistry::standard();
    let sheets = [
        (
            registry.export_name(EntityKind::Product),
            export(EntityKind::Product, ExportData::Products(source.fetch_products().unwrap())),
        ),
        (
            registry.export_name(EntityKind::PurchaseWithProduct),
            export(
                EntityKind::PurchaseWithProduct,
                ExportData::Purchases(source.fetch_purchases(None).unwrap()),
            ),
        ),
        (
            registry.export_name(EntityKind::OrderWithProduct),
            export(
                EntityKind::OrderWithProduct,
                ExportData::Orders(source.fetch_orders(None).unwrap()),
            ),
        ),
    ];

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.xlsx");
    write_workbook(&path, &sheets);

    let mut target = storage();
    let summary = SpreadsheetImporter::default()
        .with_policy(UnresolvedReference::Fail)
        .import_workbook(&mut target, &path)
        .unwrap();
    assert_eq!(summary.sheets_imported, 3);
    assert_eq!(summary.records_written, 6);

    assert_eq!(
        target.fetch_purchases(None).unwrap(),
        source.fetch_purchases(None).unwrap()
    );
    assert_eq!(
        target.fetch_orders(None).unwrap(),
        source.fetch_orders(None).unwrap()
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// IMPORT BEHAVIOUR
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_two_sheet_import_resolves_sku_from_earlier_sheet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Catatan Toko.xlsx");
    write_workbook(
        &path,
        &[
            (
                "Catatan Jumlah Barang",
                vec![
                    row(&["SKU", "Nama Item", "Jumlah Sekarang"]),
                    row(&["SSI-D01220307-XL-SAL", "Devibav Plain Trump Blouse", "6"]),
                ],
            ),
            (
                "Catatan Barang Masuk",
                vec![
                    row(&["Waktu", "SKU", "Nama Barang", "Jumlah Pemesanan", "Jumlah Diterima", "Harga Beli", "Total", "Nomer Kwitansi", "Catatan"]),
                    row(&["not-a-date", "SSI-D01220307-XL-SAL", "Devibav Plain Trump Blouse", "6", "6", "Rp74,000", "Rp444,000", "20180102-69539", ""]),
                ],
            ),
        ],
    );

    let mut storage = storage();
    let summary = SpreadsheetImporter::default()
        .with_clock(fixed_now)
        .import_workbook(&mut storage, &path)
        .unwrap();
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.unresolved, 0);

    let purchases = storage.fetch_purchases(None).unwrap();
    assert_eq!(purchases.len(), 1);
    let purchase = &purchases[0];
    assert_eq!(purchase.product.sku, "SSI-D01220307-XL-SAL");
    assert_eq!(purchase.purchase.cost, 74_000);
    assert_eq!(purchase.purchase.invoice_number, "20180102-69539");
    assert_eq!(purchase.purchase.date, fixed_now());
}

#[test]
fn test_opendocument_workbook_keeps_date_cells() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/barang_keluar.ods");
    let mut storage = storage();
    storage.seed_demo().unwrap();

    let summary = SpreadsheetImporter::default()
        .with_clock(fixed_now)
        .import_workbook(&mut storage, &path)
        .unwrap();
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.unresolved, 0);

    let orders = storage.fetch_orders(None).unwrap();
    let dates: Vec<NaiveDateTime> = orders.iter().map(|o| o.order.date).collect();
    assert_eq!(dates, vec![at(3, 8, 30), at(4, 0, 0)]);
    assert_eq!(orders[0].order.order_id_format, "ID-20180103-001");
    assert_eq!(orders[0].order.quantity, 2);
    assert_eq!(orders[0].order.price, 74_000);
    assert_eq!(orders[0].product.sku, "SSI-D00791077-MM-BM");
}

#[test]
fn test_malformed_date_uses_local_time_of_import() {
    let mut storage = storage();
    storage.seed_demo().unwrap();
    let sheets = vec![Sheet::new(
        "Catatan Barang Keluar",
        vec![
            row(&["SKU", "Jumlah Keluar", "Harga Jual", "Waktu", "Catatan"]),
            row(&["SSI-D00791077-MM-BM", "1", "1000", "not-a-date", "Pesanan X"]),
        ],
    )];

    let before = Local::now().naive_local().with_nanosecond(0).unwrap();
    SpreadsheetImporter::default()
        .import_sheets(&mut storage, &sheets)
        .unwrap();
    let after = Local::now().naive_local();

    let stored = storage.fetch_orders(None).unwrap()[0].order.date;
    assert!(before <= stored && stored <= after, "{} not in [{}, {}]", stored, before, after);
}

#[test]
fn test_order_sheet_splits_description() {
    let mut storage = shop();
    let sheets = vec![Sheet::new(
        "Catatan Barang Keluar",
        vec![
            row(&["SKU", "Jumlah Keluar", "Harga Jual", "Waktu", "Catatan"]),
            row(&["SSI-D01037807-X3-BRW", "1", "Rp99,000", "2018-01-15 16:20:00", "Penjualan ORD123"]),
            row(&["SSI-D01037807-X3-BRW", "1", "Rp99,000", "2018-01-15 16:25:00", "Single"]),
        ],
    )];

    SpreadsheetImporter::default()
        .import_sheets(&mut storage, &sheets)
        .unwrap();

    let orders = storage.fetch_orders(None).unwrap();
    let imported: Vec<&Order> = orders.iter().skip(2).map(|o| &o.order).collect();
    assert_eq!(imported[0].order_id_format, "ORD123");
    assert_eq!(imported[0].description, "Penjualan ORD123");
    assert_eq!(imported[0].price, 99_000);
    assert_eq!(imported[1].order_id_format, "");
    assert_eq!(imported[1].description, "Single");
}

#[test]
fn test_unknown_sheet_writes_nothing() {
    let mut storage = storage();
    let sheets = vec![Sheet::new(
        "Random Sheet",
        vec![row(&["SKU", "Nama Item"]), row(&["X-1", "Barang"])],
    )];

    let summary = SpreadsheetImporter::default()
        .import_sheets(&mut storage, &sheets)
        .unwrap();
    assert_eq!(summary.records_written, 0);
    assert_eq!(summary.sheets_skipped, 1);
    assert!(storage.fetch_products().unwrap().is_empty());
}

#[test]
fn test_unresolved_sku_defaults_to_zero_id() {
    let mut storage = storage();
    let sheets = vec![Sheet::new(
        "Catatan Barang Keluar",
        vec![
            row(&["SKU", "Jumlah Keluar", "Harga Jual", "Waktu", "Catatan"]),
            row(&["NOPE", "1", "1000", "2018-01-15 16:20:00", "Pesanan X"]),
        ],
    )];

    let summary = SpreadsheetImporter::default()
        .import_sheets(&mut storage, &sheets)
        .unwrap();
    assert_eq!(summary.unresolved, 1);

    let product_id: i64 = storage
        .connection()
        .query_row("SELECT product_id FROM orders", [], |r| r.get(0))
        .unwrap();
    assert_eq!(product_id, 0);
}

#[test]
fn test_writer_failure_rolls_back_whole_import() {
    let mut storage = storage();
    let sheets = vec![Sheet::new(
        "Catatan Jumlah Barang",
        vec![
            row(&["SKU", "Nama Item", "Jumlah Sekarang"]),
            row(&["DUP-1", "Pertama", "1"]),
            row(&["DUP-1", "Kedua", "2"]),
        ],
    )];

    let result = SpreadsheetImporter::default().import_sheets(&mut storage, &sheets);
    assert!(matches!(result, Err(IjahError::Storage(_))));
    assert!(storage.fetch_products().unwrap().is_empty());
}

#[test]
fn test_read_workbook_keeps_sheet_order_and_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("two.xlsx");
    write_workbook(
        &path,
        &[
            ("Random Sheet", vec![row(&["a", "b"])]),
            ("Catatan Jumlah Barang", vec![row(&["SKU"]), row(&["X-1"])]),
        ],
    );

    let sheets = read_workbook(&path).unwrap();
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Random Sheet", "Catatan Jumlah Barang"]);
    assert_eq!(sheets[1].rows, vec![row(&["SKU"]), row(&["X-1"])]);
}

#[test]
fn test_missing_workbook_is_an_error_before_any_write() {
    let mut storage = storage();
    let result = SpreadsheetImporter::default().import_workbook(&mut storage, "/nonexistent/toko.xlsx");
    assert!(result.is_err());
}

#[test]
fn test_order_with_product_export_uses_product_columns() {
    let rows = export(
        EntityKind::OrderWithProduct,
        ExportData::Orders(vec![OrderWithProduct {
            order: Order {
                order_id: 1,
                order_id_format: "ID-20180109-853724".to_string(),
                product_id: 1,
                quantity: 2,
                description: "Pesanan ID-20180109-853724".to_string(),
                date: at(9, 14, 0),
                price: 115_000,
                total: 230_000,
            },
            product: product(1, "Zalekia Plain Casual Blouse", "SSI-D00791015-LL-BWH", 8),
        }]),
    );
    assert_eq!(
        rows,
        vec![
            row(&["Jumlah Keluar", "Catatan", "Waktu", "Harga Jual", "Total", "Nama Barang", "SKU"]),
            row(&["2", "Pesanan ID-20180109-853724", "2018-01-09 14:00:00", "115000", "230000", "Zalekia Plain Casual Blouse", "SSI-D00791015-LL-BWH"]),
        ]
    );
}
