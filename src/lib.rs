//! Ijah - inventory bookkeeping with spreadsheet interchange
//!
//! Products, purchases and sales live in SQLite. This library moves them in
//! and out of spreadsheets:
//!
//! - a static mapping registry ties storage columns to the Indonesian column
//!   labels used in the shop's workbooks
//! - the tabular exporter turns entities (and valuation reports) into rows for
//!   CSV or XLSX files
//! - the spreadsheet importer reads a workbook, resolves SKUs to product ids
//!   and inserts every row inside one transaction
//!
//! # Example
//!
//! ```no_run
//! use ijahshop::interchange::{SpreadsheetImporter, TabularExporter};
//! use ijahshop::storage::Storage;
//! use ijahshop::types::{EntityKind, ExportData};
//!
//! let mut storage = Storage::open_migrated("files/ijahshop.db")?;
//! let summary = SpreadsheetImporter::default().import_workbook(&mut storage, "files/Toko.xlsx")?;
//! println!("{} rows imported", summary.records_written);
//!
//! let products = storage.fetch_products()?;
//! let rows = TabularExporter::default().export_to_rows(EntityKind::Product, &ExportData::Products(products));
//! println!("{} rows exported", rows.len());
//! # Ok::<(), ijahshop::error::IjahError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod interchange;
pub mod report;
pub mod storage;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use error::{IjahError, IjahResult};
pub use types::{EntityKind, ExportData, Row, SeedRecord, Sheet};
