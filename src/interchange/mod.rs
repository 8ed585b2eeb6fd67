//! Tabular interchange: spreadsheet rows in, labelled rows out

pub mod coercion;
pub mod exporter;
pub mod importer;
pub mod mapping;

pub use exporter::TabularExporter;
pub use importer::{read_workbook, ImportSummary, SpreadsheetImporter, UnresolvedReference};
pub use mapping::MappingRegistry;
