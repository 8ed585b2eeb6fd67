//! Spreadsheet importer: workbook sheets → seed records → storage rows
//!
//! Each sheet whose name the registry knows is read header first. Header
//! cells are trimmed and looked up once; the resulting column table is reused
//! for every data row of that sheet. Data cells are coerced by the value type
//! of their field, SKU columns are resolved to a product id, and the order
//! description additionally yields the order code.
//!
//! Sheets are seeded in workbook order, so a purchase sheet can reference
//! products introduced by an earlier product sheet of the same workbook.

use super::coercion::{format_date, import_currency, import_date, split_order_reference};
use super::mapping::{FieldLabel, ImportRole, MappingRegistry, SheetTable, ValueType};
use crate::error::{IjahError, IjahResult};
use crate::storage::{ReferenceResolver, RowWriter, Storage};
use crate::types::{SeedRecord, Sheet};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// What to do with a row whose SKU matches no product
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReference {
    /// Store `0` as the product id and keep the row
    #[default]
    ZeroId,
    /// Drop the row
    SkipRow,
    /// Abort the whole import
    Fail,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnresolvedReference::ZeroId => "zero_id",
            UnresolvedReference::SkipRow => "skip_row",
            UnresolvedReference::Fail => "fail",
        })
    }
}

impl FromStr for UnresolvedReference {
    type Err = IjahError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "zero_id" => Ok(UnresolvedReference::ZeroId),
            "skip_row" => Ok(UnresolvedReference::SkipRow),
            "fail" => Ok(UnresolvedReference::Fail),
            other => Err(IjahError::Config(format!(
                "unknown unresolved reference policy '{}' (expected zero_id, skip_row or fail)",
                other
            ))),
        }
    }
}

/// Counts reported after a successful import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub sheets_imported: usize,
    pub sheets_skipped: usize,
    pub records_written: usize,
    pub unresolved: usize,
}

/// Seed records produced from one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSeed {
    pub table: &'static str,
    pub records: Vec<SeedRecord>,
    pub unresolved: usize,
}

/// Read every worksheet of an xlsx/xls/ods file as cell text
pub fn read_workbook<P: AsRef<Path>>(path: P) -> IjahResult<Vec<Sheet>> {
    let path = path.as_ref();
    // calamine reports a missing file as a format error; keep it an I/O error
    std::fs::metadata(path)
        .map_err(|e| std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;

    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        sheets.push(Sheet::new(name, rows));
    }
    Ok(sheets)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTime(dt) => excel_serial_to_text(dt.as_f64()),
        Data::DateTimeIso(iso) => iso_date_to_text(iso),
        other => other.to_string(),
    }
}

/// OpenDocument date cells carry `2018-01-03T08:30:00` or a bare `2018-01-03`
fn iso_date_to_text(iso: &str) -> String {
    NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(iso, "%Y-%m-%d")
                .map(|day| day.and_time(NaiveTime::default()))
        })
        .map(|date| format_date(&date))
        .unwrap_or_else(|_| iso.to_string())
}

/// Date cells hold a serial day count from 1899-12-30
fn excel_serial_to_text(serial: f64) -> String {
    let millis = (serial * 86_400_000.0).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.and_hms_opt(0, 0, 0))
        .and_then(|epoch| epoch.checked_add_signed(Duration::milliseconds(millis)))
        .map(|date| format_date(&date))
        .unwrap_or_else(|| serial.to_string())
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct SpreadsheetImporter<'a> {
    registry: &'a MappingRegistry,
    policy: UnresolvedReference,
    clock: fn() -> NaiveDateTime,
}

impl Default for SpreadsheetImporter<'static> {
    fn default() -> Self {
        Self::new(MappingRegistry::standard())
    }
}

impl<'a> SpreadsheetImporter<'a> {
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self {
            registry,
            policy: UnresolvedReference::default(),
            clock: local_now,
        }
    }

    pub fn with_policy(mut self, policy: UnresolvedReference) -> Self {
        self.policy = policy;
        self
    }

    /// Clock used for malformed date cells
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Import a workbook file into storage inside one transaction
    pub fn import_workbook<P: AsRef<Path>>(
        &self,
        storage: &mut Storage,
        path: P,
    ) -> IjahResult<ImportSummary> {
        let path = path.as_ref();
        info!(path = %path.display(), "importing workbook");
        let sheets = read_workbook(path)?;
        self.import_sheets(storage, &sheets)
    }

    /// Seed already-read sheets. Nothing is kept if any insert fails.
    pub fn import_sheets(
        &self,
        storage: &mut Storage,
        sheets: &[Sheet],
    ) -> IjahResult<ImportSummary> {
        let tx = storage.transaction()?;
        let summary = self.seed_sheets(&*tx, &*tx, sheets)?;
        tx.commit()?;

        info!(
            sheets = summary.sheets_imported,
            skipped = summary.sheets_skipped,
            records = summary.records_written,
            unresolved = summary.unresolved,
            "import finished"
        );
        Ok(summary)
    }

    /// Transform and write sheets one after another. The first writer
    /// failure is returned as is.
    pub fn seed_sheets<R, W>(
        &self,
        resolver: &R,
        writer: &W,
        sheets: &[Sheet],
    ) -> IjahResult<ImportSummary>
    where
        R: ReferenceResolver + ?Sized,
        W: RowWriter + ?Sized,
    {
        let mut summary = ImportSummary::default();
        for sheet in sheets {
            let Some(seed) = self.transform_sheet(sheet, resolver)? else {
                summary.sheets_skipped += 1;
                continue;
            };

            for record in &seed.records {
                writer.insert(record)?;
            }
            debug!(
                sheet = %sheet.name,
                table = seed.table,
                records = seed.records.len(),
                "sheet seeded"
            );
            summary.sheets_imported += 1;
            summary.records_written += seed.records.len();
            summary.unresolved += seed.unresolved;
        }
        Ok(summary)
    }

    /// Turn one sheet into seed records. `None` when the sheet name maps to
    /// no table.
    pub fn transform_sheet<R>(&self, sheet: &Sheet, resolver: &R) -> IjahResult<Option<SheetSeed>>
    where
        R: ReferenceResolver + ?Sized,
    {
        let Some(target) = self.registry.table_for_sheet(&sheet.name) else {
            debug!(sheet = %sheet.name, "sheet maps to no table, skipping");
            return Ok(None);
        };

        let mut seed = SheetSeed {
            table: target.table,
            records: Vec::new(),
            unresolved: 0,
        };
        let Some((header, data_rows)) = sheet.rows.split_first() else {
            return Ok(Some(seed));
        };

        let columns: Vec<Option<&'static FieldLabel>> = header
            .iter()
            .map(|label| self.registry.field_for(target.kind, label.trim()))
            .collect();
        let now = (self.clock)();

        for (index, row) in data_rows.iter().enumerate() {
            // 1-based sheet row, counting the header
            let row_number = index + 2;
            let mut record = SeedRecord::new(target.table);
            let mut keep = true;

            for (text, column) in row.iter().zip(&columns) {
                let Some(field) = column else { continue };
                if text.is_empty() {
                    continue;
                }
                let value = coerce(field.value_type, text, now);

                match field.role {
                    ImportRole::Column => record.push(field.field, value),
                    ImportRole::Derived { column } => {
                        record.push(column, split_order_reference(&value));
                        record.push(field.field, value);
                    }
                    ImportRole::ForeignKey { column } => {
                        match self.resolve(resolver, target, row_number, &value)? {
                            Some(id) => record.push(column, id.to_string()),
                            None => {
                                seed.unresolved += 1;
                                match self.policy {
                                    UnresolvedReference::SkipRow => keep = false,
                                    _ => record.push(column, "0"),
                                }
                            }
                        }
                    }
                    ImportRole::ExportOnly => {}
                }
            }

            if keep && !record.is_empty() {
                seed.records.push(record);
            }
        }

        Ok(Some(seed))
    }

    /// `Ok(None)` for an unknown SKU the policy tolerates
    fn resolve<R>(
        &self,
        resolver: &R,
        target: &SheetTable,
        row: usize,
        sku: &str,
    ) -> IjahResult<Option<i64>>
    where
        R: ReferenceResolver + ?Sized,
    {
        match resolver.resolve_sku(sku) {
            Ok(id) => Ok(Some(id)),
            Err(IjahError::ReferenceNotFound(_)) if self.policy != UnresolvedReference::Fail => {
                warn!(sheet = target.sheet, row, sku, policy = %self.policy, "unresolved product reference");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn coerce(value_type: ValueType, text: &str, now: NaiveDateTime) -> String {
    match value_type {
        ValueType::Text | ValueType::Integer => text.to_string(),
        ValueType::Currency => import_currency(text),
        ValueType::Date => import_date(text, now),
    }
}
