use crate::error::{IjahError, IjahResult};
use crate::types::Row;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// File format of an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = IjahError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(IjahError::Export(format!(
                "Unsupported export format '{}' (expected csv or xlsx)",
                other
            ))),
        }
    }
}

/// Write rows as comma-separated lines. Rows may differ in length; an empty
/// row becomes an empty line.
pub fn write_csv(path: &Path, rows: &[Row]) -> IjahResult<()> {
    let file = fs::File::create(path)?;
    // csv quotes an empty record as `""`; a bare newline goes to the file
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(&file);
    for row in rows {
        if row.is_empty() {
            writer.flush()?;
            (&file).write_all(b"\n")?;
        } else {
            writer.write_record(row)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write rows to a single worksheet, every cell as a string
pub fn write_xlsx(path: &Path, sheet_name: &str, rows: &[Row]) -> IjahResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .map_err(|e| IjahError::Export(format!("Failed to set worksheet name: {}", e)))?;

    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, cell.as_str())
                .map_err(|e| {
                    IjahError::Export(format!(
                        "Failed to write cell ({}, {}): {}",
                        row_idx, col_idx, e
                    ))
                })?;
        }
    }
    worksheet.autofit();

    workbook
        .save(path)
        .map_err(|e| IjahError::Export(format!("Failed to save Excel file: {}", e)))?;
    Ok(())
}

/// Write `rows` to `<dir>/<name>.<ext>`, creating `dir` when missing
pub fn write_export(
    dir: &Path,
    name: &str,
    format: ExportFormat,
    rows: &[Row],
) -> IjahResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", name, format.extension()));

    match format {
        ExportFormat::Csv => write_csv(&path, rows)?,
        ExportFormat::Xlsx => write_xlsx(&path, name, rows)?,
    }

    info!(path = %path.display(), rows = rows.len(), "export written");
    Ok(path)
}
