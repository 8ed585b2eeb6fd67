use crate::config::Config;
use crate::error::{IjahError, IjahResult};
use crate::interchange::coercion::format_date;
use crate::interchange::{
    ImportSummary, MappingRegistry, SpreadsheetImporter, TabularExporter, UnresolvedReference,
};
use crate::report;
use crate::storage::Storage;
use crate::types::{
    DateRange, EntityKind, ExportData, OrderInput, ProductInput, PurchaseInput, Row,
};
use crate::writer::ExportFormat;
use chrono::Local;
use colored::Colorize;
use std::path::PathBuf;

fn open_storage(config: &Config) -> IjahResult<Storage> {
    Storage::open_migrated(&config.database)
}

/// Execute the migrate command
pub fn migrate(config: &Config) -> IjahResult<()> {
    println!("{}", "🗄️  Ijah - Migrate".bold().green());
    println!("   Database: {}\n", config.database.display());

    open_storage(config)?;

    println!("{}", "✅ Schema is up to date".bold().green());
    Ok(())
}

/// Execute the seed-demo command
pub fn seed_demo(config: &Config) -> IjahResult<()> {
    println!("{}", "🌱 Ijah - Demo Seed".bold().green());
    println!("   Database: {}\n", config.database.display());

    let storage = open_storage(config)?;
    storage.seed_demo()?;

    for product in storage.fetch_products()? {
        println!(
            "   {} {} (stock {})",
            product.sku.bright_blue(),
            product.name,
            product.stock
        );
    }
    println!("\n{}", "✅ Demo products inserted".bold().green());
    Ok(())
}

/// Execute the import command
pub fn import(
    config: &Config,
    file: PathBuf,
    on_unresolved: Option<UnresolvedReference>,
    verbose: bool,
) -> IjahResult<ImportSummary> {
    let path = config.resolve_import_path(&file);
    let policy = on_unresolved.unwrap_or(config.unresolved_reference);

    println!("{}", "📥 Ijah - Spreadsheet Import".bold().green());
    println!("   Workbook: {}", path.display());
    println!("   Database: {}", config.database.display());
    println!("   Unknown SKU: {}\n", policy.to_string().cyan());

    let mut storage = open_storage(config)?;

    if verbose {
        println!("{}", "📖 Reading workbook...".cyan());
        let registry = MappingRegistry::standard();
        for sheet in crate::interchange::read_workbook(&path)? {
            match registry.table_for_sheet(&sheet.name) {
                Some(target) => println!(
                    "   📊 {} → {} ({} data rows)",
                    sheet.name.bright_blue(),
                    target.table,
                    sheet.rows.len().saturating_sub(1)
                ),
                None => println!("   {} {} (skipped)", "·".dimmed(), sheet.name.dimmed()),
            }
        }
        println!();
    }

    let summary = SpreadsheetImporter::default()
        .with_policy(policy)
        .import_workbook(&mut storage, &path)?;

    println!("{}", "✅ Import Complete!".bold().green());
    println!("   Sheets imported: {}", summary.sheets_imported);
    println!("   Sheets skipped:  {}", summary.sheets_skipped);
    println!("   Rows written:    {}", summary.records_written);
    if summary.unresolved > 0 {
        println!(
            "   {} {} row(s) referenced an unknown SKU",
            "⚠️".yellow(),
            summary.unresolved.to_string().yellow().bold()
        );
    }
    println!();

    Ok(summary)
}

/// Execute the export command
pub fn export(
    config: &Config,
    kind: EntityKind,
    date_start: Option<String>,
    date_end: Option<String>,
    format: ExportFormat,
    output_dir: Option<PathBuf>,
) -> IjahResult<PathBuf> {
    let range = DateRange::parse_optional(date_start.as_deref(), date_end.as_deref())?;
    let dir = output_dir.unwrap_or_else(|| config.export_dir.clone());

    println!("{}", "📤 Ijah - Export".bold().green());
    println!("   Kind:     {}", kind.to_string().bright_blue());
    if let Some(range) = &range {
        println!("   Period:   {} .. {}", range.start, range.end);
    }
    println!("   Database: {}\n", config.database.display());

    let storage = open_storage(config)?;
    let path = report::export_kind(
        &storage,
        kind,
        range.as_ref(),
        &dir,
        format,
        Local::now().naive_local(),
    )?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   File: {}\n", path.display());
    Ok(path)
}

/// Execute `product save`: add a product, or update it when `product_id` is set
pub fn store_product(config: &Config, input: ProductInput) -> IjahResult<i64> {
    println!("{}", "📦 Ijah - Product".bold().green());
    println!("   Database: {}\n", config.database.display());

    let storage = open_storage(config)?;
    let id = storage.store_product(&input)?;

    println!(
        "   {} {} (stock {})",
        input.sku.bright_blue(),
        input.name,
        input.stock
    );
    println!("\n{}", format!("✅ Product {} saved", id).bold().green());
    Ok(id)
}

/// Execute `product delete`; returns whether a product was removed
pub fn delete_product(config: &Config, product_id: i64) -> IjahResult<bool> {
    println!("{}", "📦 Ijah - Product".bold().green());
    println!("   Database: {}\n", config.database.display());

    let storage = open_storage(config)?;
    let deleted = storage.delete_product(product_id)?;

    if deleted {
        println!("{}", format!("✅ Product {} deleted", product_id).bold().green());
    } else {
        println!(
            "{} no product with id {}",
            "⚠️".yellow(),
            product_id.to_string().yellow().bold()
        );
    }
    Ok(deleted)
}

/// Execute the purchase command: store a purchase and its deliveries
pub fn store_purchase(config: &Config, input: PurchaseInput) -> IjahResult<i64> {
    println!("{}", "🧾 Ijah - Purchase".bold().green());
    println!("   Database: {}\n", config.database.display());

    let mut storage = open_storage(config)?;
    let id = storage.store_purchase(&input)?;

    println!(
        "   Invoice {}: {} ordered, {} accepted at {}",
        input.invoice_number.bright_blue(),
        input.quantity_order,
        input.quantity_accepted,
        input.cost
    );
    for detail in &input.details {
        println!("   📬 {} × {} {}", detail.date, detail.quantity, detail.description.dimmed());
    }
    println!("\n{}", format!("✅ Purchase {} saved", id).bold().green());
    Ok(id)
}

/// Execute the order command: store one sale
pub fn store_order(config: &Config, input: OrderInput) -> IjahResult<i64> {
    println!("{}", "🛒 Ijah - Order".bold().green());
    println!("   Database: {}\n", config.database.display());

    let storage = open_storage(config)?;
    let id = storage.store_order(&input)?;

    println!(
        "   {} × product {} at {}",
        input.quantity,
        input.product_id.to_string().bright_blue(),
        input.price
    );
    println!("\n{}", format!("✅ Order {} saved", id).bold().green());
    Ok(id)
}

/// Execute the show command: print products, purchases or orders.
///
/// With an id only that record is shown; a purchase also lists its
/// deliveries. Returns the printed rows, header first.
pub fn show(
    config: &Config,
    kind: EntityKind,
    id: Option<i64>,
    date_start: Option<String>,
    date_end: Option<String>,
) -> IjahResult<Vec<Row>> {
    let range = DateRange::parse_optional(date_start.as_deref(), date_end.as_deref())?;
    let storage = open_storage(config)?;

    let data = match (kind, id) {
        (EntityKind::Product, None) => ExportData::Products(storage.fetch_products()?),
        (EntityKind::Product, Some(id)) => ExportData::Products(vec![storage
            .fetch_product(id)?
            .ok_or(IjahError::RecordNotFound { table: "product", id })?]),
        (EntityKind::PurchaseWithProduct, None) => {
            ExportData::Purchases(storage.fetch_purchases(range.as_ref())?)
        }
        (EntityKind::PurchaseWithProduct, Some(id)) => ExportData::Purchases(vec![storage
            .fetch_purchase(id)?
            .ok_or(IjahError::RecordNotFound { table: "purchase", id })?]),
        (EntityKind::OrderWithProduct, None) => {
            ExportData::Orders(storage.fetch_orders(range.as_ref())?)
        }
        (EntityKind::OrderWithProduct, Some(id)) => ExportData::Orders(vec![storage
            .fetch_order(id)?
            .ok_or(IjahError::RecordNotFound { table: "orders", id })?]),
        (other, _) => {
            return Err(IjahError::InvalidInput(format!(
                "'{}' is a report; use export instead",
                other
            )))
        }
    };
    let rows = TabularExporter::default().export_to_rows(kind, &data);

    println!("{}", format!("🔎 Ijah - {}", kind).bold().green());
    if let Some(range) = &range {
        println!("   Period: {} .. {}", range.start, range.end);
    }
    println!();
    match rows.split_first() {
        Some((header, body)) => {
            println!("   {}", header.join(" | ").bold());
            for row in body {
                println!("   {}", row.join(" | "));
            }
        }
        None => println!("   {}", "(no records)".dimmed()),
    }

    if let (EntityKind::PurchaseWithProduct, Some(id)) = (kind, id) {
        let details = storage.fetch_purchase_details(id)?;
        println!("\n   {} ({})", "Deliveries".bold(), details.len());
        for detail in details {
            println!(
                "   📬 {} × {} {}",
                format_date(&detail.date),
                detail.quantity,
                detail.description.dimmed()
            );
        }
    }
    println!();
    Ok(rows)
}

/// Execute the kinds command: list exportable kinds and their columns
pub fn kinds() -> IjahResult<()> {
    let registry = MappingRegistry::standard();

    println!("{}", "📋 Ijah - Entity Kinds".bold().green());
    for kind in EntityKind::ALL {
        println!(
            "\n   {} → {}",
            kind.tag().bright_blue().bold(),
            registry.export_name(kind)
        );
        if kind.is_summary() {
            for (_, label) in registry.summary_labels(kind) {
                println!("      {} : …", label);
            }
        } else {
            println!("      {}", registry.labels(kind).join(", "));
        }
        if let Some(sheet) = registry.sheet_for_kind(kind) {
            println!("      {} sheet '{}'", "importable from".dimmed(), sheet.sheet);
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
