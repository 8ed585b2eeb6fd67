use clap::{Parser, Subcommand};
use ijahshop::cli;
use ijahshop::config::Config;
use ijahshop::error::IjahResult;
use ijahshop::interchange::UnresolvedReference;
use ijahshop::types::{EntityKind, OrderInput, ProductInput, PurchaseDetailInput, PurchaseInput};
use ijahshop::writer::ExportFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ijah")]
#[command(about = "Inventory bookkeeping: spreadsheet import, CSV/XLSX export and valuation reports")]
#[command(long_about = "Ijah - inventory bookkeeping for small shops

COMMANDS:
  migrate     - Create missing tables
  seed-demo   - Insert two demo products
  import      - Load a workbook (product, purchase and sales sheets)
  export      - Write one entity kind or report to CSV/XLSX
  kinds       - List entity kinds, file names and columns
  product     - Save or delete a product
  purchase    - Record a purchase and its deliveries
  order       - Record a sale
  show        - Print products, purchases or orders

EXAMPLES:
  ijah import \"Catatan Toko.xlsx\"
  ijah export product
  ijah export report_order --date-start 2018-01-01 --date-end 2018-01-31
  ijah export purchase --format xlsx --output-dir out/
  ijah product save --name \"BULUGUL MARAM\" --sku SSI-D00791077-MM-BM --stock 10
  ijah purchase --product-id 1 --quantity-order 10 --cost 74000 --invoice 20180102-69539 \\
      --date \"2018-01-02 10:00:00\" --detail \"6,2018-01-02 10:00:00\"
  ijah show order --date-start 2018-01-01 --date-end 2018-01-31")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "IJAH_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configuration)
    #[arg(long, global = true, env = "IJAH_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables
    Migrate,

    /// Insert the two demo products
    SeedDemo,

    #[command(long_about = "Import a workbook into the database.

Sheets are matched by name:
  Catatan Jumlah Barang  → products
  Catatan Barang Masuk   → purchases
  Catatan Barang Keluar  → sales

Other sheets are skipped. Header cells are matched to columns by label;
SKU columns are resolved to existing products, including products added
by an earlier sheet of the same workbook. The whole workbook is imported
in one transaction.

UNKNOWN SKUs (--on-unresolved):
  zero_id   store product id 0 (default)
  skip_row  drop the row
  fail      abort the import")]
    /// Import a workbook
    Import {
        /// Workbook path (.xlsx, .xls or .ods); relative paths also tried under import_dir
        file: PathBuf,

        /// What to do with rows whose SKU matches no product
        #[arg(long)]
        on_unresolved: Option<UnresolvedReference>,

        /// Show sheet-by-sheet details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Export an entity kind or report
    Export {
        /// product, purchase, order, report_product, report_order,
        /// report_product_summary or report_order_summary
        kind: EntityKind,

        /// First day (yyyy-MM-dd); required for order reports
        #[arg(long)]
        date_start: Option<String>,

        /// Last day (yyyy-MM-dd), inclusive
        #[arg(long)]
        date_end: Option<String>,

        /// csv or xlsx
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// Directory to write into (defaults to export_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List entity kinds and their columns
    Kinds,

    /// Save or delete a product
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },

    #[command(long_about = "Record a purchase.

Deliveries received against it are given with --detail, once per delivery:
  --detail \"QTY,yyyy-MM-dd HH:mm:ss[,note]\"

The purchase and its deliveries are stored in one transaction.")]
    /// Record a purchase and its deliveries
    Purchase {
        /// Update this purchase instead of adding one
        #[arg(long)]
        id: Option<i64>,

        #[arg(long)]
        product_id: i64,

        #[arg(long)]
        quantity_order: i64,

        /// Defaults to the ordered quantity
        #[arg(long)]
        quantity_accepted: Option<i64>,

        /// Unit cost
        #[arg(long)]
        cost: i64,

        /// Invoice number
        #[arg(long)]
        invoice: String,

        /// yyyy-MM-dd HH:mm:ss
        #[arg(long)]
        date: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Every ordered item has arrived
        #[arg(long)]
        finished: bool,

        /// One delivery: QTY,yyyy-MM-dd HH:mm:ss[,note]
        #[arg(long = "detail")]
        details: Vec<PurchaseDetailInput>,
    },

    /// Record a sale
    Order {
        /// Update this order instead of adding one
        #[arg(long)]
        id: Option<i64>,

        #[arg(long)]
        product_id: i64,

        #[arg(long)]
        quantity: i64,

        /// Unit price
        #[arg(long)]
        price: i64,

        /// yyyy-MM-dd HH:mm:ss
        #[arg(long)]
        date: String,

        /// `<note> <order code>`, e.g. "Pesanan ID-20180109-853724"
        #[arg(long, default_value = "")]
        description: String,

        /// Order code; taken from the description when omitted
        #[arg(long, default_value = "")]
        code: String,
    },

    /// Print products, purchases or orders
    Show {
        /// product, purchase or order
        kind: EntityKind,

        /// Only this record
        #[arg(long)]
        id: Option<i64>,

        /// First day (yyyy-MM-dd)
        #[arg(long)]
        date_start: Option<String>,

        /// Last day (yyyy-MM-dd), inclusive
        #[arg(long)]
        date_end: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add a product, or update it with --id
    Save {
        #[arg(long)]
        id: Option<i64>,

        #[arg(long)]
        name: String,

        #[arg(long)]
        sku: String,

        #[arg(long, default_value_t = 0)]
        stock: i64,
    },

    /// Delete a product by id
    Delete { id: i64 },
}

fn main() -> IjahResult<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ijahshop=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    match cli.command {
        Commands::Migrate => cli::migrate(&config),

        Commands::SeedDemo => cli::seed_demo(&config),

        Commands::Import {
            file,
            on_unresolved,
            verbose,
        } => cli::import(&config, file, on_unresolved, verbose).map(|_| ()),

        Commands::Export {
            kind,
            date_start,
            date_end,
            format,
            output_dir,
        } => cli::export(&config, kind, date_start, date_end, format, output_dir).map(|_| ()),

        Commands::Kinds => cli::kinds(),

        Commands::Product { action } => match action {
            ProductAction::Save {
                id,
                name,
                sku,
                stock,
            } => cli::store_product(
                &config,
                ProductInput {
                    product_id: id,
                    name,
                    sku,
                    stock,
                },
            )
            .map(|_| ()),
            ProductAction::Delete { id } => cli::delete_product(&config, id).map(|_| ()),
        },

        Commands::Purchase {
            id,
            product_id,
            quantity_order,
            quantity_accepted,
            cost,
            invoice,
            date,
            description,
            finished,
            details,
        } => cli::store_purchase(
            &config,
            PurchaseInput {
                purchase_id: id,
                product_id,
                quantity_order,
                quantity_accepted: quantity_accepted.unwrap_or(quantity_order),
                description,
                invoice_number: invoice,
                cost,
                date,
                is_finish: finished,
                details,
            },
        )
        .map(|_| ()),

        Commands::Order {
            id,
            product_id,
            quantity,
            price,
            date,
            description,
            code,
        } => cli::store_order(
            &config,
            OrderInput {
                order_id: id,
                order_id_format: code,
                product_id,
                quantity,
                description,
                date,
                price,
            },
        )
        .map(|_| ()),

        Commands::Show {
            kind,
            id,
            date_start,
            date_end,
        } => cli::show(&config, kind, id, date_start, date_end).map(|_| ()),
    }
}
