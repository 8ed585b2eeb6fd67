//! Ijah API Server binary
//!
//! HTTP REST API for workbook import and CSV/XLSX export.

use clap::Parser;
use ijahshop::api::{run_api_server, ApiConfig};
use ijahshop::config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ijah-server")]
#[command(version)]
#[command(about = "Ijah API Server - HTTP REST API for inventory import and export")]
#[command(long_about = r#"
Ijah API Server - HTTP REST API

Endpoints:
  - POST /api/v1/export    - Export a kind: {"kind", "date_start"?, "date_end"?, "format"?}
  - POST /api/v1/import    - Import a workbook: {"file_path", "on_unresolved"?}
  - GET  /health           - Health check
  - GET  /version          - Server version and exportable kinds
  - GET  /                 - API documentation

Example usage:
  ijah-server                            # Start on localhost:8080
  ijah-server --host 0.0.0.0 --port 3000 --config ijahshop.yaml

  curl -X POST http://localhost:8080/api/v1/export \
    -H "Content-Type: application/json" \
    -d '{"kind": "report_order", "date_start": "2018-01-01", "date_end": "2018-01-31"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "IJAH_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "IJAH_PORT")]
    port: u16,

    /// YAML configuration file
    #[arg(long, env = "IJAH_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configuration)
    #[arg(long, env = "IJAH_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ijahshop=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(database) = args.database {
        config.database = database;
    }

    let api = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(api, config).await
}
