//! API request handlers
//!
//! Storage work runs on the blocking pool; every request opens its own
//! connection to the configured database.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{IjahError, IjahResult};
use crate::interchange::{ImportSummary, SpreadsheetImporter, UnresolvedReference};
use crate::report;
use crate::storage::Storage;
use crate::types::{
    DateRange, EntityKind, OrderInput, OrderWithProduct, Product, ProductInput, PurchaseDetail,
    PurchaseInput, PurchaseWithProduct,
};
use crate::writer::ExportFormat;

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

/// Client mistakes are 400, a missing workbook or record is 404, the rest is 500
fn status_for(error: &IjahError) -> StatusCode {
    match error {
        IjahError::UnknownEntityKind(_)
        | IjahError::InvalidInput(_)
        | IjahError::InvalidDate(_)
        | IjahError::ReferenceNotFound(_)
        | IjahError::Export(_)
        | IjahError::Workbook(_) => StatusCode::BAD_REQUEST,
        IjahError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        IjahError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure<T: Serialize>(error: IjahError) -> ApiResult<T> {
    let status = status_for(&error);
    if status.is_server_error() {
        warn!(error = %error, "request failed");
    }
    (status, Json(ApiResponse::err(error.to_string())))
}

async fn run_blocking<T, F>(work: F) -> IjahResult<T>
where
    F: FnOnce() -> IjahResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .unwrap_or_else(|e| Err(IjahError::Io(std::io::Error::other(e))))
}

/// Open the configured database on the blocking pool and run `work` against it
async fn with_storage<T, F>(state: &AppState, work: F) -> ApiResult<T>
where
    F: FnOnce(&mut Storage) -> IjahResult<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let database = state.config.database.clone();
    let result = run_blocking(move || {
        let mut storage = Storage::open_migrated(&database)?;
        work(&mut storage)
    })
    .await;

    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => failure(e),
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Ijah API Server".to_string(),
        version: state.version.clone(),
        description: "Inventory import, export and valuation reports".to_string(),
        endpoints: vec![
            endpoint("/health", "GET", "Health check endpoint"),
            endpoint("/version", "GET", "Get server version"),
            endpoint(
                "/api/v1/export",
                "POST",
                "Export an entity kind or report to CSV/XLSX",
            ),
            endpoint("/api/v1/import", "POST", "Import a workbook into storage"),
            endpoint("/api/v1/products", "GET", "List products"),
            endpoint("/api/v1/products", "POST", "Add or update a product"),
            endpoint("/api/v1/products/:id", "GET", "Get one product"),
            endpoint("/api/v1/products/:id", "DELETE", "Delete a product"),
            endpoint(
                "/api/v1/purchases",
                "GET",
                "List purchases, optionally by date_start and date_end",
            ),
            endpoint(
                "/api/v1/purchases",
                "POST",
                "Add or update a purchase with its deliveries",
            ),
            endpoint("/api/v1/purchases/:id", "GET", "Get one purchase and its deliveries"),
            endpoint(
                "/api/v1/orders",
                "GET",
                "List orders, optionally by date_start and date_end",
            ),
            endpoint("/api/v1/orders", "POST", "Add or update an order"),
            endpoint("/api/v1/orders/:id", "GET", "Get one order"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub kinds: Vec<String>,
}

/// GET /version - Server version and exportable kinds
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        kinds: EntityKind::ALL.iter().map(|k| k.tag().to_string()).collect(),
    }))
}

/// Export request
#[derive(Deserialize)]
pub struct ExportRequest {
    pub kind: String,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    /// `csv` (default) or `xlsx`
    pub format: Option<String>,
}

/// Export response
#[derive(Serialize, Default)]
pub struct ExportResponse {
    pub kind: String,
    pub format: String,
    pub file_path: String,
}

fn parse_export_request(req: &ExportRequest) -> IjahResult<(EntityKind, Option<DateRange>, ExportFormat)> {
    let kind: EntityKind = req.kind.parse()?;
    let range = DateRange::parse_optional(req.date_start.as_deref(), req.date_end.as_deref())?;
    let format = match &req.format {
        Some(format) => format.parse()?,
        None => ExportFormat::default(),
    };
    Ok((kind, range, format))
}

/// POST /api/v1/export - Write one kind to the export directory
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> ApiResult<ExportResponse> {
    let (kind, range, format) = match parse_export_request(&req) {
        Ok(parsed) => parsed,
        Err(e) => return failure(e),
    };

    let config = state.config.clone();
    let result = run_blocking(move || {
        let storage = Storage::open_migrated(&config.database)?;
        report::export_kind(
            &storage,
            kind,
            range.as_ref(),
            &config.export_dir,
            format,
            Local::now().naive_local(),
        )
    })
    .await;

    match result {
        Ok(path) => (
            StatusCode::OK,
            Json(ApiResponse::ok(ExportResponse {
                kind: kind.to_string(),
                format: format.to_string(),
                file_path: path.display().to_string(),
            })),
        ),
        Err(e) => failure(e),
    }
}

/// Import request
#[derive(Deserialize)]
pub struct ImportRequest {
    pub file_path: String,
    /// Overrides the configured policy for this request
    pub on_unresolved: Option<UnresolvedReference>,
}

/// Import response
#[derive(Serialize)]
pub struct ImportResponse {
    pub file_path: String,
    pub summary: ImportSummary,
}

/// POST /api/v1/import - Import a workbook
pub async fn import(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> ApiResult<ImportResponse> {
    let config = state.config.clone();
    let path = config.resolve_import_path(&PathBuf::from(&req.file_path));
    let policy = req.on_unresolved.unwrap_or(config.unresolved_reference);

    let workbook = path.clone();
    let result = run_blocking(move || {
        let mut storage = Storage::open_migrated(&config.database)?;
        SpreadsheetImporter::default()
            .with_policy(policy)
            .import_workbook(&mut storage, &workbook)
    })
    .await;

    match result {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::ok(ImportResponse {
                file_path: path.display().to_string(),
                summary,
            })),
        ),
        Err(e) => failure(e),
    }
}

/// Day filter for list endpoints: `?date_start=yyyy-MM-dd&date_end=yyyy-MM-dd`
#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub date_start: Option<String>,
    pub date_end: Option<String>,
}

/// Id of a stored or deleted record
#[derive(Serialize, Debug, PartialEq)]
pub struct RecordId {
    pub id: i64,
}

/// A purchase with the deliveries recorded against it
#[derive(Serialize)]
pub struct PurchaseResponse {
    #[serde(flatten)]
    pub purchase: PurchaseWithProduct,
    pub details: Vec<PurchaseDetail>,
}

/// GET /api/v1/products
pub async fn list_products(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Product>> {
    with_storage(&state, |storage| storage.fetch_products()).await
}

/// GET /api/v1/products/:id
pub async fn get_product(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Product> {
    with_storage(&state, move |storage| {
        storage
            .fetch_product(id)?
            .ok_or(IjahError::RecordNotFound { table: "product", id })
    })
    .await
}

/// POST /api/v1/products - Insert, or update when `product_id` is set
pub async fn store_product(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProductInput>,
) -> ApiResult<RecordId> {
    with_storage(&state, move |storage| {
        storage.store_product(&input).map(|id| RecordId { id })
    })
    .await
}

/// DELETE /api/v1/products/:id
pub async fn delete_product(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<RecordId> {
    with_storage(&state, move |storage| match storage.delete_product(id)? {
        true => Ok(RecordId { id }),
        false => Err(IjahError::RecordNotFound { table: "product", id }),
    })
    .await
}

/// GET /api/v1/purchases
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<PurchaseWithProduct>> {
    let range = match DateRange::parse_optional(query.date_start.as_deref(), query.date_end.as_deref()) {
        Ok(range) => range,
        Err(e) => return failure(e),
    };
    with_storage(&state, move |storage| storage.fetch_purchases(range.as_ref())).await
}

/// GET /api/v1/purchases/:id
pub async fn get_purchase(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<PurchaseResponse> {
    with_storage(&state, move |storage| {
        let purchase = storage
            .fetch_purchase(id)?
            .ok_or(IjahError::RecordNotFound { table: "purchase", id })?;
        let details = storage.fetch_purchase_details(id)?;
        Ok(PurchaseResponse { purchase, details })
    })
    .await
}

/// POST /api/v1/purchases - Purchase and `details` are stored together
pub async fn store_purchase(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PurchaseInput>,
) -> ApiResult<RecordId> {
    with_storage(&state, move |storage| {
        storage.store_purchase(&input).map(|id| RecordId { id })
    })
    .await
}

/// GET /api/v1/orders
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<OrderWithProduct>> {
    let range = match DateRange::parse_optional(query.date_start.as_deref(), query.date_end.as_deref()) {
        Ok(range) => range,
        Err(e) => return failure(e),
    };
    with_storage(&state, move |storage| storage.fetch_orders(range.as_ref())).await
}

/// GET /api/v1/orders/:id
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<OrderWithProduct> {
    with_storage(&state, move |storage| {
        storage
            .fetch_order(id)?
            .ok_or(IjahError::RecordNotFound { table: "orders", id })
    })
    .await
}

/// POST /api/v1/orders
pub async fn store_order(
    State(state): State<Arc<AppState>>,
    Json(input): Json<OrderInput>,
) -> ApiResult<RecordId> {
    with_storage(&state, move |storage| {
        storage.store_order(&input).map(|id| RecordId { id })
    })
    .await
}
