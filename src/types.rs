use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IjahError;

//==============================================================================
// Entity Kinds
//==============================================================================

/// Closed set of domain shapes handled by the interchange engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    PurchaseWithProduct,
    OrderWithProduct,
    ProductAverageValue,
    OrderValue,
    ProductValueSummary,
    OrderValueSummary,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Product,
        EntityKind::PurchaseWithProduct,
        EntityKind::OrderWithProduct,
        EntityKind::ProductAverageValue,
        EntityKind::OrderValue,
        EntityKind::ProductValueSummary,
        EntityKind::OrderValueSummary,
    ];

    /// Tag used on the command line, in API requests and in log lines
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::PurchaseWithProduct => "purchase",
            EntityKind::OrderWithProduct => "order",
            EntityKind::ProductAverageValue => "report_product",
            EntityKind::OrderValue => "report_order",
            EntityKind::ProductValueSummary => "report_product_summary",
            EntityKind::OrderValueSummary => "report_order_summary",
        }
    }

    /// Summary kinds render as label/value lines instead of a table
    pub fn is_summary(&self) -> bool {
        matches!(
            self,
            EntityKind::ProductValueSummary | EntityKind::OrderValueSummary
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntityKind {
    type Err = IjahError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == s.trim())
            .ok_or_else(|| IjahError::UnknownEntityKind(s.to_string()))
    }
}

//==============================================================================
// Domain Entities
//==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub sku: String,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity_order: i64,
    pub quantity_accepted: i64,
    pub description: String,
    pub invoice_number: String,
    pub cost: i64,
    pub date: NaiveDateTime,
    pub is_finish: bool,
    /// cost × quantity_order
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseWithProduct {
    pub purchase: Purchase,
    pub product: Product,
}

/// One delivery received against a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDetail {
    pub purchase_detail_id: i64,
    pub purchase_id: i64,
    pub quantity: i64,
    pub description: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub order_id_format: String,
    pub product_id: i64,
    pub quantity: i64,
    pub description: String,
    pub date: NaiveDateTime,
    pub price: i64,
    /// price × quantity
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithProduct {
    pub order: Order,
    pub product: Product,
}

/// Product valued at the average purchase cost
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductAvgValue {
    pub product: Product,
    pub average_cost: i64,
    /// average_cost × stock
    pub total: i64,
}

/// Sold order valued against the product's average purchase cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithProductValue {
    pub order_with_product: OrderWithProduct,
    pub average_cost: i64,
    pub total: i64,
    pub profit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryAvgValue {
    pub date_print: String,
    pub total_sku: i64,
    pub total_product: i64,
    pub total_value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryOrderWithProductValue {
    pub date_print: String,
    pub date: String,
    pub total_price: i64,
    pub total_profit: i64,
    pub total_sold: i64,
    pub total_item: i64,
}

//==============================================================================
// Export Input
//==============================================================================

/// Data of exactly one entity kind, handed to the exporter
#[derive(Debug, Clone, PartialEq)]
pub enum ExportData {
    Products(Vec<Product>),
    Purchases(Vec<PurchaseWithProduct>),
    Orders(Vec<OrderWithProduct>),
    ProductValues(Vec<ProductAvgValue>),
    OrderValues(Vec<OrderWithProductValue>),
    ProductSummary(SummaryAvgValue),
    OrderSummary(SummaryOrderWithProductValue),
}

impl ExportData {
    pub fn kind(&self) -> EntityKind {
        match self {
            ExportData::Products(_) => EntityKind::Product,
            ExportData::Purchases(_) => EntityKind::PurchaseWithProduct,
            ExportData::Orders(_) => EntityKind::OrderWithProduct,
            ExportData::ProductValues(_) => EntityKind::ProductAverageValue,
            ExportData::OrderValues(_) => EntityKind::OrderValue,
            ExportData::ProductSummary(_) => EntityKind::ProductValueSummary,
            ExportData::OrderSummary(_) => EntityKind::OrderValueSummary,
        }
    }
}

/// One line of tabular output
pub type Row = Vec<String>;

//==============================================================================
// Import Types
//==============================================================================

/// A named grid of cell text read from a workbook. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedColumn {
    pub column: String,
    pub value: String,
}

/// One pending insertion produced while scanning a data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRecord {
    pub table: String,
    pub columns: Vec<SeedColumn>,
}

impl SeedRecord {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.push(SeedColumn {
            column: column.into(),
            value: value.into(),
        });
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, value);
        self
    }

    pub fn value(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

//==============================================================================
// Record Entry
//==============================================================================
//
// Hand-entered records. A missing id inserts a new row, a present id updates
// that row. Dates are `yyyy-MM-dd HH:mm:ss`.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub product_id: Option<i64>,
    pub name: String,
    pub sku: String,
    pub stock: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseInput {
    #[serde(default)]
    pub purchase_id: Option<i64>,
    pub product_id: i64,
    pub quantity_order: i64,
    pub quantity_accepted: i64,
    #[serde(default)]
    pub description: String,
    pub invoice_number: String,
    pub cost: i64,
    pub date: String,
    #[serde(default)]
    pub is_finish: bool,
    /// Deliveries stored with the purchase, in the same transaction
    #[serde(default)]
    pub details: Vec<PurchaseDetailInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDetailInput {
    #[serde(default)]
    pub purchase_detail_id: Option<i64>,
    pub quantity: i64,
    #[serde(default)]
    pub description: String,
    pub date: String,
}

/// `QTY,yyyy-MM-dd HH:mm:ss[,note]`, one delivery as typed on the command line
impl FromStr for PurchaseDetailInput {
    type Err = IjahError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ',');
        let quantity = parts.next().unwrap_or_default().trim();
        let quantity = quantity.parse().map_err(|_| {
            IjahError::InvalidInput(format!("delivery quantity '{}' is not a number", quantity))
        })?;
        let date = parts
            .next()
            .map(str::trim)
            .filter(|date| !date.is_empty())
            .ok_or_else(|| IjahError::InvalidInput(format!("delivery '{}' has no date", s)))?;

        Ok(Self {
            purchase_detail_id: None,
            quantity,
            description: parts.next().unwrap_or_default().trim().to_string(),
            date: date.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderInput {
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub order_id_format: String,
    pub product_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub description: String,
    pub date: String,
    pub price: i64,
}

//==============================================================================
// Query Filters
//==============================================================================

/// Day range used by fetch filters: `start_bound() < date <= end_bound()`.
/// The lower bound is midnight of `start` and is itself excluded, so a row
/// stamped exactly `start 00:00:00` falls outside; the end covers all of `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Build a range from two `yyyy-MM-dd` strings
    pub fn parse(start: &str, end: &str) -> Result<Self, IjahError> {
        use crate::interchange::coercion::parse_day;
        Ok(Self::new(parse_day(start)?, parse_day(end)?))
    }

    /// A range only when both ends are given; one end alone is an error
    pub fn parse_optional(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>, IjahError> {
        match (start, end) {
            (Some(start), Some(end)) => Self::parse(start, end).map(Some),
            (None, None) => Ok(None),
            _ => Err(IjahError::InvalidDate(
                "date_start and date_end must be given together".to_string(),
            )),
        }
    }

    pub fn start_bound(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    pub fn end_bound(&self) -> NaiveDateTime {
        // 23:59:59 is always a valid time
        self.end
            .and_hms_opt(23, 59, 59)
            .unwrap_or_else(|| self.end.and_time(NaiveTime::MIN))
    }

    /// Label used in the order report summary: `start-end`
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.start_bound().format(crate::interchange::coercion::DATE_FORMAT),
            self.end.and_time(NaiveTime::MIN).format(crate::interchange::coercion::DATE_FORMAT)
        )
    }
}
