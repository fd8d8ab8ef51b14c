//! Home metrics and sales history
//!
//! Every metric is fetched independently; one that fails is logged and left
//! at zero or empty instead of failing the whole dashboard.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::api::ApiClient;

const MONTH_NAMES: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockLevel {
    pub name: String,
    pub stock: f64,
    pub minimum: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestSeller {
    pub name: String,
    pub total_quantity: f64,
    pub total_revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// e.g. `Ago 2025`
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub customer_count: u64,
    pub new_customers_this_month: u64,
    pub total_orders: u64,
    pub current_month_orders: u64,
    pub total_earnings: f64,
    pub monthly_earnings: f64,
    pub low_stock: Vec<StockLevel>,
    pub best_sellers: Vec<BestSeller>,
    pub monthly_sales: Vec<MonthlyTotal>,
}

/// Loosely numeric value: numbers, numeric strings, nothing else
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_number(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| number(obj.get(*key)))
}

fn first_text(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn count(value: Option<&Value>, key: &str) -> u64 {
    value
        .and_then(|v| number(v.get(key)))
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64)
        .unwrap_or(0)
}

/// Array rows, also accepting `{ "data": [...] }` envelopes
fn rows(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        Some(Value::Object(obj)) => obj.get("data").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]),
        _ => &[],
    }
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Local).date_naive());
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(dt.date());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
        }
        // epoch milliseconds
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Local.timestamp_millis_opt(ms).single())
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

fn order_total(order: &Value) -> f64 {
    for key in ["total", "totalAmount", "total_price"] {
        if let Some(total) = order.get(key).and_then(Value::as_f64) {
            return total;
        }
    }
    if let Some(items) = order.get("items").and_then(Value::as_array) {
        return items
            .iter()
            .map(|item| {
                let quantity = first_number(item, &["quantity", "qty"]).unwrap_or(1.0);
                let price = first_number(item, &["price", "unitPrice", "unit_price"]).unwrap_or(0.0);
                quantity * price
            })
            .sum();
    }
    number(order.get("amount")).unwrap_or(0.0)
}

/// Sum order totals per calendar month, oldest month first
///
/// Orders without a parseable date are skipped.
pub fn aggregate_sales_monthly(orders: &[Value]) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();

    for order in orders {
        let date = ["createdAt", "date", "created_at", "timestamp"]
            .iter()
            .filter_map(|key| order.get(*key))
            .find(|v| !v.is_null())
            .and_then(parse_date);
        let Some(date) = date else {
            debug!("Skipping order without a usable date");
            continue;
        };

        let total = order_total(order);
        *totals.entry((date.year(), date.month())).or_insert(0.0) += if total.is_finite() { total } else { 0.0 };
    }

    totals
        .into_iter()
        .map(|((year, month), total)| MonthlyTotal {
            month: format!("{} {}", MONTH_NAMES[(month - 1) as usize], year),
            total,
        })
        .collect()
}

/// Normalize raw material or product rows into stock levels
pub fn normalize_stock(raw: &[Value]) -> Vec<StockLevel> {
    raw.iter()
        .map(|row| StockLevel {
            name: first_text(row, &["name", "producto", "title", "material", "label"])
                .unwrap_or_else(|| "Unnamed".to_string()),
            stock: first_number(row, &["stock", "quantity", "qty", "currentStock"]).unwrap_or(0.0),
            minimum: first_number(row, &["minimo", "min", "minimum"]).unwrap_or(0.0),
            unit: first_text(row, &["unit", "unidad", "u", "unitMeasure"]).unwrap_or_default(),
        })
        .collect()
}

pub fn normalize_best_sellers(raw: &[Value]) -> Vec<BestSeller> {
    raw.iter()
        .map(|row| BestSeller {
            name: first_text(row, &["productName", "name"]).unwrap_or_else(|| "Unnamed".to_string()),
            total_quantity: first_number(row, &["totalQuantity", "quantity"]).unwrap_or(0.0),
            total_revenue: first_number(row, &["totalRevenue"]),
        })
        .collect()
}

/// Some endpoints answer with JSON serialized inside a JSON string
fn unwrap_json_string(value: Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    }
}

async fn fetch_metric(client: &ApiClient, segments: &[&str]) -> Option<Value> {
    match client.get(segments).await {
        Ok(body) => {
            let value = body.json().cloned().map(unwrap_json_string);
            if value.is_none() {
                warn!("Dashboard metric {} did not return JSON", segments.join("/"));
            }
            value
        }
        Err(e) => {
            warn!("Dashboard metric {} unavailable: {}", segments.join("/"), e);
            None
        }
    }
}

/// Fetch every metric concurrently
pub async fn load_dashboard(client: &ApiClient) -> DashboardSummary {
    let (customers, new_customers, orders, earnings, low_stock, best, sales) = futures::join!(
        fetch_metric(client, &["customers", "count"]),
        fetch_metric(client, &["customers", "countByMonth"]),
        fetch_metric(client, &["salesOrder", "countTotal"]),
        fetch_metric(client, &["salesOrder", "totalEarnings"]),
        fetch_metric(client, &["rawMaterials", "lowStock"]),
        fetch_metric(client, &["cart", "bestSellingProducts"]),
        fetch_metric(client, &["salesOrder"]),
    );

    DashboardSummary {
        customer_count: count(customers.as_ref(), "count"),
        new_customers_this_month: count(new_customers.as_ref(), "count"),
        total_orders: count(orders.as_ref(), "totalOrders"),
        current_month_orders: count(orders.as_ref(), "currentMonthOrders"),
        total_earnings: earnings.as_ref().and_then(|v| number(v.get("totalEarnings"))).unwrap_or(0.0),
        monthly_earnings: earnings.as_ref().and_then(|v| number(v.get("monthlyEarnings"))).unwrap_or(0.0),
        low_stock: normalize_stock(rows(low_stock.as_ref())),
        best_sellers: normalize_best_sellers(rows(best.as_ref())),
        monthly_sales: aggregate_sales_monthly(rows(sales.as_ref())),
    }
}
