//! Plain-text rendering of pages, items and summaries for the terminal

use unicode_width::UnicodeWidthStr;

use crate::api::ResourceApi;
use crate::controller::{Paginated, ResourceForm, ResourceListController};
use crate::dashboard::DashboardSummary;
use crate::models::ResourceItem;

const MAX_CELL_WIDTH: usize = 32;

fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + c.to_string().width() >= max {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Render rows under a header, columns sized to their widest cell
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| truncate(cell, MAX_CELL_WIDTH)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.width())
                .chain(std::iter::once(header.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| pad(value, *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in &cells {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

/// Current page of a controller, with a footer when there are several pages
pub fn format_page<A: ResourceApi>(controller: &ResourceListController<A>) -> String {
    let schema = controller.schema();
    let mut headers = vec!["id"];
    headers.extend(schema.columns.iter().copied());

    let rows: Vec<Vec<String>> = controller
        .visible()
        .iter()
        .map(|item| {
            let mut row = vec![item.id().unwrap_or_default()];
            row.extend(schema.columns.iter().map(|column| item.display_field(column)));
            if controller.is_pending(&row[0]) {
                row[0].push_str(" (deleting)");
            }
            row
        })
        .collect();

    let mut out = if rows.is_empty() {
        format!("No {} found.", controller.resource().label().to_lowercase())
    } else {
        format_table(&headers, &rows)
    };
    if controller.controls_enabled() {
        out.push_str(&format!(
            "\nPage {}/{} ({} items)",
            controller.current_page(),
            controller.total_pages(),
            controller.items().len()
        ));
    }
    out
}

pub fn format_item(item: &ResourceItem) -> String {
    let rows: Vec<Vec<String>> = item
        .fields()
        .keys()
        .map(|key| vec![key.clone(), item.display_field(key)])
        .collect();
    format_table(&["field", "value"], &rows)
}

pub fn format_form(form: &ResourceForm) -> String {
    let rows: Vec<Vec<String>> = form
        .fields()
        .iter()
        .map(|field| {
            let marker = if field.spec.is_required() { "*" } else { "" };
            vec![
                format!("{}{}", field.spec.key, marker),
                field.value.clone(),
                field.validation_error.clone().unwrap_or_default(),
            ]
        })
        .collect();
    format!("{}\n{}", form.title(), format_table(&["field", "value", "error"], &rows))
}

pub fn format_dashboard(summary: &DashboardSummary) -> String {
    let mut out = vec![
        format!(
            "Customers: {} ({} new this month)",
            summary.customer_count, summary.new_customers_this_month
        ),
        format!(
            "Orders: {} ({} this month)",
            summary.total_orders, summary.current_month_orders
        ),
        format!(
            "Earnings: ${:.2} (${:.2} this month)",
            summary.total_earnings, summary.monthly_earnings
        ),
    ];

    if !summary.low_stock.is_empty() {
        let rows: Vec<Vec<String>> = summary
            .low_stock
            .iter()
            .map(|s| vec![s.name.clone(), format!("{} {}", s.stock, s.unit).trim().to_string()])
            .collect();
        out.push(String::new());
        out.push("Low stock".to_string());
        out.push(format_table(&["material", "stock"], &rows));
    }

    if !summary.best_sellers.is_empty() {
        let rows: Vec<Vec<String>> = summary
            .best_sellers
            .iter()
            .map(|b| {
                vec![
                    b.name.clone(),
                    b.total_quantity.to_string(),
                    b.total_revenue.map(|r| format!("${:.2}", r)).unwrap_or_default(),
                ]
            })
            .collect();
        out.push(String::new());
        out.push("Best sellers".to_string());
        out.push(format_table(&["product", "units", "revenue"], &rows));
    }

    if !summary.monthly_sales.is_empty() {
        let rows: Vec<Vec<String>> = summary
            .monthly_sales
            .iter()
            .map(|m| vec![m.month.clone(), format!("${:.2}", m.total)])
            .collect();
        out.push(String::new());
        out.push("Monthly sales".to_string());
        out.push(format_table(&["month", "total"], &rows));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_columns_align() {
        let table = format_table(
            &["id", "name"],
            &[
                vec!["s1".to_string(), "Ceras SV".to_string()],
                vec!["s10".to_string(), "Aromas".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "id   name");
        assert_eq!(lines[1], "---  --------");
        assert_eq!(lines[2], "s1   Ceras SV");
        assert_eq!(lines[3], "s10  Aromas");
    }

    #[test]
    fn test_long_cells_are_truncated() {
        let long = "x".repeat(80);
        let table = format_table(&["v"], &[vec![long]]);
        assert!(table.lines().nth(2).unwrap().ends_with('…'));
        assert!(table.lines().nth(2).unwrap().width() <= MAX_CELL_WIDTH);
    }
}
