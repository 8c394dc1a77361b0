use super::work_orders::WorkOrderDetail;

/// Fixed export column order.
const HEADERS: [&str; 11] = [
    "工單號",
    "日期",
    "案場",
    "棟別",
    "樓層",
    "戶別",
    "維修原因",
    "工務人員",
    "金額",
    "狀態",
    "建立時間",
];

/// Render the filtered work orders as CSV: UTF-8 with a leading byte-order
/// mark, a header row, and one quoted row per record.
pub fn work_orders_to_csv(rows: &[WorkOrderDetail]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(csv_line(HEADERS.iter().map(|h| h.to_string())));

    for detail in rows {
        let order = &detail.order;
        lines.push(csv_line(
            [
                order.work_order_number.clone(),
                order.date.clone(),
                order.site_name.clone().unwrap_or_default(),
                order.building.clone().unwrap_or_default(),
                order.floor.clone().unwrap_or_default(),
                order.unit.clone().unwrap_or_default(),
                order.reason.clone().unwrap_or_default(),
                order.worker_name.clone().unwrap_or_default(),
                format_amount(order.amount),
                order.status.label().to_string(),
                order.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
            .into_iter(),
        ));
    }

    format!("\u{feff}{}", lines.join("\n"))
}

fn csv_line(fields: impl Iterator<Item = String>) -> String {
    fields
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Locale-stable amount rendering: integral amounts print without a decimal
/// point, everything else uses the plain `f64` display.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{}", amount)
    }
}
