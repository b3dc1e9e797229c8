//! Display formatting for GBP amounts. Amounts travel as raw numbers and are only
//! formatted on the way out; nothing here parses a formatted string back.

/// Renders `1234.5` as `£1,234.50`.
pub fn format_gbp(amount: f64) -> String {
    if !amount.is_finite() {
        return "£-".to_string();
    }

    let pence = (amount.abs() * 100.0).round() as u64;
    let pounds = pence / 100;
    let remainder = pence % 100;

    let digits = pounds.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && pence > 0 { "-" } else { "" };
    format!("{sign}£{grouped}.{remainder:02}")
}

/// Relative deviation as a whole percentage, e.g. `0.522` -> `52%`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}
