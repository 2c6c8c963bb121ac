/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use insights_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    // Handle the sign separately so the thousands grouping works on the
    // absolute value.
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Round to the requested decimal places.
    // Add a tiny epsilon (half ULP at the target precision) before rounding
    // to avoid IEEE 754 binary-representation issues at exact midpoints.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    // Build the thousands-separated integer portion.
    let int_str = integer_part.to_string();
    let grouped = group_thousands(&int_str);

    let result = if decimals == 0 {
        grouped
    } else {
        // Format the fractional part to the exact number of decimals.
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` starts with "0.", e.g. "0.50". Strip the leading "0".
        let decimal_digits = &frac_str[1..]; // ".50"
        format!("{}{}", grouped, decimal_digits)
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a KPI amount the way the dashboard cards show it: `USD` followed by
/// the value with exactly two decimals and no grouping.
///
/// # Examples
///
/// ```
/// use insights_core::formatting::format_usd;
///
/// assert_eq!(format_usd(1234.5), "USD 1234.50");
/// assert_eq!(format_usd(0.0),    "USD 0.00");
/// assert_eq!(format_usd(-3.456), "USD -3.46");
/// ```
pub fn format_usd(amount: f64) -> String {
    format!("USD {:.2}", amount)
}

/// Format a monetary amount for tables and chart labels: two decimals with
/// thousands separators.
///
/// # Examples
///
/// ```
/// use insights_core::formatting::format_amount;
///
/// assert_eq!(format_amount(1234.56), "1,234.56");
/// assert_eq!(format_amount(-9.99),   "-9.99");
/// ```
pub fn format_amount(amount: f64) -> String {
    format_number(amount, 2)
}

/// Format an optional amount, rendering `None` as an empty string.
pub fn format_optional_amount(amount: Option<f64>) -> String {
    amount.map(format_amount).unwrap_or_default()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_no_thousands() {
        assert_eq!(format_number(123.456, 2), "123.46");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
    }

    #[test]
    fn test_format_number_millions() {
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_exact_thousands() {
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_small_decimals() {
        assert_eq!(format_number(0.001, 3), "0.001");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    // ── format_usd ───────────────────────────────────────────────────────────

    #[test]
    fn test_format_usd_two_decimals_no_grouping() {
        assert_eq!(format_usd(1_234_567.891), "USD 1234567.89");
    }

    #[test]
    fn test_format_usd_zero() {
        assert_eq!(format_usd(0.0), "USD 0.00");
    }

    // ── format_amount ────────────────────────────────────────────────────────

    #[test]
    fn test_format_amount_grouped() {
        assert_eq!(format_amount(1_000_000.0), "1,000,000.00");
    }

    #[test]
    fn test_format_optional_amount_none_is_blank() {
        assert_eq!(format_optional_amount(None), "");
        assert_eq!(format_optional_amount(Some(2.5)), "2.50");
    }

    // ── group_thousands (via format_number) ──────────────────────────────────

    #[test]
    fn test_group_thousands_one_digit() {
        assert_eq!(format_number(5.0, 0), "5");
    }

    #[test]
    fn test_group_thousands_four_digits() {
        assert_eq!(format_number(1234.0, 0), "1,234");
    }

    #[test]
    fn test_group_thousands_seven_digits() {
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }
}
