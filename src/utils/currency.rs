/// Formats an amount as US dollars with thousands separators, e.g. `$1,234.50`.
pub fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = cents / 100;
    let remainder = cents % 100;

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, remainder)
}

pub fn format_percent(rate: f64) -> String {
    let pct = rate * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{:.0}%", pct)
    } else {
        format!("{:.2}%", pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(5.5), "$5.50");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(1100.0), "$1,100.00");
        assert_eq!(format_usd(1234567.891), "$1,234,567.89");
        assert_eq!(format_usd(-240.0), "-$240.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.1), "10%");
        assert_eq!(format_percent(0.125), "12.50%");
        assert_eq!(format_percent(0.0), "0%");
    }
}
