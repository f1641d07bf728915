//! Presentation formatting helpers.
//!
//! The only place amounts are rounded; everything upstream accumulates at
//! full precision.

use rust_decimal::Decimal;

use crate::domain::value_objects::Money;

/// Formats a price with its currency symbol and two decimal places, with
/// thousands grouping: `$1,299.50`.
pub fn format_price(price: &Money) -> String {
    let symbol = currency_symbol(price.currency());
    let rounded = price.rounded();
    let negative = rounded.is_sign_negative();
    let abs = rounded.abs();

    let text = format!("{abs:.2}");
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let grouped = group_thousands(int_part);

    match symbol {
        Some(sym) => {
            if negative {
                format!("-{sym}{grouped}.{frac_part}")
            } else {
                format!("{sym}{grouped}.{frac_part}")
            }
        }
        None => {
            if negative {
                format!("-{grouped}.{frac_part} {}", price.currency())
            } else {
                format!("{grouped}.{frac_part} {}", price.currency())
            }
        }
    }
}

/// Formats a percentage value such as a discount: `format_percentage(12.5, 1)`
/// is `"12.5%"`.
pub fn format_percentage(value: Decimal, decimals: u32) -> String {
    format!("{}%", value.round_dp(decimals))
}

/// Groups a 10- or 11-digit phone number for display; anything else is
/// returned untouched.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
        11 => format!(
            "+{} ({}) {}-{}",
            &digits[..1],
            &digits[1..4],
            &digits[4..7],
            &digits[7..]
        ),
        _ => phone.to_string(),
    }
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        _ => None,
    }
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}
