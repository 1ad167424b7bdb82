use log::warn;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Decimals are stored as TEXT; an unreadable value reads as zero.
pub(crate) fn decimal_from_text(column: &str, value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_else(|_| {
        warn!("[Storage] Unreadable decimal in {}: '{}'", column, value);
        Decimal::ZERO
    })
}

/// Escapes `%`, `_` and `\` for use in a LIKE pattern with `\` as escape.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
