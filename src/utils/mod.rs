//! Utility functions for formatting and common operations
//!
//! Centralized formatting for currency, percentage and weight values so the
//! table and JSON outputs agree on rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "$" prefix
    Usd,
    /// No currency symbol (for JSON amounts in the transaction log)
    None,
}

/// Round half away from zero to `dp` places; a result of zero is never signed
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Core formatting function with full control over output.
///
/// Two decimals, `,` thousands separator, sign before the symbol.
///
/// # Examples
/// ```
/// use poolshare::utils::{format_currency_with_width, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234.56), 0, CurrencySymbol::Usd),
///     "$1,234.56"
/// );
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234), 12, CurrencySymbol::None),
///     "    1,234.00"
/// );
/// ```
pub fn format_currency_with_width(value: Decimal, width: usize, symbol: CurrencySymbol) -> String {
    let rounded = round_half_up(value, 2);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let prefix = match symbol {
        CurrencySymbol::Usd => "$",
        CurrencySymbol::None => "",
    };

    let result = format!("{}{}{}.{}", sign, prefix, with_separators, decimal_part);

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

// ============ Convenience functions ============

/// Format with dollar sign: "$1,234.56"
///
/// # Examples
/// ```
/// use poolshare::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(800)), "$800.00");
/// assert_eq!(format_currency(dec!(-500)), "-$500.00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::Usd)
}

/// Plain two-decimal amount without grouping: "1234.50"
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_half_up(value, 2))
}

/// Two-decimal percentage: "33.33%"
///
/// # Examples
/// ```
/// use poolshare::utils::format_percentage;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_percentage(dec!(33.3333)), "33.33%");
/// assert_eq!(format_percentage(dec!(-12.5)), "-12.50%");
/// ```
pub fn format_percentage(value: Decimal) -> String {
    format!("{:.2}%", round_half_up(value, 2))
}

/// Ownership fraction with six decimals, as logged during allocation
pub fn format_weight(value: Decimal) -> String {
    format!("{:.6}", round_half_up(value, 6))
}
