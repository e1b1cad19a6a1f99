//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Format a monetary amount with two decimal places.
///
/// Usage in templates: `{{ line.line_total|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("{value:.2}"))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    #[test]
    fn money_pads_to_two_decimal_places() {
        let whole: Decimal = "850".parse().expect("valid decimal");
        assert_eq!(format!("{whole:.2}"), "850.00");

        let cents: Decimal = "156.5".parse().expect("valid decimal");
        assert_eq!(format!("{cents:.2}"), "156.50");
    }
}
