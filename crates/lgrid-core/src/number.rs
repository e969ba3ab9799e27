//! Locale-formatted amount parsing shared by every computation over cells.
//!
//! Contract: surrounding whitespace and grouping separators are ignored, the
//! locale decimal separator is honoured, and anything that is not a finite
//! number afterwards (including the empty string and the no-payment marker)
//! contributes zero.

use lgrid_domain::Cell;

/// Separators used when reading amounts typed into the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    pub grouping_separator: char,
    pub decimal_separator: char,
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self {
            grouping_separator: ',',
            decimal_separator: '.',
        }
    }
}

/// Parses a locale-formatted amount, returning `None` for blank or non-numeric text.
pub fn parse_amount(raw: &str, locale: &NumberLocale) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut normalized: String = trimmed
        .chars()
        .filter(|ch| *ch != locale.grouping_separator)
        .collect();
    if locale.decimal_separator != '.' {
        normalized = normalized.replace(locale.decimal_separator, ".");
    }
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Numeric contribution of a cell: its amount, or zero when it has none.
pub fn cell_amount(cell: &Cell, locale: &NumberLocale) -> f64 {
    match cell {
        Cell::Number(value) => *value,
        Cell::Text(raw) => parse_amount(raw, locale).unwrap_or(0.0),
        Cell::Empty | Cell::NoPayment => 0.0,
    }
}

/// Converts raw widget input into a cell; amounts become numbers in numeric columns.
pub fn normalize_input(raw: &str, numeric: bool, locale: &NumberLocale) -> Cell {
    let cell = Cell::text(raw.trim());
    if !numeric {
        return match cell {
            Cell::Empty | Cell::NoPayment => cell,
            _ => Cell::Text(raw.to_string()),
        };
    }
    if let Cell::Text(text) = &cell {
        if let Some(value) = parse_amount(text, locale) {
            return Cell::Number(value);
        }
    }
    cell
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_separators_are_stripped() {
        let locale = NumberLocale::default();
        assert_eq!(parse_amount("1,000", &locale), Some(1000.0));
        assert_eq!(parse_amount(" 12,345.50 ", &locale), Some(12345.5));
        assert_eq!(parse_amount("-250", &locale), Some(-250.0));
    }

    #[test]
    fn blank_and_non_numeric_text_parse_to_none() {
        let locale = NumberLocale::default();
        assert_eq!(parse_amount("", &locale), None);
        assert_eq!(parse_amount("-", &locale), None);
        assert_eq!(parse_amount("abc", &locale), None);
        assert_eq!(parse_amount("NaN", &locale), None);
        assert_eq!(parse_amount("inf", &locale), None);
    }

    #[test]
    fn comma_decimal_locales_are_supported() {
        let locale = NumberLocale {
            grouping_separator: '.',
            decimal_separator: ',',
        };
        assert_eq!(parse_amount("1.234,5", &locale), Some(1234.5));
    }

    #[test]
    fn cell_amount_treats_markers_and_text_as_zero() {
        let locale = NumberLocale::default();
        assert_eq!(cell_amount(&Cell::NoPayment, &locale), 0.0);
        assert_eq!(cell_amount(&Cell::Empty, &locale), 0.0);
        assert_eq!(cell_amount(&Cell::text("late"), &locale), 0.0);
        assert_eq!(cell_amount(&Cell::text("2,500"), &locale), 2500.0);
    }

    #[test]
    fn normalize_input_respects_column_kind() {
        let locale = NumberLocale::default();
        assert_eq!(normalize_input("1,200", true, &locale), Cell::Number(1200.0));
        assert_eq!(normalize_input("-", true, &locale), Cell::NoPayment);
        assert_eq!(normalize_input("  ", true, &locale), Cell::Empty);
        assert_eq!(normalize_input("n/a", true, &locale), Cell::text("n/a"));
        assert_eq!(normalize_input("1200", false, &locale), Cell::text("1200"));
    }
}
