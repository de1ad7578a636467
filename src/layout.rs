//! Column layout shared by the header row and the quote rows.
//!
//! Each column carries its own accessor so rendering and sorting walk the
//! same ordered list instead of inspecting the quote type.

use crate::models::{FieldValue, Quote};
use chrono::DateTime;

/// Date format used for the earnings column.
const EARNINGS_DATE_FORMAT: &str = "%m/%d/%Y";

/// Formatting rules for one displayed field.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Display width in terminal cells
    pub width: usize,
    /// Header label
    pub name: &'static str,
    /// Digits after the decimal point for numeric values
    pub precision: usize,
    /// Prefix non-negative values with `+`
    pub signed: bool,
    /// Pulls this column's value out of a quote
    pub value: fn(&Quote) -> FieldValue<'_>,
}

impl Column {
    const fn new(
        width: usize,
        name: &'static str,
        precision: usize,
        value: fn(&Quote) -> FieldValue<'_>,
    ) -> Self {
        Self {
            width,
            name,
            precision,
            signed: false,
            value,
        }
    }

    const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Render this column's value for a quote, without padding.
    pub fn format(&self, quote: &Quote) -> String {
        match (self.value)(quote) {
            FieldValue::Text(text) => text.to_string(),
            FieldValue::Number(value) => {
                let formatted = format_number(value, self.precision);
                if self.signed && value >= 0.0 {
                    format!("+{formatted}")
                } else {
                    formatted
                }
            }
            FieldValue::Timestamp(ts) => ts
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.format(EARNINGS_DATE_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    /// Render this column's value left-aligned to the column width.
    pub fn format_padded(&self, quote: &Quote) -> String {
        format!("{:<width$}", self.format(quote), width = self.width)
    }
}

/// Ordered set of columns.
#[derive(Debug, Clone)]
pub struct Layout {
    columns: Vec<Column>,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    pub fn new() -> Self {
        let columns = vec![
            Column::new(9, "Ticker", 0, |q| FieldValue::Text(&q.symbol)),
            Column::new(10, "Last", 2, |q| FieldValue::Number(q.last)),
            Column::new(10, "Change", 2, |q| FieldValue::Number(q.change)).signed(),
            Column::new(10, "Change %", 2, |q| FieldValue::Number(q.change_percent)).signed(),
            Column::new(10, "Open", 2, |q| FieldValue::Number(q.open)),
            Column::new(10, "Low", 2, |q| FieldValue::Number(q.low)),
            Column::new(10, "High", 2, |q| FieldValue::Number(q.high)),
            Column::new(10, "Volume", 2, |q| FieldValue::Number(q.volume)),
            Column::new(12, "Avg Volume", 2, |q| FieldValue::Number(q.avg_volume)),
            Column::new(10, "P/E", 2, |q| FieldValue::Number(q.pe_ratio)),
            Column::new(9, "Divd %", 2, |q| FieldValue::Number(q.dividend_yield * 100.0)),
            Column::new(10, "Mkt Cap", 3, |q| FieldValue::Number(q.market_cap)),
            Column::new(12, "Earnings", 0, |q| FieldValue::Timestamp(q.earnings_timestamp)),
            Column::new(11, "PreChg %", 2, |q| {
                FieldValue::Number(q.pre_market_change_percent)
            })
            .signed(),
            Column::new(11, "AfterChg %", 2, |q| {
                FieldValue::Number(q.post_market_change_percent)
            })
            .signed(),
        ];

        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Render a full quote row, every column padded to its width.
    pub fn format_row(&self, quote: &Quote) -> String {
        self.columns
            .iter()
            .map(|column| column.format_padded(quote))
            .collect()
    }
}

/// Format a number with a magnitude suffix.
///
/// The thresholds are a display heuristic: anything above 1e5 is shown in
/// thousands, so 250,000 reads "250.00K".
pub fn format_number(value: f64, precision: usize) -> String {
    let (scaled, suffix) = if value > 1e12 {
        (value / 1e12, "T")
    } else if value > 1e9 {
        (value / 1e9, "B")
    } else if value > 1e6 {
        (value / 1e6, "M")
    } else if value > 1e5 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };

    format!("{scaled:.precision$}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> Column {
        *Layout::new()
            .columns()
            .iter()
            .find(|c| c.name == name)
            .unwrap()
    }

    #[test]
    fn test_format_number_suffixes() {
        assert_eq!(format_number(1_500_000.0, 2), "1.50M");
        assert_eq!(format_number(2_300_000_000_000.0, 2), "2.30T");
        assert_eq!(format_number(4_200_000_000.0, 3), "4.200B");
        assert_eq!(format_number(250_000.0, 2), "250.00K");
        assert_eq!(format_number(42.5, 2), "42.50");
    }

    #[test]
    fn test_format_number_thresholds_are_exclusive() {
        assert_eq!(format_number(100_000.0, 0), "100000");
        assert_eq!(format_number(1_000_000.0, 2), "1000.00K");
    }

    #[test]
    fn test_change_columns_are_signed() {
        let quote = Quote {
            change: 1.5,
            change_percent: -0.25,
            pre_market_change_percent: 0.0,
            last: 3.0,
            ..Default::default()
        };
        assert_eq!(column("Change").format(&quote), "+1.50");
        assert_eq!(column("Change %").format(&quote), "-0.25");
        assert_eq!(column("PreChg %").format(&quote), "+0.00");
        assert_eq!(column("Last").format(&quote), "3.00");
    }

    #[test]
    fn test_dividend_is_percent() {
        let quote = Quote {
            dividend_yield: 0.0123,
            ..Default::default()
        };
        assert_eq!(column("Divd %").format(&quote), "1.23");
    }

    #[test]
    fn test_earnings_date() {
        let mut quote = Quote {
            earnings_timestamp: Some(1_700_000_000),
            ..Default::default()
        };
        assert_eq!(column("Earnings").format(&quote), "11/14/2023");
        quote.earnings_timestamp = None;
        assert_eq!(column("Earnings").format(&quote), "-");
    }

    #[test]
    fn test_row_is_padded_per_column() {
        let layout = Layout::new();
        let quote = Quote {
            symbol: "AAPL".to_string(),
            ..Default::default()
        };
        let row = layout.format_row(&quote);
        let total: usize = layout.columns().iter().map(|c| c.width).sum();
        assert_eq!(row.chars().count(), total);
        assert!(row.starts_with("AAPL     0.00      "));
    }
}
