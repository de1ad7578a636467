//! Data models for quotes and sort state.

use std::cmp::Ordering;

/// A single quote as returned by one refresh.
///
/// Quotes are never edited in place; every fetch replaces the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quote {
    /// Ticker symbol (e.g., "AAPL", "BTC-USD")
    pub symbol: String,
    /// Last traded price
    pub last: f64,
    /// Absolute change from previous close
    pub change: f64,
    /// Percent change from previous close
    pub change_percent: f64,
    /// Opening price for the day
    pub open: f64,
    /// Day's low price
    pub low: f64,
    /// Day's high price
    pub high: f64,
    /// Trading volume
    pub volume: f64,
    /// Average daily volume
    pub avg_volume: f64,
    /// Trailing price/earnings ratio
    pub pe_ratio: f64,
    /// Trailing annual dividend yield as a fraction (0.012 == 1.2%)
    pub dividend_yield: f64,
    /// Market capitalization
    pub market_cap: f64,
    /// Next earnings date as a unix timestamp
    pub earnings_timestamp: Option<i64>,
    /// Pre-market change percent
    pub pre_market_change_percent: f64,
    /// After-hours change percent
    pub post_market_change_percent: f64,
}

/// A field value pulled out of a quote by a column accessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Timestamp(Option<i64>),
}

impl FieldValue<'_> {
    /// Compare two values of the same column.
    ///
    /// Numbers compare numerically, text lexicographically. Mismatched kinds
    /// never occur within one column and compare equal.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Sort direction applied to the selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn is_active(self) -> bool {
        self != SortDirection::None
    }

    /// Header glyph shown next to the sorted column.
    pub fn glyph(self) -> &'static str {
        match self {
            SortDirection::None => "",
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }

    /// Orient an ascending comparison result for this direction.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Descending => ordering.reverse(),
            _ => ordering,
        }
    }
}
