//! Yahoo Finance quote client.

use crate::error::FetchError;
use crate::models::Quote;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default quote endpoint.
pub const YAHOO_FINANCE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Yahoo rejects requests without a browser-looking agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Market index symbols shown in the summary band.
pub const MARKET_SYMBOLS: [&str; 14] = [
    "^DJI", "^GSPC", "^IXIC", "^N225", "^HSI", "^FTSE", "^GDAXI", "^TNX", "CAD=X", "EURUSD=X",
    "RMB=F", "CL=F", "GC=F", "BTC-USD",
];

/// Human-readable name for a market index symbol.
pub fn market_name(symbol: &str) -> &str {
    match symbol {
        "^DJI" => "Dow Jones",
        "^GSPC" => "S&P 500",
        "^IXIC" => "NASDAQ",
        "^N225" => "Nikkei",
        "^HSI" => "Hong Kong",
        "^FTSE" => "London",
        "^GDAXI" => "Frankfurt",
        "^TNX" => "10-Year Yield",
        "CAD=X" => "CAD",
        "EURUSD=X" => "Euro",
        "RMB=F" => "RMB",
        "CL=F" => "Oil",
        "GC=F" => "Gold",
        "BTC-USD" => "Bitcoin",
        other => other,
    }
}

/// Anything that can turn a list of symbols into quotes.
pub trait QuoteSource {
    /// Fetch quotes for `tickers`. An empty list yields an empty snapshot.
    async fn fetch_quotes(&self, tickers: &[String]) -> Result<Vec<Quote>, FetchError>;
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn quote_url(&self, tickers: &[String]) -> String {
        let symbols = tickers
            .iter()
            .map(|t| urlencoding::encode(t).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}?symbols={}", self.base_url, symbols)
    }
}

impl QuoteSource for YahooFinanceClient {
    async fn fetch_quotes(&self, tickers: &[String]) -> Result<Vec<Quote>, FetchError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let response = self.client.get(self.quote_url(tickers)).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        let quotes = parse_quotes(&body)?;
        debug!(requested = tickers.len(), received = quotes.len(), "fetched quotes");
        Ok(quotes)
    }
}

/// Decode a `{"quoteResponse": {"result": [...]}}` body.
///
/// Entries without a symbol cannot be shown or matched, so they are skipped
/// instead of failing the whole snapshot.
pub fn parse_quotes(body: &str) -> Result<Vec<Quote>, FetchError> {
    let data: YahooResponse = serde_json::from_str(body)?;
    Ok(data
        .quote_response
        .result
        .into_iter()
        .filter(|quote| !quote.symbol.is_empty())
        .map(YahooQuote::into_quote)
        .collect())
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooResponse {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_change: Option<f64>,
    #[serde(default)]
    regular_market_change_percent: Option<f64>,
    #[serde(default)]
    regular_market_open: Option<f64>,
    #[serde(default)]
    regular_market_day_low: Option<f64>,
    #[serde(default)]
    regular_market_day_high: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<f64>,
    #[serde(default)]
    average_daily_volume10_day: Option<f64>,
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<f64>,
    #[serde(default)]
    trailing_annual_dividend_yield: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    earnings_timestamp: Option<i64>,
    #[serde(default)]
    pre_market_change_percent: Option<f64>,
    #[serde(default)]
    post_market_change_percent: Option<f64>,
}

impl YahooQuote {
    fn into_quote(self) -> Quote {
        Quote {
            symbol: self.symbol,
            last: self.regular_market_price.unwrap_or(0.0),
            change: self.regular_market_change.unwrap_or(0.0),
            change_percent: self.regular_market_change_percent.unwrap_or(0.0),
            open: self.regular_market_open.unwrap_or(0.0),
            low: self.regular_market_day_low.unwrap_or(0.0),
            high: self.regular_market_day_high.unwrap_or(0.0),
            volume: self.regular_market_volume.unwrap_or(0.0),
            avg_volume: self.average_daily_volume10_day.unwrap_or(0.0),
            pe_ratio: self.trailing_pe.unwrap_or(0.0),
            dividend_yield: self.trailing_annual_dividend_yield.unwrap_or(0.0),
            market_cap: self.market_cap.unwrap_or(0.0),
            earnings_timestamp: self.earnings_timestamp,
            pre_market_change_percent: self.pre_market_change_percent.unwrap_or(0.0),
            post_market_change_percent: self.post_market_change_percent.unwrap_or(0.0),
        }
    }
}
