//! Opening a ticker's quote page in the system browser.

use std::io;

const QUOTE_PAGE_URL: &str = "https://finance.yahoo.com/quote/";

/// Quote page for `ticker`.
pub fn quote_url(ticker: &str) -> String {
    format!("{QUOTE_PAGE_URL}{}", urlencoding::encode(ticker))
}

/// Hand `url` to the platform's URL opener without waiting for it.
///
/// Platforms without a known opener report an error.
pub fn open_url(url: &str) -> io::Result<()> {
    open::that_detached(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_url() {
        assert_eq!(quote_url("AAPL"), "https://finance.yahoo.com/quote/AAPL");
        assert_eq!(quote_url("^GSPC"), "https://finance.yahoo.com/quote/%5EGSPC");
    }
}
