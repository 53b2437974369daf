use std::collections::HashMap;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;

/// 股票代號對應的公司名稱
static COMPANY_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("AAPL", "Apple Inc."),
        ("MSFT", "Microsoft Corporation"),
        ("GOOGL", "Alphabet Inc."),
        ("AMZN", "Amazon.com Inc."),
        ("TSLA", "Tesla Inc."),
    ])
});

/// 回傳股票的顯示名稱，查不到時直接使用代號
pub fn company_name(symbol: &str) -> &str {
    COMPANY_NAMES.get(symbol).copied().unwrap_or(symbol)
}

/// 單次抓取到的報價，只在記憶體中流動，寫檔前一律轉成 `MarketRow`
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}

impl Quote {
    pub fn new(symbol: &str, price: Decimal) -> Self {
        Quote {
            symbol: symbol.to_string(),
            name: company_name(symbol).to_string(),
            price,
        }
    }
}

/// 行情檔中的一列：代號、名稱、價格
///
/// 價格保留讀到的原始字串，沿用舊資料時可原封不動寫回。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRow {
    pub symbol: String,
    pub name: String,
    pub price: String,
}

impl MarketRow {
    pub fn to_record(&self) -> [&str; 3] {
        [&self.symbol, &self.name, &self.price]
    }
}

impl From<Quote> for MarketRow {
    fn from(quote: Quote) -> Self {
        MarketRow {
            symbol: quote.symbol,
            name: quote.name,
            price: quote.price.to_string(),
        }
    }
}
