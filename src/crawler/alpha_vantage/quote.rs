use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    crawler::{
        alpha_vantage::{AlphaVantage, FUNCTION},
        FetchFailure, QuoteFetcher,
    },
    declare::Quote,
    logging,
    util,
};

/// GLOBAL_QUOTE 回應
///
/// 成功、錯誤與限流三種格式共用同一個結構，只保留判斷所需欄位。
#[derive(Deserialize, Debug, Default)]
struct Response {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

/// 依回應內容判斷結果，成功時回傳價格
///
/// 判斷順序：錯誤訊息 → 限流 → 報價。
fn classify(body: &str) -> Result<Decimal, FetchFailure> {
    let res = serde_json::from_str::<Response>(body)
        .map_err(|_| FetchFailure::MalformedResponse(body.to_string()))?;

    if let Some(msg) = res.error_message {
        return Err(FetchFailure::Provider(msg));
    }

    if let Some(note) = res.note.as_deref() {
        if note.contains("API call frequency") {
            return Err(FetchFailure::RateLimited(note.to_string()));
        }
    }

    if let Some(info) = res.information.as_deref() {
        if info.to_lowercase().contains("rate limit") {
            return Err(FetchFailure::RateLimited(info.to_string()));
        }
    }

    match res.global_quote.and_then(|q| q.price) {
        Some(price) => Decimal::from_str(price.trim())
            .map_err(|_| FetchFailure::MalformedResponse(body.to_string())),
        None => Err(FetchFailure::MalformedResponse(body.to_string())),
    }
}

impl AlphaVantage {
    async fn fetch_data(&self, symbol: &str) -> Result<Quote, FetchFailure> {
        let body = util::http::get_with_query(
            &self.query_url(),
            &[
                ("function", FUNCTION),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .await
        .map_err(|why| FetchFailure::Transport(format!("{:#}", why)))?;

        let price = classify(&body)?;

        Ok(Quote::new(symbol, price))
    }
}

#[async_trait]
impl QuoteFetcher for AlphaVantage {
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchFailure> {
        let result = self.fetch_data(symbol).await;

        match &result {
            Ok(quote) => logging::info_file_async(format!(
                "fetch symbol={} result=ok price={}",
                symbol, quote.price
            )),
            Err(why) if why.is_rate_limited() => logging::warn_file_async(format!(
                "fetch symbol={} result={} message={}",
                symbol,
                why.kind(),
                why.message()
            )),
            Err(why) => logging::error_file_async(format!(
                "fetch symbol={} result={} message={}",
                symbol,
                why.kind(),
                why.message()
            )),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config;

    #[test]
    fn test_classify_success() {
        let body = r#"{
            "Global Quote": {
                "01. symbol": "AAPL",
                "02. open": "149.0000",
                "05. price": "150.2500",
                "07. latest trading day": "2024-05-10"
            }
        }"#;

        let price = classify(body).unwrap();
        assert_eq!(price, dec!(150.25));
        assert_eq!(price.to_string(), "150.2500");
    }

    #[test]
    fn test_classify_provider_error() {
        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        assert_eq!(
            classify(body),
            Err(FetchFailure::Provider(
                "Invalid API call. Please retry or visit the documentation.".to_string()
            ))
        );
    }

    #[test]
    fn test_classify_rate_limited_note() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute and 500 calls per day."}"#;
        assert!(classify(body).unwrap_err().is_rate_limited());
    }

    #[test]
    fn test_classify_rate_limited_information() {
        let body = r#"{"Information": "We have detected your API key as demo and our standard API rate limit is 25 requests per day."}"#;
        assert!(classify(body).unwrap_err().is_rate_limited());
    }

    #[test]
    fn test_classify_unrelated_note_is_malformed() {
        let body = r#"{"Note": "scheduled maintenance"}"#;
        assert_eq!(
            classify(body).unwrap_err().kind(),
            "malformed_response"
        );
    }

    #[test]
    fn test_classify_malformed() {
        for body in [
            r#"{"Global Quote": {}}"#,
            r#"{"Global Quote": {"05. price": "n/a"}}"#,
            r#"{}"#,
            "<html>Service Unavailable</html>",
        ] {
            assert_eq!(
                classify(body),
                Err(FetchFailure::MalformedResponse(body.to_string())),
                "{}",
                body
            );
        }
    }

    #[test]
    fn test_classify_price_is_not_rewritten() {
        for price in ["15,0", "1 50.25", "$150.25"] {
            let body = format!(r#"{{"Global Quote": {{"05. price": "{}"}}}}"#, price);
            assert_eq!(
                classify(&body),
                Err(FetchFailure::MalformedResponse(body.clone())),
                "{}",
                price
            );
        }

        let body = r#"{"Global Quote": {"05. price": " 310.10 "}}"#;
        assert_eq!(classify(body).unwrap().to_string(), "310.10");
    }

    #[tokio::test]
    async fn test_fetch_transport_failure_hides_api_key() {
        let fetcher = AlphaVantage::new(&config::AlphaVantage {
            api_key: "SECRETKEY123".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
        });

        let failure = fetcher.fetch("AAPL").await.unwrap_err();
        assert_eq!(failure.kind(), "transport_failure");
        assert!(!failure.message().contains("SECRETKEY123"), "{}", failure);
        assert!(!failure.to_string().contains("apikey="), "{}", failure);
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        let fetcher = AlphaVantage::new(&config::AlphaVantage {
            api_key: "demo".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
        });

        let failure = fetcher.fetch("AAPL").await.unwrap_err();
        assert_eq!(failure.kind(), "transport_failure");
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_live() {
        dotenv::dotenv().ok();
        let settings = config::App::load();
        let fetcher = AlphaVantage::new(&settings.alpha_vantage);

        match fetcher.fetch("IBM").await {
            Ok(quote) => logging::debug_file_async(format!("alpha vantage quote: {:?}", quote)),
            Err(why) => logging::debug_file_async(format!(
                "Failed to alpha_vantage::fetch because {:?}",
                why
            )),
        }

        logging::flush();
    }
}
