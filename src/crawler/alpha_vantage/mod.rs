//! # Alpha Vantage 行情採集模組
//!
//! 透過 Alpha Vantage 的 REST API 取得美股即時報價。
//!
//! ## 站點資訊
//!
//! - 來源域名：`www.alphavantage.co`
//! - 存取方式：HTTP GET 搭配 `apikey` 查詢參數
//! - 主要端點：`/query?function=GLOBAL_QUOTE&symbol={symbol}`
//! - 免費方案限制：每分鐘 5 次

use crate::config;

/// 即時報價子模組
pub mod quote;

/// 報價查詢使用的 function 名稱
const FUNCTION: &str = "GLOBAL_QUOTE";

/// Alpha Vantage 行情採集器
pub struct AlphaVantage {
    api_key: String,
    base_url: String,
}

impl AlphaVantage {
    pub fn new(settings: &config::AlphaVantage) -> Self {
        AlphaVantage {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }
}
