use async_trait::async_trait;
use thiserror::Error;

use crate::declare::Quote;

/// Alpha Vantage
pub mod alpha_vantage;

/// 單一股票抓價失敗的原因，每一種都只影響該檔股票，由呼叫端改用舊資料
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// 報價服務明確回傳錯誤訊息
    #[error("provider error: {0}")]
    Provider(String),
    /// 報價服務表示呼叫次數已達上限，呼叫端應先冷卻再抓下一檔
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// 回應格式不符或價格無法解析
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// 連線或傳輸層的任何錯誤
    #[error("transport failure: {0}")]
    Transport(String),
}

impl FetchFailure {
    /// 寫日誌用的固定標籤
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Provider(_) => "provider_error",
            FetchFailure::RateLimited(_) => "rate_limited",
            FetchFailure::MalformedResponse(_) => "malformed_response",
            FetchFailure::Transport(_) => "transport_failure",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FetchFailure::Provider(msg)
            | FetchFailure::RateLimited(msg)
            | FetchFailure::MalformedResponse(msg)
            | FetchFailure::Transport(msg) => msg,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchFailure::RateLimited(_))
    }
}

/// 取得單一股票的目前報價
///
/// 每次呼叫只送出一次請求，不在內部重試；失敗時由下一次排程重新抓取。
#[async_trait]
pub trait QuoteFetcher {
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchFailure>;
}
