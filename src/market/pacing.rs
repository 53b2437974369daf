use std::time::Duration;

use async_trait::async_trait;

use crate::config;

/// 兩檔股票之間的等待策略
///
/// 報價服務限制每分鐘呼叫次數，每檔抓完都要等；收到限流回應時再額外冷卻。
#[async_trait]
pub trait Pacing {
    /// 每檔股票處理完後固定等待，不論成功或失敗
    async fn between_symbols(&self);
    /// 報價服務回報限流後，抓下一檔之前的額外等待
    async fn after_rate_limit(&self);
}

/// 固定秒數的等待策略
#[derive(Debug, Clone)]
pub struct FixedPacing {
    per_symbol: Duration,
    cooldown: Duration,
}

impl FixedPacing {
    pub fn new(per_symbol: Duration, cooldown: Duration) -> Self {
        FixedPacing {
            per_symbol,
            cooldown,
        }
    }

    pub fn from_settings(settings: &config::Market) -> Self {
        Self::new(settings.per_symbol_delay(), settings.rate_limit_cooldown())
    }
}

#[async_trait]
impl Pacing for FixedPacing {
    async fn between_symbols(&self) {
        tokio::time::sleep(self.per_symbol).await;
    }

    async fn after_rate_limit(&self) {
        tokio::time::sleep(self.cooldown).await;
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_pacing_waits() {
        let pacing = FixedPacing::from_settings(&config::Market::default());

        let start = Instant::now();
        pacing.between_symbols().await;
        assert_eq!(start.elapsed().as_secs(), 12);

        let start = Instant::now();
        pacing.after_rate_limit().await;
        assert_eq!(start.elapsed().as_secs(), 15);
    }

    #[tokio::test]
    async fn test_zero_pacing_returns_immediately() {
        let pacing = FixedPacing::new(Duration::ZERO, Duration::ZERO);

        let start = Instant::now();
        pacing.between_symbols().await;
        pacing.after_rate_limit().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
