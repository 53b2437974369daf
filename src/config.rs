use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use ::config::{Config as config_config, File as config_file};
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::logging;

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub alpha_vantage: AlphaVantage,
    #[serde(default)]
    pub market: Market,
}

const ALPHA_VANTAGE_API_KEY: &str = "ALPHA_VANTAGE_API_KEY";
const ALPHA_VANTAGE_BASE_URL: &str = "ALPHA_VANTAGE_BASE_URL";

/// Alpha Vantage 報價服務的連線設定
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AlphaVantage {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for AlphaVantage {
    fn default() -> Self {
        AlphaVantage {
            api_key: String::new(),
            base_url: default_base_url(),
        }
    }
}

const MARKET_SYMBOLS: &str = "MARKET_SYMBOLS";
const MARKET_STORAGE_PATH: &str = "MARKET_STORAGE_PATH";
const MARKET_PER_SYMBOL_DELAY_SECONDS: &str = "MARKET_PER_SYMBOL_DELAY_SECONDS";
const MARKET_RATE_LIMIT_COOLDOWN_SECONDS: &str = "MARKET_RATE_LIMIT_COOLDOWN_SECONDS";

/// 要追蹤的股票與行情檔的存放設定
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Market {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// 每檔股票之間固定等待的秒數，免費方案每分鐘只能呼叫 5 次
    #[serde(default = "default_per_symbol_delay_seconds")]
    pub per_symbol_delay_seconds: u64,
    /// 收到限流回應後額外等待的秒數
    #[serde(default = "default_rate_limit_cooldown_seconds")]
    pub rate_limit_cooldown_seconds: u64,
}

impl Default for Market {
    fn default() -> Self {
        Market {
            symbols: default_symbols(),
            storage_path: default_storage_path(),
            per_symbol_delay_seconds: default_per_symbol_delay_seconds(),
            rate_limit_cooldown_seconds: default_rate_limit_cooldown_seconds(),
        }
    }
}

impl Market {
    pub fn per_symbol_delay(&self) -> Duration {
        Duration::from_secs(self.per_symbol_delay_seconds)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_seconds)
    }

    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_path)
    }
}

fn default_base_url() -> String {
    "https://www.alphavantage.co".to_string()
}

fn default_symbols() -> Vec<String> {
    ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_storage_path() -> String {
    "db/market.csv".to_string()
}

fn default_per_symbol_delay_seconds() -> u64 {
    12
}

fn default_rate_limit_cooldown_seconds() -> u64 {
    15
}

impl App {
    /// 讀取 app.json（若存在），再以環境變數覆蓋。設定檔格式錯誤時記錄後改用預設值
    pub fn load() -> Self {
        let app = match Self::from_file(&config_path()) {
            Ok(app) => app,
            Err(why) => {
                logging::error_file_async(format!(
                    "I can't read the config context because {:?}",
                    why
                ));
                App::default()
            }
        };

        app.override_with_env().normalize()
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(App::default());
        }

        let config: App = config_config::builder()
            .add_source(config_file::from(path))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(key) = env::var(ALPHA_VANTAGE_API_KEY) {
            self.alpha_vantage.api_key = key;
        }

        if let Ok(url) = env::var(ALPHA_VANTAGE_BASE_URL) {
            self.alpha_vantage.base_url = url;
        }

        if let Ok(symbols) = env::var(MARKET_SYMBOLS) {
            self.market.symbols = parse_symbols(&symbols);
        }

        if let Ok(path) = env::var(MARKET_STORAGE_PATH) {
            self.market.storage_path = path;
        }

        if let Ok(delay) = env::var(MARKET_PER_SYMBOL_DELAY_SECONDS) {
            self.market.per_symbol_delay_seconds =
                u64::from_str(delay.trim()).unwrap_or(self.market.per_symbol_delay_seconds);
        }

        if let Ok(cooldown) = env::var(MARKET_RATE_LIMIT_COOLDOWN_SECONDS) {
            self.market.rate_limit_cooldown_seconds =
                u64::from_str(cooldown.trim()).unwrap_or(self.market.rate_limit_cooldown_seconds);
        }

        self
    }

    /// 股票代號轉大寫並去除重複，保留第一次出現的順序
    fn normalize(mut self) -> Self {
        let mut symbols: Vec<String> = Vec::with_capacity(self.market.symbols.len());
        for symbol in &self.market.symbols {
            let symbol = symbol.trim().to_uppercase();
            if symbol.is_empty() || symbols.contains(&symbol) {
                continue;
            }
            symbols.push(symbol);
        }

        self.market.symbols = symbols;
        self.alpha_vantage.base_url = self
            .alpha_vantage
            .base_url
            .trim_end_matches('/')
            .to_string();
        self
    }
}

/// 解析以逗號分隔的股票代號，例︰"AAPL, MSFT,,TSLA"
fn parse_symbols(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
