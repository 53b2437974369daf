pub mod config;
pub mod crawler;
pub mod declare;
pub mod logging;
pub mod market;
pub mod util;

use crate::{
    crawler::alpha_vantage::AlphaVantage,
    market::{pacing::FixedPacing, reconciler::Reconciler},
};

/// 執行一次完整的行情更新後結束，週期由外部排程（cron、systemd timer）決定
#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv::dotenv().ok();
    let settings = config::App::load();

    if settings.alpha_vantage.api_key.trim().is_empty() {
        logging::error_file_async(
            "ALPHA_VANTAGE_API_KEY is not set, skip market data update".to_string(),
        );
        logging::flush();
        return;
    }

    if settings.market.symbols.is_empty() {
        logging::error_file_async("No symbols configured, skip market data update".to_string());
        logging::flush();
        return;
    }

    let reconciler = Reconciler::new(
        AlphaVantage::new(&settings.alpha_vantage),
        FixedPacing::from_settings(&settings.market),
        settings.market.storage_path(),
    );

    logging::info_file_async(format!(
        "Starting market data update symbols={} path={}",
        settings.market.symbols.join(","),
        reconciler.storage_path().display()
    ));

    let summary = reconciler.run(&settings.market.symbols).await;

    logging::info_file_async(format!(
        "Market data update finished rows={} fresh={} persisted={}",
        summary.total_rows, summary.fresh_count, summary.persisted
    ));
    logging::flush();
}
