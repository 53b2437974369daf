use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{
    crawler::QuoteFetcher,
    declare::MarketRow,
    logging,
    market::{pacing::Pacing, table, table::MarketTable},
};

/// 一次更新的結果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 這次成功抓到新報價的檔數
    pub fresh_count: usize,
    /// 這次輸出的總列數（新報價 + 沿用舊資料）
    pub total_rows: usize,
    /// 行情檔是否已被覆寫
    pub persisted: bool,
}

/// 合併新報價與上次行情並寫回行情檔
///
/// 同一個行情檔同時間只能有一個 `run` 在執行。
pub struct Reconciler<F, P> {
    fetcher: F,
    pacing: P,
    storage_path: PathBuf,
}

impl<F, P> Reconciler<F, P>
where
    F: QuoteFetcher + Send + Sync,
    P: Pacing + Send + Sync,
{
    pub fn new(fetcher: F, pacing: P, storage_path: impl Into<PathBuf>) -> Self {
        Reconciler {
            fetcher,
            pacing,
            storage_path: storage_path.into(),
        }
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// 依 `symbols` 的順序逐檔更新，最後整檔覆寫行情檔
    ///
    /// 抓價成功使用新報價；失敗時沿用上次的列，沒有舊資料則這次不輸出該檔。
    /// 不在 `symbols` 內的舊資料不會被寫回。任何錯誤都只記錄日誌，不會往外傳。
    pub async fn run(&self, symbols: &[String]) -> RunSummary {
        logging::info_file_async(format!(
            "reconcile start symbols={} path={}",
            symbols.len(),
            self.storage_path.display()
        ));

        let existing = match MarketTable::load(&self.storage_path) {
            Ok(table) => table,
            Err(why) => {
                logging::error_file_async(format!(
                    "reconcile Error reading existing market data path={} because {:#}",
                    self.storage_path.display(),
                    why
                ));
                MarketTable::default()
            }
        };

        let mut rows: Vec<MarketRow> = Vec::with_capacity(symbols.len());
        let mut summary = RunSummary::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(symbols.len());

        for symbol in symbols {
            if !seen.insert(symbol.as_str()) {
                logging::debug_file_async(format!("reconcile symbol={} duplicated, skip", symbol));
                continue;
            }

            match self.fetcher.fetch(symbol).await {
                Ok(quote) => {
                    rows.push(MarketRow::from(quote));
                    summary.fresh_count += 1;
                }
                Err(why) => {
                    if let Some(cached) = existing.get(symbol) {
                        logging::warn_file_async(format!(
                            "reconcile symbol={} using cached row price={} because {}",
                            symbol,
                            cached.price,
                            why.kind()
                        ));
                        rows.push(cached.clone());
                    } else {
                        logging::warn_file_async(format!(
                            "reconcile symbol={} dropped, no cached row because {}",
                            symbol,
                            why.kind()
                        ));
                    }

                    if why.is_rate_limited() {
                        self.pacing.after_rate_limit().await;
                    }
                }
            }

            self.pacing.between_symbols().await;
        }

        summary.total_rows = rows.len();

        if rows.is_empty() {
            logging::error_file_async(format!(
                "reconcile No data to write path={}",
                self.storage_path.display()
            ));
            return summary;
        }

        match table::save(&self.storage_path, &rows) {
            Ok(_) => {
                summary.persisted = true;
                logging::info_file_async(format!(
                    "reconcile rows={} fresh={} cached={} path={}",
                    summary.total_rows,
                    summary.fresh_count,
                    summary.total_rows - summary.fresh_count,
                    self.storage_path.display()
                ));
            }
            Err(why) => {
                logging::error_file_async(format!(
                    "reconcile Error writing market data path={} because {:#}",
                    self.storage_path.display(),
                    why
                ));
            }
        }

        summary
    }
}
