//! # 行情檔維護
//!
//! 讀取上次寫入的行情檔，逐檔抓取新報價，抓不到時沿用舊資料，最後整檔覆寫。

/// 每檔股票之間的節流策略
pub mod pacing;
/// 新舊資料的合併與寫回
pub mod reconciler;
/// 行情檔的讀寫
pub mod table;
