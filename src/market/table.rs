use std::{
    collections::HashMap,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, Terminator, WriterBuilder};

use crate::declare::MarketRow;

/// 上次寫入的行情，以股票代號為鍵，每檔最多一列
#[derive(Debug, Default)]
pub struct MarketTable {
    rows: HashMap<String, MarketRow>,
}

impl MarketTable {
    /// 讀取整個行情檔
    ///
    /// 檔案不存在視為空表；欄位少於三個的列會被略過，同一代號出現多次時以後者為準。
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(MarketTable::default());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut rows = HashMap::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
            if record.len() < 3 {
                continue;
            }

            let row = MarketRow {
                symbol: record[0].to_string(),
                name: record[1].to_string(),
                price: record[2].to_string(),
            };
            rows.insert(row.symbol.clone(), row);
        }

        Ok(MarketTable { rows })
    }

    pub fn get(&self, symbol: &str) -> Option<&MarketRow> {
        self.rows.get(symbol)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 以 `rows` 整檔覆寫行情檔
///
/// 先寫到同目錄的暫存檔再改名，寫入失敗時原檔保持不變。
pub fn save(path: &Path, rows: &[MarketRow]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let tmp = temp_path(path)?;
    if let Err(why) = write_rows(&tmp, rows).and_then(|_| {
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))
    }) {
        let _ = fs::remove_file(&tmp);
        return Err(why);
    }

    Ok(())
}

fn write_rows(path: &Path, rows: &[MarketRow]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for row in rows {
        writer.write_record(row.to_record())?;
    }

    writer.flush()?;
    Ok(())
}

/// 例︰db/market.csv => db/market.csv.tmp
fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Storage path {} has no file name", path.display()))?;
    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");

    Ok(path.with_file_name(tmp_name))
}
