use std::{
    fmt::Write as _,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use chrono::{format::DelayedFormat, DateTime, Local};
use crossbeam_channel::{bounded, unbounded, Sender};
use log::Level;
use once_cell::sync::Lazy;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("market_updater"));

/// 等待背景線程寫完日誌的上限
const FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

pub struct Logger {
    writer: Sender<Command>,
}

enum Command {
    Write(LogMessage),
    Flush(Sender<()>),
}

struct LogMessage {
    level: Level,
    msg: String,
    created_at: DateTime<Local>,
}

impl LogMessage {
    fn new(level: Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

impl Logger {
    fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded::<Command>();
        let file = Self::get_log_path(log_name).and_then(|path| Self::open(&path));

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || {
            let mut writer = file.map(BufWriter::new);
            let mut line = String::with_capacity(2048);

            for received in &rx {
                match received {
                    Command::Write(msg) => {
                        let start = line.len();
                        if writeln!(
                            &mut line,
                            "{} {} {}",
                            msg.created_at.format("%F %X%.6f"),
                            msg.level,
                            msg.msg
                        )
                        .is_err()
                        {
                            continue;
                        }
                        print!("{}", &line[start..]);

                        if rx.is_empty() || line.len() >= 2048 {
                            Self::write_out(&mut writer, &mut line);
                        }
                    }
                    Command::Flush(done) => {
                        Self::write_out(&mut writer, &mut line);
                        let _ = done.send(());
                    }
                }
            }
        });

        Logger { writer: tx }
    }

    fn write_out(writer: &mut Option<BufWriter<File>>, line: &mut String) {
        if let Some(w) = writer.as_mut() {
            if let Err(why) = w.write_all(line.as_bytes()) {
                error_console(format!("Failed to write to log file. because:{:#?}", why));
            }

            if let Err(why) = w.flush() {
                error_console(format!("Failed to flush log file. because:{:#?}", why));
            }
        }

        line.clear();
    }

    fn open(path: &Path) -> Option<File> {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(why) => {
                error_console(format!(
                    "Failed to open log file {}: {}",
                    path.display(),
                    why
                ));
                None
            }
        }
    }

    fn send(&self, level: Level, msg: String) {
        if let Err(why) = self.writer.send(Command::Write(LogMessage::new(level, msg))) {
            error_console(why.to_string());
        }
    }

    fn flush(&self) {
        let (done_tx, done_rx) = bounded::<()>(1);
        if self.writer.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv_timeout(FLUSH_TIMEOUT);
        }
    }

    fn get_log_path(name: &str) -> Option<PathBuf> {
        let path = Path::new("log");

        if !path.exists() {
            fs::create_dir_all(path).ok()?;
        }

        let mut log_path = PathBuf::from(path);
        log_path.push(format!("{}_{}.log", Local::now().format("%Y-%m-%d"), name));

        Some(log_path)
    }
}

pub fn info_file_async(log: String) {
    LOGGER.send(Level::Info, log);
}

pub fn warn_file_async(log: String) {
    LOGGER.send(Level::Warn, log);
}

pub fn error_file_async(log: String) {
    LOGGER.send(Level::Error, log);
}

pub fn debug_file_async(log: String) {
    LOGGER.send(Level::Debug, log);
}

/// 程式結束前呼叫，確保排隊中的日誌都已寫入檔案
pub fn flush() {
    LOGGER.flush();
}

pub fn error_console(log: String) {
    eprintln!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_and_flush() {
        info_file_async("test_log_and_flush info".to_string());
        warn_file_async("test_log_and_flush warn".to_string());
        error_file_async("test_log_and_flush error".to_string());
        debug_file_async("test_log_and_flush debug".to_string());
        flush();
    }

    #[test]
    fn test_log_message_level() {
        let msg = LogMessage::new(Level::Warn, "cached".to_string());
        assert_eq!(msg.level.to_string(), "WARN");
        assert_eq!(msg.msg, "cached");
    }
}
