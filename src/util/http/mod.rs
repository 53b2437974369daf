use std::time::Instant;

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use reqwest::{Client, Method, Response};

use crate::logging;

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
///
/// No request timeout is configured: a hung provider hangs the pass, and callers that
/// need a bound wrap the whole process in an external timeout.
fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        // reqwest 只帶 rustls-no-provider，需先安裝加密實作；已安裝過時會回傳 Err，可忽略
        let _ = rustls::crypto::ring::default_provider().install_default();

        Client::builder()
            .gzip(true)
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
    })
}

/// Performs exactly one HTTP GET with the given query string and returns the body as text.
///
/// The query is logged by key only so credentials never reach the log file.
///
/// # Errors
///
/// Returns an error when the request cannot be sent or the body cannot be read.
/// A non-2xx status is not an error here; the body is handed back for the caller to classify.
pub async fn get_with_query(url: &str, query: &[(&str, &str)]) -> Result<String> {
    let keys: Vec<&str> = query.iter().map(|(k, _)| *k).collect();
    let visit_log = format!("{}:{} query={}", Method::GET, url, keys.join(","));
    let client = get_client()?;
    let start = Instant::now();

    let response: Response = client
        .request(Method::GET, url)
        .query(query)
        .send()
        .await
        .map_err(|why| {
            // reqwest 的錯誤訊息會帶完整網址（含 apikey），先移除
            let why = why.without_url();
            logging::debug_file_async(format!(
                "{} failed because {:?}. {} ms",
                visit_log,
                why,
                start.elapsed().as_millis()
            ));
            anyhow!("Failed to send request to {}: {}", url, why)
        })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| anyhow!("Error parsing response text: {:?}", e.without_url()))?;

    logging::debug_file_async(format!(
        "{} status={} {} ms",
        visit_log,
        status.as_u16(),
        start.elapsed().as_millis()
    ));

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_with_query_refused() {
        // port 1 on loopback is not listening on any sane test host
        let result = get_with_query("http://127.0.0.1:1/query", &[("function", "GLOBAL_QUOTE")]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_with_query_error_hides_query_values() {
        let why = get_with_query(
            "http://127.0.0.1:1/query",
            &[("symbol", "AAPL"), ("apikey", "SECRETKEY123")],
        )
        .await
        .unwrap_err();

        let msg = format!("{:#} {:?}", why, why);
        assert!(!msg.contains("SECRETKEY123"), "{}", msg);
        assert!(!msg.contains("apikey="), "{}", msg);
    }

    #[test]
    fn test_client_singleton() {
        let a = get_client().unwrap() as *const Client;
        let b = get_client().unwrap() as *const Client;
        assert_eq!(a, b);
    }
}
