//! HTTP Request Logger
//!
//! Appends catalogue HTTP exchanges to `http_requests.log` next to the data
//! file. Set `CAMWALL_HTTP_LOG=1` or `CAMWALL_HTTP_LOG=true` to enable.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use tracing::warn;

/// Environment variable to control HTTP logging
const ENV_HTTP_LOG: &str = "CAMWALL_HTTP_LOG";

/// Log file name
const LOG_FILE_NAME: &str = "http_requests.log";

/// Maximum body size to log (10KB)
const MAX_BODY_SIZE: usize = 10000;

/// Headers masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "set-cookie", "cookie"];

static LOG_MUTEX: Mutex<()> = Mutex::new(());

/// Check if HTTP logging is enabled
pub fn is_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var(ENV_HTTP_LOG)
            .map(|v| parse_flag(&v))
            .unwrap_or(false)
    })
}

fn parse_flag(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "1" || v == "true" || v == "yes" || v == "on"
}

/// HTTP request log entry
pub struct HttpRequestLog {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// HTTP response log entry
pub struct HttpResponseLog {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Build a request entry, or None when logging is disabled
pub fn request_log_if_enabled(
    method: &str,
    url: &str,
    headers: &[(&str, &str)],
) -> Option<HttpRequestLog> {
    if !is_enabled() {
        return None;
    }

    Some(HttpRequestLog {
        method: method.to_string(),
        url: url.to_string(),
        headers: headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    })
}

/// Extract headers from a reqwest Response
pub fn extract_response_headers(response: &reqwest::Response) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}

/// Log an HTTP request and its response or error
pub fn log_exchange(
    log_dir: Option<&Path>,
    request: &HttpRequestLog,
    response: Option<&HttpResponseLog>,
    duration_ms: u64,
    error: Option<&str>,
) {
    if !is_enabled() {
        return;
    }

    let log_path = log_file_path(log_dir);
    let content = format_exchange(request, response, duration_ms, error);
    if let Err(e) = write_log(&log_path, &content) {
        warn!("Failed to write HTTP log: {}", e);
    }
}

fn log_file_path(log_dir: Option<&Path>) -> PathBuf {
    let dir = log_dir
        .filter(|d| !d.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create log directory {:?}: {}", dir, e);
        }
    }
    dir.join(LOG_FILE_NAME)
}

fn format_exchange(
    request: &HttpRequestLog,
    response: Option<&HttpResponseLog>,
    duration_ms: u64,
    error: Option<&str>,
) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let separator = "=".repeat(80);

    let mut out = format!(
        "\n{}\n[{}] {} {}\n{}\n",
        separator, timestamp, request.method, request.url, separator
    );

    out.push_str("\n--- Request Headers ---\n");
    for (name, value) in &request.headers {
        out.push_str(&format!("{}: {}\n", name, mask_sensitive_header(name, value)));
    }

    if let Some(resp) = response {
        out.push_str(&format!("\n--- Response ({}ms) ---\n", duration_ms));
        out.push_str(&format!("Status: {}\n", resp.status));
        for (name, value) in &resp.headers {
            out.push_str(&format!("{}: {}\n", name, mask_sensitive_header(name, value)));
        }
        if let Some(body) = &resp.body {
            out.push_str("\n--- Response Body ---\n");
            out.push_str(&format_body(body));
            out.push('\n');
        }
    }

    if let Some(err) = error {
        out.push_str(&format!("\n--- Error ({}ms) ---\n{}\n", duration_ms, err));
    }

    out.push_str(&format!("\n{}\n", separator));
    out
}

fn write_log(path: &Path, content: &str) -> std::io::Result<()> {
    let _guard = LOG_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())
}

fn mask_sensitive_header(name: &str, value: &str) -> String {
    let name_lower = name.to_lowercase();
    if SENSITIVE_HEADERS.iter().any(|h| name_lower == *h) {
        "****".to_string()
    } else {
        value.to_string()
    }
}

/// Pretty-print JSON bodies, truncate everything at a char boundary
fn format_body(body: &str) -> String {
    let pretty = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| body.to_string());
    truncate_utf8_safe(&pretty, MAX_BODY_SIZE)
}

fn truncate_utf8_safe(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...\n[truncated, total {} bytes]", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_truncate_utf8_safe_unicode() {
        let s = "Камера номер один";
        let truncated = truncate_utf8_safe(s, 5);
        assert!(truncated.starts_with("Ка"));
        assert!(truncated.contains("[truncated"));
    }

    #[test]
    fn test_mask_cookie() {
        assert_eq!(mask_sensitive_header("Set-Cookie", "session=abc"), "****");
        assert_eq!(
            mask_sensitive_header("Content-Type", "application/json"),
            "application/json"
        );
    }

    #[test]
    fn test_format_exchange_includes_status_and_error() {
        let request = HttpRequestLog {
            method: "GET".to_string(),
            url: "https://example.com/info".to_string(),
            headers: vec![("Cookie".to_string(), "secret".to_string())],
        };
        let response = HttpResponseLog {
            status: 502,
            headers: vec![],
            body: Some(r#"{"server":""}"#.to_string()),
        };
        let text = format_exchange(&request, Some(&response), 12, Some("empty server"));
        assert!(text.contains("GET https://example.com/info"));
        assert!(text.contains("Status: 502"));
        assert!(text.contains("Cookie: ****"));
        assert!(text.contains("empty server"));
        assert!(!text.contains("secret"));
    }
}
