//! 通用 HTTP GET 数据获取：请求 URL 并把响应体解析为 JSON

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::utils::error_helpers::extract_error_message;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 获取远端 JSON 数据。网络错误、非 2xx、响应体无法解析都以错误返回
pub trait DataFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Value>> + Send;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(USER_AGENT)
            .build()
            .context("创建 HTTP 客户端失败")?;
        Ok(Self { client })
    }
}

impl DataFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value> {
        if url.is_empty() {
            anyhow::bail!("URL 为空");
        }

        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("请求失败: {}", url))?;

        let status = response.status();
        let body = response.text().await.context("读取响应体失败")?;

        if !status.is_success() {
            anyhow::bail!("{}", describe_http_error(status, &body));
        }

        parse_body(&body)
    }
}

/// 空响应或 "null" 视为 Null，交给调用方按空数据处理
fn parse_body(body: &str) -> Result<Value> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).with_context(|| {
        let preview: String = trimmed.chars().take(200).collect();
        format!("响应不是合法 JSON: {}", preview)
    })
}

/// 非 2xx 响应的错误描述：状态码 + 响应体里能提取到的错误信息
fn describe_http_error(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| extract_error_message(&v));
    match detail {
        Some(msg) => format!("HTTP {}: {}", status, msg),
        None => format!(
            "HTTP {}: {}",
            status,
            status.canonical_reason().unwrap_or("Unknown")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_empty_and_null_bodies_become_null() {
        assert_eq!(parse_body("").unwrap(), Value::Null);
        assert_eq!(parse_body("  \n").unwrap(), Value::Null);
        assert_eq!(parse_body("null").unwrap(), Value::Null);
    }

    #[test]
    fn test_json_body_is_parsed() {
        assert_eq!(
            parse_body(r#"[{"conditionId":"0xabc"}]"#).unwrap(),
            json!([{"conditionId": "0xabc"}])
        );
        assert!(parse_body("<html>bad gateway</html>").is_err());
    }

    #[test]
    fn test_http_error_uses_extracted_message() {
        let msg = describe_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid user address"}"#,
        );
        assert_eq!(msg, "HTTP 400 Bad Request: invalid user address");

        let msg = describe_http_error(StatusCode::BAD_GATEWAY, "<html></html>");
        assert_eq!(msg, "HTTP 502 Bad Gateway: Bad Gateway");
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let fetcher =
            HttpFetcher::new(&Config::new("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0")).unwrap();
        assert!(fetcher.fetch("").await.is_err());
    }
}
