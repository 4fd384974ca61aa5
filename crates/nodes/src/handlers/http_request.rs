//! HTTP-request node: outbound call with interpolation and retry.

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::interpolate::{interpolate_map, interpolate_str, interpolate_value};
use crate::node::Node;
use crate::registry::NodeHandler;
use crate::result::{output_map, NodeResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
struct HttpRequestConfig {
    #[serde(default)]
    method: String,
    url: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<Value>,
    /// Per-request timeout in seconds; overrides the 30 s client default.
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    retry: Option<RetryConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct RetryConfig {
    #[serde(default)]
    max_attempts: u32,
    /// Delay between attempts in seconds.
    #[serde(default)]
    delay: u64,
    /// Status codes that trigger a retry.
    #[serde(default)]
    status_codes: Vec<u16>,
}

pub struct HttpRequestHandler {
    client: reqwest::Client,
}

impl HttpRequestHandler {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn build_request(
        &self,
        config: &HttpRequestConfig,
        ctx: &ExecutionContext,
        method: Method,
        url: &str,
    ) -> Result<RequestBuilder, NodeError> {
        let mut request = self.client.request(method, url);

        if let Some(timeout) = config.timeout {
            request = request.timeout(Duration::from_secs(timeout));
        }

        for (name, value) in interpolate_map(&config.headers, ctx) {
            request = request.header(name, value);
        }

        if let Some(body) = &config.body {
            let interpolated = interpolate_value(body, ctx);
            let bytes = serde_json::to_vec(&interpolated)?;
            request = request.body(bytes);
            // Content-Type defaults to JSON unless the author set one.
            if !config
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case("content-type"))
            {
                request = request.header(CONTENT_TYPE, "application/json");
            }
        }

        Ok(request)
    }

    /// Send the request, retrying on transport errors and on listed status
    /// codes, waiting `delay` seconds between attempts. The last response
    /// (or transport error) wins once attempts are exhausted.
    async fn send_with_retry(
        &self,
        config: &HttpRequestConfig,
        ctx: &ExecutionContext,
        method: Method,
        url: &str,
    ) -> Result<Response, String> {
        let retry = config.retry.as_ref();
        let max_attempts = retry.map_or(1, |r| r.max_attempts.max(1));

        let mut last_error = None;
        let mut last_response = None;

        for attempt in 1..=max_attempts {
            let request = self
                .build_request(config, ctx, method.clone(), url)
                .map_err(|e| e.to_string())?;

            match request.send().await {
                Ok(response) => {
                    let should_retry = retry
                        .map(|r| r.status_codes.contains(&response.status().as_u16()))
                        .unwrap_or(false);
                    if !should_retry {
                        return Ok(response);
                    }
                    last_response = Some(response);
                }
                Err(err) => last_error = Some(err.to_string()),
            }

            if attempt < max_attempts {
                let delay = retry.map_or(0, |r| r.delay);
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }
        }

        match (last_response, last_error) {
            (Some(response), _) => Ok(response),
            (None, Some(err)) => Err(format!("max retry attempts ({max_attempts}) reached: {err}")),
            (None, None) => Err(format!("max retry attempts ({max_attempts}) reached")),
        }
    }
}

impl Default for HttpRequestHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for HttpRequestHandler {
    async fn execute(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
        _default_next: Option<&str>,
    ) -> Result<NodeResult, NodeError> {
        let config: HttpRequestConfig = match serde_json::from_value(node.data.config.clone()) {
            Ok(config) => config,
            Err(err) => {
                return Ok(NodeResult::failed(format!(
                    "failed to parse http_request config: {err}"
                ))
                .with_exit_handle("error"))
            }
        };

        let method = match parse_method(&config.method) {
            Some(method) => method,
            None => {
                return Ok(
                    NodeResult::failed(format!("invalid http method: {}", config.method))
                        .with_exit_handle("error"),
                )
            }
        };

        let url = interpolate_str(&config.url, ctx);

        let response = match self.send_with_retry(&config, ctx, method, &url).await {
            Ok(response) => response,
            Err(err) => {
                return Ok(NodeResult::failed(format!("request failed: {err}"))
                    .with_output(output_map([
                        ("error", json!(err)),
                        ("url", json!(url)),
                    ]))
                    .with_exit_handle("error"))
            }
        };

        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let raw_body = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                return Ok(NodeResult::failed(format!(
                    "failed to read response body: {err}"
                ))
                .with_exit_handle("error"))
            }
        };
        let body: Value = serde_json::from_str(&raw_body).unwrap_or_else(|_| json!(raw_body));

        let output = output_map([
            ("status_code", json!(status.as_u16())),
            ("headers", json!(headers)),
            ("body", body),
            ("raw_body", json!(raw_body)),
        ]);

        if status.is_success() {
            Ok(NodeResult::success(output).with_exit_handle("success"))
        } else {
            Ok(NodeResult::failed(format!("HTTP {}: {}", status.as_u16(), status_text(status)))
                .with_output(output)
                .with_exit_handle("error"))
        }
    }
}

fn parse_method(method: &str) -> Option<Method> {
    if method.is_empty() {
        return Some(Method::GET);
    }
    Method::from_bytes(method.to_uppercase().as_bytes()).ok()
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserialization_defaults() {
        let config: HttpRequestConfig =
            serde_json::from_value(json!({"url": "http://example.com"})).unwrap();

        assert!(config.method.is_empty());
        assert!(config.headers.is_empty());
        assert!(config.body.is_none());
        assert!(config.timeout.is_none());
        assert!(config.retry.is_none());
    }

    #[test]
    fn config_with_retry() {
        let config: HttpRequestConfig = serde_json::from_value(json!({
            "method": "POST",
            "url": "http://example.com",
            "retry": {"max_attempts": 3, "delay": 2, "status_codes": [500, 503]}
        }))
        .unwrap();

        let retry = config.retry.unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.delay, 2);
        assert_eq!(retry.status_codes, vec![500, 503]);
    }

    #[test]
    fn method_parsing() {
        assert_eq!(parse_method("get"), Some(Method::GET));
        assert_eq!(parse_method("POST"), Some(Method::POST));
        assert_eq!(parse_method(""), Some(Method::GET));
        assert_eq!(parse_method("not a method"), None);
    }

    #[tokio::test]
    async fn malformed_config_fails_with_error_handle() {
        let node = Node::new("h", "http_request", json!({"method": "GET"}));
        let mut ctx = ExecutionContext::default();

        let result = HttpRequestHandler::new()
            .execute(&node, &mut ctx, None)
            .await
            .unwrap();

        assert!(result.status.is_failed());
        assert_eq!(result.exit_handle.as_deref(), Some("error"));
    }

    #[tokio::test]
    async fn invalid_method_fails() {
        let node = Node::new(
            "h",
            "http_request",
            json!({"method": "GE T", "url": "http://example.com"}),
        );
        let mut ctx = ExecutionContext::default();

        let result = HttpRequestHandler::new()
            .execute(&node, &mut ctx, None)
            .await
            .unwrap();

        assert!(result.status.is_failed());
        assert!(result.error.unwrap().contains("invalid http method"));
    }

    #[tokio::test]
    async fn transport_failure_routes_error_handle() {
        // Reserved TEST-NET address, nothing listens there.
        let node = Node::new(
            "h",
            "http_request",
            json!({
                "method": "GET",
                "url": "http://192.0.2.1:9/",
                "timeout": 1
            }),
        );
        let mut ctx = ExecutionContext::default();

        let result = HttpRequestHandler::new()
            .execute(&node, &mut ctx, None)
            .await
            .unwrap();

        assert!(result.status.is_failed());
        assert_eq!(result.exit_handle.as_deref(), Some("error"));
        assert_eq!(result.output["url"], json!("http://192.0.2.1:9/"));
    }
}
