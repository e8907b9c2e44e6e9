//! Tool: web_fetch — Fetch a URL over HTTP(S) and return the response.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use agentic_commander::{format_duration, format_elapsed, parse_duration};

use crate::logging;
use crate::types::{McpError, McpResult, ToolAnnotations, ToolCallResult, ToolDefinition};

use super::registry::ToolHandler;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_FETCH_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MAX_SIZE: usize = 1024 * 1024;
const MIN_MAX_SIZE: usize = 1024;
const MAX_MAX_SIZE: usize = 10 * 1024 * 1024;

const METHODS: [&str; 6] = ["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS"];

/// Request deadline for the web tools: absent or zero means the default,
/// anything longer than the cap is clamped.
pub(super) fn request_timeout(raw: Option<&str>) -> McpResult<Duration> {
    let Some(raw) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(DEFAULT_FETCH_TIMEOUT);
    };
    let timeout = parse_duration(raw)
        .map_err(|e| McpError::InvalidParams(format!("invalid timeout format: {e}")))?;
    Ok(if timeout.is_zero() {
        DEFAULT_FETCH_TIMEOUT
    } else {
        timeout.min(MAX_FETCH_TIMEOUT)
    })
}

/// Read at most `limit` body bytes. The flag is set when the body was cut.
pub(super) async fn read_limited(
    response: &mut Response,
    limit: usize,
) -> reqwest::Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}

pub(super) fn send_failure(context: &str, error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        format!("{context} timed out after {}", format_duration(timeout))
    } else {
        format!("{context} failed: {error}")
    }
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    timeout: Option<String>,
    #[serde(default)]
    max_size: Option<u64>,
}

#[derive(Debug)]
struct FetchRequest {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
    timeout: Duration,
    max_size: usize,
}

impl FetchParams {
    fn into_request(self) -> McpResult<FetchRequest> {
        let raw_url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| McpError::InvalidParams("url is required".to_string()))?;
        let url = Url::parse(raw_url.trim())
            .map_err(|e| McpError::InvalidParams(format!("invalid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(McpError::InvalidParams(
                "URL must use http:// or https://".to_string(),
            ));
        }

        let method = match self.method.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            None => Method::GET,
            Some(raw) => {
                let upper = raw.to_ascii_uppercase();
                if !METHODS.contains(&upper.as_str()) {
                    return Err(McpError::InvalidParams(format!(
                        "unsupported method: {raw}"
                    )));
                }
                Method::from_bytes(upper.as_bytes())
                    .map_err(|e| McpError::InvalidParams(format!("unsupported method: {e}")))?
            }
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| McpError::InvalidParams(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| McpError::InvalidParams(format!("invalid value for header {name}")))?;
            headers.insert(header, value);
        }

        let max_size = self.max_size.map_or(DEFAULT_MAX_SIZE, |size| {
            usize::try_from(size)
                .unwrap_or(MAX_MAX_SIZE)
                .clamp(MIN_MAX_SIZE, MAX_MAX_SIZE)
        });

        Ok(FetchRequest {
            url,
            method,
            headers,
            body: self.body.filter(|b| !b.is_empty()),
            timeout: request_timeout(self.timeout.as_deref())?,
            max_size,
        })
    }
}

#[derive(Debug, Serialize)]
struct FetchReport {
    status_code: u16,
    status: String,
    content_length: usize,
    content_type: String,
    duration: String,
    truncated: bool,
    headers: BTreeMap<String, String>,
    body: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "web_fetch".to_string(),
        description: Some(
            "Fetch a URL over HTTP or HTTPS and return the status, headers and body. \
             The body is cut at max_size bytes."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http:// or https:// URL"
                },
                "method": {
                    "type": "string",
                    "enum": METHODS,
                    "default": "GET"
                },
                "headers": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Request headers as name/value pairs"
                },
                "body": {
                    "type": "string",
                    "description": "Request body, typically for POST or PUT"
                },
                "timeout": {
                    "type": "string",
                    "description": "Deadline such as '30s' or '2m'; at most 5m",
                    "default": "30s"
                },
                "max_size": {
                    "type": "integer",
                    "description": "Maximum body bytes to return",
                    "default": DEFAULT_MAX_SIZE,
                    "minimum": MIN_MAX_SIZE,
                    "maximum": MAX_MAX_SIZE
                }
            },
            "required": ["url"]
        }),
        annotations: Some(ToolAnnotations {
            title: Some("Web Fetch".to_string()),
            read_only_hint: Some(false),
            idempotent_hint: Some(false),
            open_world_hint: Some(true),
            ..Default::default()
        }),
    }
}

pub struct WebFetch {
    client: Client,
}

impl WebFetch {
    pub fn new() -> McpResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("agentic-commander/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| McpError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ToolHandler for WebFetch {
    async fn call(&self, args: Value) -> McpResult<ToolCallResult> {
        let params: FetchParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
        let request = params.into_request()?;

        let start = Instant::now();
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let mut response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(ToolCallResult::error(send_failure(
                    "Request",
                    &e,
                    request.timeout,
                )))
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }

        let (body, truncated) = match read_limited(&mut response, request.max_size).await {
            Ok(read) => read,
            Err(e) => {
                return Ok(ToolCallResult::error(format!(
                    "Failed to read response: {e}"
                )))
            }
        };
        let elapsed = start.elapsed();
        logging::web_request(
            "web_fetch",
            request.method.as_str(),
            request.url.as_str(),
            status.as_u16(),
            body.len(),
            elapsed,
        );

        let report = FetchReport {
            status_code: status.as_u16(),
            status: format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string(),
            content_length: body.len(),
            content_type,
            duration: format_elapsed(elapsed),
            truncated,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        };
        Ok(if status.is_success() {
            ToolCallResult::json(&report)
        } else {
            ToolCallResult::json_error(&report)
        })
    }
}
