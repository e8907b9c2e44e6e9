//! Tool: google_search — Run a Google web search and return the results page.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use agentic_commander::format_elapsed;

use crate::logging;
use crate::types::{McpError, McpResult, ToolAnnotations, ToolCallResult, ToolDefinition};

use super::registry::ToolHandler;
use super::web_fetch::{read_limited, request_timeout, send_failure};

pub const SEARCH_ENDPOINT: &str = "https://www.google.com/search";

const MAX_RESULTS_PAGE: usize = 2 * 1024 * 1024;
const SAFE_SEARCH_LEVELS: [&str; 3] = ["off", "moderate", "strict"];

// Plain bot agents get a consent or captcha page instead of results.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    num_results: Option<i64>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    safe_search: Option<String>,
    #[serde(default)]
    timeout: Option<String>,
}

#[derive(Debug)]
struct SearchRequest {
    query: String,
    num_results: i64,
    language: String,
    safe_search: String,
    timeout: Duration,
}

impl SearchParams {
    fn into_request(self) -> McpResult<SearchRequest> {
        let query = self
            .query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| McpError::InvalidParams("query is required".to_string()))?;

        let safe_search = self
            .safe_search
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "moderate".to_string());
        if !SAFE_SEARCH_LEVELS.contains(&safe_search.as_str()) {
            return Err(McpError::InvalidParams(format!(
                "safe_search must be one of off, moderate, strict: {safe_search}"
            )));
        }

        Ok(SearchRequest {
            query,
            num_results: self.num_results.unwrap_or(10).clamp(10, 100),
            language: self
                .language
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "en".to_string()),
            safe_search,
            timeout: request_timeout(self.timeout.as_deref())?,
        })
    }
}

impl SearchRequest {
    fn url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &self.query)
            .append_pair("num", &self.num_results.to_string())
            .append_pair("hl", &self.language)
            .append_pair("safe", &self.safe_search);
        url
    }
}

#[derive(Debug, Serialize)]
struct SearchReport {
    query: String,
    status_code: u16,
    content_length: usize,
    duration: String,
    search_url: String,
    body: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "google_search".to_string(),
        description: Some(
            "Run a Google search and return the raw results page HTML for the caller to parse."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms, e.g. 'site:github.com tokio'"
                },
                "num_results": {
                    "type": "integer",
                    "minimum": 10,
                    "maximum": 100,
                    "default": 10
                },
                "language": {
                    "type": "string",
                    "description": "Result language code such as 'en' or 'de'",
                    "default": "en"
                },
                "safe_search": {
                    "type": "string",
                    "enum": SAFE_SEARCH_LEVELS,
                    "default": "moderate"
                },
                "timeout": {
                    "type": "string",
                    "description": "Deadline such as '30s'; at most 5m",
                    "default": "30s"
                }
            },
            "required": ["query"]
        }),
        annotations: Some(ToolAnnotations {
            open_world_hint: Some(true),
            ..ToolAnnotations::read_only("Google Search")
        }),
    }
}

pub struct GoogleSearch {
    client: Client,
    endpoint: Url,
}

impl GoogleSearch {
    pub fn new() -> McpResult<Self> {
        Self::with_endpoint(SEARCH_ENDPOINT)
    }

    /// Search against another endpoint speaking the same query parameters.
    pub fn with_endpoint(endpoint: &str) -> McpResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| McpError::Config(format!("invalid search endpoint {endpoint}: {e}")))?;
        let client = Client::builder()
            .build()
            .map_err(|e| McpError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ToolHandler for GoogleSearch {
    async fn call(&self, args: Value) -> McpResult<ToolCallResult> {
        let params: SearchParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
        let request = params.into_request()?;
        let url = request.url(&self.endpoint);

        let start = Instant::now();
        let sent = self
            .client
            .get(url.clone())
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, format!("{},en;q=0.5", request.language))
            .timeout(request.timeout)
            .send()
            .await;
        let mut response = match sent {
            Ok(response) => response,
            Err(e) => {
                return Ok(ToolCallResult::error(send_failure(
                    "Search request",
                    &e,
                    request.timeout,
                )))
            }
        };

        let status = response.status();
        let (body, _) = match read_limited(&mut response, MAX_RESULTS_PAGE).await {
            Ok(read) => read,
            Err(e) => {
                return Ok(ToolCallResult::error(format!(
                    "Failed to read response: {e}"
                )))
            }
        };
        let elapsed = start.elapsed();
        logging::web_request(
            "google_search",
            "GET",
            url.as_str(),
            status.as_u16(),
            body.len(),
            elapsed,
        );

        let report = SearchReport {
            query: request.query,
            status_code: status.as_u16(),
            content_length: body.len(),
            duration: format_elapsed(elapsed),
            search_url: url.to_string(),
            body: String::from_utf8_lossy(&body).into_owned(),
        };
        Ok(if status.is_success() {
            ToolCallResult::json(&report)
        } else {
            ToolCallResult::json_error(&report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolContent;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params(args: Value) -> McpResult<SearchRequest> {
        serde_json::from_value::<SearchParams>(args)
            .unwrap()
            .into_request()
    }

    fn report(result: &ToolCallResult) -> Value {
        let ToolContent::Text { text } = &result.content[0];
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_params_defaults_and_clamping() {
        let request = params(json!({ "query": "tokio" })).unwrap();
        assert_eq!(request.num_results, 10);
        assert_eq!(request.language, "en");
        assert_eq!(request.safe_search, "moderate");

        assert_eq!(params(json!({ "query": "x", "num_results": 3 })).unwrap().num_results, 10);
        assert_eq!(params(json!({ "query": "x", "num_results": 500 })).unwrap().num_results, 100);
    }

    #[test]
    fn test_params_validation() {
        let err = params(json!({ "query": "  " })).unwrap_err();
        assert!(err.to_string().contains("query is required"));
        let err = params(json!({ "query": "x", "safe_search": "extreme" })).unwrap_err();
        assert!(err.to_string().contains("safe_search"));
    }

    #[test]
    fn test_search_url_encodes_query() {
        let request = params(json!({ "query": "rust & mcp", "language": "de" })).unwrap();
        let url = request.url(&Url::parse(SEARCH_ENDPOINT).unwrap());
        assert_eq!(
            url.as_str(),
            "https://www.google.com/search?q=rust+%26+mcp&num=10&hl=de&safe=moderate"
        );
    }

    #[tokio::test]
    async fn test_search_returns_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust mcp"))
            .and(query_param("num", "100"))
            .and(query_param("hl", "de"))
            .and(query_param("safe", "strict"))
            .and(header_exists("accept-language"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>results</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let tool = GoogleSearch::with_endpoint(&format!("{}/search", server.uri())).unwrap();
        let result = tool
            .call(json!({
                "query": "rust mcp",
                "num_results": 250,
                "language": "de",
                "safe_search": "strict"
            }))
            .await
            .unwrap();
        assert!(!result.is_error());

        let report = report(&result);
        assert_eq!(report["query"], "rust mcp");
        assert_eq!(report["status_code"], 200);
        assert_eq!(report["body"], "<html>results</html>");
        assert!(report["search_url"].as_str().unwrap().contains("q=rust+mcp"));
    }

    #[tokio::test]
    async fn test_rate_limited_search_is_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let tool = GoogleSearch::with_endpoint(&server.uri()).unwrap();
        let result = tool.call(json!({ "query": "anything" })).await.unwrap();
        assert!(result.is_error());
        assert_eq!(report(&result)["status_code"], 429);
    }
}
