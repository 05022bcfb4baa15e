//! Serper.dev provider.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use rag_core::{RagError, Result, WebResult, WebSearchPort};

use crate::serp::{parse_organic, FieldMap};
use crate::{require_vars, EnvLookup};

pub const API_KEY_VAR: &str = "SERPER_API_KEY";

const FIELDS: FieldMap = FieldMap {
    title: &["title"],
    url: &["link"],
    snippet: &["snippet"],
};

/// Google results from the Serper.dev JSON API.
pub struct SerperSearch {
    endpoint: String,
    timeout: Duration,
    env: EnvLookup,
}

impl SerperSearch {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, env: EnvLookup) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            env,
        }
    }
}

#[async_trait]
impl WebSearchPort for SerperSearch {
    fn provider(&self) -> &'static str {
        "serper"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<WebResult>> {
        let api_key = require_vars(&self.env, &[API_KEY_VAR])?
            .pop()
            .unwrap_or_default();
        if num_results == 0 {
            return Ok(Vec::new());
        }

        debug!("Serper search: {:?}", query);

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RagError::upstream(format!("HTTP client error: {}", e)))?;

        let response = client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": num_results }))
            .send()
            .await
            .map_err(|e| RagError::upstream(format!("Serper request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagError::upstream(format!("Serper returned HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RagError::upstream(format!("Serper returned invalid JSON: {}", e)))?;

        let results = parse_organic(&body, &FIELDS, num_results);
        info!("Serper returned {} results for {:?}", results.len(), query);
        Ok(results)
    }
}
