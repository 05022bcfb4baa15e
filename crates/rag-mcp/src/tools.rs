//! The FAQ retrieval and web search tools.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use rag_core::{Result, WebSearchPort};
use rag_query::Retriever;
use rag_web::format_results;

use crate::context::AppContext;
use crate::registry::{Tool, ToolRegistry};

pub const FAQ_TOOL: &str = "machine_learning_faq_retrieval_tool";
pub const WEB_SEARCH_TOOL: &str = "web_search_tool";

/// Arguments of the FAQ retrieval tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FaqParams {
    /// Natural-language machine learning question.
    pub query: String,
}

/// Arguments of the web search tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WebSearchParams {
    /// What to search for.
    pub query: String,

    /// How many organic results to return (default 10).
    #[serde(default)]
    pub num_results: Option<u32>,
}

/// Retrieves the closest machine learning FAQ entries.
pub struct FaqRetrievalTool {
    retriever: Arc<Retriever>,
    top_k: usize,
}

impl FaqRetrievalTool {
    pub fn new(retriever: Arc<Retriever>, top_k: usize) -> Self {
        Self { retriever, top_k }
    }
}

#[async_trait]
impl Tool for FaqRetrievalTool {
    type Params = FaqParams;
    type Output = String;

    fn name(&self) -> &'static str {
        FAQ_TOOL
    }

    fn description(&self) -> &'static str {
        "Retrieve the most relevant entries from a machine learning FAQ. \
         Use this for machine learning questions (supervised and unsupervised \
         learning, overfitting, confusion matrices, cross-validation). Returns \
         'Q: ...\\nA: ...\\n(score=...)' blocks separated by blank lines."
    }

    async fn call(&self, params: FaqParams) -> Result<String> {
        info!("FAQ retrieval: {:?}", params.query);
        self.retriever.search(&params.query, self.top_k).await
    }
}

/// Searches the web through the configured provider.
pub struct WebSearchTool {
    port: Arc<dyn WebSearchPort>,
    default_num_results: usize,
}

impl WebSearchTool {
    pub fn new(port: Arc<dyn WebSearchPort>, default_num_results: usize) -> Self {
        Self {
            port,
            default_num_results,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    type Params = WebSearchParams;
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        WEB_SEARCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Search the web for general or non machine learning questions. \
         Returns up to num_results organic results, each formatted as \
         '<title> — <url>\\n<snippet>'."
    }

    async fn call(&self, params: WebSearchParams) -> Result<Vec<String>> {
        let num_results = params
            .num_results
            .map(|n| n as usize)
            .unwrap_or(self.default_num_results);

        info!(
            "Web search via {} (n={}): {:?}",
            self.port.provider(),
            num_results,
            params.query
        );

        let results = self.port.search(&params.query, num_results).await?;
        Ok(format_results(&results))
    }
}

/// Registry holding both tools, wired to the context.
pub fn build_registry(context: &AppContext) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(FaqRetrievalTool::new(
        context.retriever.clone(),
        context.config.retrieval.top_k,
    ))?;
    registry.register(WebSearchTool::new(
        context.web_search.clone(),
        context.config.web_search.default_num_results,
    ))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::{RagError, WebResult};
    use rag_embed::HashingEmbedder;
    use rag_query::ml_faq;
    use rag_store::SqliteVectorStore;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubSearch {
        calls: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl WebSearchPort for StubSearch {
        fn provider(&self) -> &'static str {
            "stub"
        }

        async fn search(&self, query: &str, num_results: usize) -> Result<Vec<WebResult>> {
            self.calls.lock().unwrap().push((query.to_string(), num_results));
            Ok((0..num_results.min(2))
                .map(|i| WebResult {
                    title: format!("Result {}", i),
                    url: format!("https://example.com/{}", i),
                    snippet: "Snippet".to_string(),
                })
                .collect())
        }
    }

    async fn retriever() -> Arc<Retriever> {
        let store = Arc::new(SqliteVectorStore::open_memory("faq", 384).unwrap());
        Arc::new(
            Retriever::new(store, Arc::new(HashingEmbedder::new()), ml_faq())
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_faq_tool_uses_top_k() {
        let tool = FaqRetrievalTool::new(retriever().await, 2);

        let text = tool
            .call(FaqParams {
                query: "What is a confusion matrix?".to_string(),
            })
            .await
            .unwrap();

        assert!(text.starts_with("Q: What is a confusion matrix?"));
        assert_eq!(text.split("\n\n").count(), 2);
    }

    #[tokio::test]
    async fn test_web_tool_default_num_results() {
        let stub = Arc::new(StubSearch {
            calls: Mutex::new(Vec::new()),
        });
        let tool = WebSearchTool::new(stub.clone(), 10);

        let lines = tool
            .call(WebSearchParams {
                query: "rust".to_string(),
                num_results: None,
            })
            .await
            .unwrap();

        assert_eq!(
            lines,
            vec![
                "Result 0 — https://example.com/0\nSnippet".to_string(),
                "Result 1 — https://example.com/1\nSnippet".to_string(),
            ]
        );

        tool.call(WebSearchParams {
            query: "rust".to_string(),
            num_results: Some(3),
        })
        .await
        .unwrap();

        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls[0], ("rust".to_string(), 10));
        assert_eq!(calls[1], ("rust".to_string(), 3));
    }

    #[tokio::test]
    async fn test_registry_validates_before_search() {
        let stub = Arc::new(StubSearch {
            calls: Mutex::new(Vec::new()),
        });
        let mut registry = ToolRegistry::new();
        registry.register(WebSearchTool::new(stub.clone(), 10)).unwrap();

        let args = json!({"query": "rust", "num_results": -3});
        let err = registry
            .call(WEB_SEARCH_TOOL, args.as_object().cloned())
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::InvalidArgument { .. }));
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_faq_tool_rejects_non_string_query() {
        let mut registry = ToolRegistry::new();
        registry
            .register(FaqRetrievalTool::new(retriever().await, 3))
            .unwrap();

        let args = json!({"query": 42});
        let err = registry
            .call(FAQ_TOOL, args.as_object().cloned())
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_web_params_schema_has_optional_count() {
        let mut registry = ToolRegistry::new();
        registry
            .register(WebSearchTool::new(
                Arc::new(StubSearch {
                    calls: Mutex::new(Vec::new()),
                }),
                10,
            ))
            .unwrap();

        let descriptor = registry.descriptors()[0];
        assert_eq!(descriptor.input_schema["required"], json!(["query"]));
        assert!(descriptor.input_schema["properties"]
            .get("num_results")
            .is_some());
    }
}
