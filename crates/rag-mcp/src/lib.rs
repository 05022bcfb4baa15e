//! rag-mcp - MCP server implementation
//!
//! This crate provides an MCP (Model Context Protocol) server that exposes
//! FAQ retrieval and web search as tools for AI assistants.
//!
//! # Tools
//!
//! - `machine_learning_faq_retrieval_tool` - Search the seeded ML FAQ
//! - `web_search_tool` - Organic web results from the configured provider
//!
//! # Transports
//!
//! Streamable HTTP under `/mcp` (default) or stdio.

mod context;
mod registry;
mod server;
mod tools;

pub use context::AppContext;
pub use registry::{result_texts, JsonObject, Tool, ToolDescriptor, ToolRegistry};
pub use server::{run_http, serve_http, serve_stdio, RagMcpServer, MCP_PATH};
pub use tools::{
    build_registry, FaqParams, FaqRetrievalTool, WebSearchParams, WebSearchTool, FAQ_TOOL,
    WEB_SEARCH_TOOL,
};
