//! rag-core - Core types and traits for the RAG system
//!
//! This crate provides the foundational types, traits, and error handling
//! shared by the embedder, vector store, retriever, web search and MCP
//! server crates.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{RagError, Result};
pub use traits::*;
pub use types::*;
