//! Core domain types for the RAG system.

use serde::{Deserialize, Serialize};

/// One question/answer pair of the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Stable identifier, unique within a dataset.
    pub id: u64,

    /// The question.
    pub question: String,

    /// The answer.
    pub answer: String,
}

impl FaqEntry {
    /// Create a new entry.
    pub fn new(id: u64, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id,
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Text that gets embedded for this entry.
    pub fn document_text(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}

/// A vector with its payload, as stored in a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Point id (the FAQ entry id).
    pub id: u64,

    /// Embedding vector.
    pub vector: Vec<f32>,

    /// Entry stored alongside the vector.
    pub payload: FaqEntry,
}

impl Point {
    /// Create a new point.
    pub fn new(id: u64, vector: Vec<f32>, payload: FaqEntry) -> Self {
        Self {
            id,
            vector,
            payload,
        }
    }
}

/// A scored match returned by a vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Point id.
    pub id: u64,

    /// Cosine similarity (higher is more similar).
    pub score: f32,

    /// Entry stored with the point.
    pub payload: FaqEntry,
}

/// One organic result from a web search provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl std::fmt::Display for WebResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} — {}\n{}", self.title, self.url, self.snippet)
    }
}
