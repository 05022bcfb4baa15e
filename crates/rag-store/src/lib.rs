//! rag-store - SQLite vector collections
//!
//! This crate stores embedded FAQ entries as points in a SQLite table and
//! answers cosine-similarity nearest-neighbour queries over them.

mod schema;
mod sqlite;

pub use sqlite::{cosine_similarity, SqliteVectorStore};
