//! Database schema definitions.

/// Name of the SQL function computing cosine similarity of two vector blobs.
pub const COSINE_FN: &str = "cosine_similarity";

/// Table holding the points of a collection.
///
/// Callers must validate `collection` with [`is_valid_collection_name`]
/// first, since it is spliced into SQL.
pub fn points_table(collection: &str) -> String {
    format!("points_{}", collection)
}

/// Statements that drop and recreate the points table of a collection.
pub fn recreate_points_sql(collection: &str) -> String {
    let table = points_table(collection);
    format!(
        r#"
DROP TABLE IF EXISTS "{table}";
CREATE TABLE "{table}" (
    id INTEGER PRIMARY KEY,
    vector BLOB NOT NULL,
    payload TEXT NOT NULL
);
"#
    )
}

/// Collection names are spliced into table names, so only ASCII letters,
/// digits and underscores are allowed.
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
