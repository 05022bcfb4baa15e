//! SQLite-backed vector collection.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use rag_core::{FaqEntry, Point, RagError, Result, SearchHit, VectorStore, VectorStoreConfig};

use crate::schema::{is_valid_collection_name, points_table, recreate_points_sql, COSINE_FN};

/// Vector store keeping one collection in a SQLite database.
///
/// Vectors are stored as little-endian `f32` blobs and ranked with a
/// `cosine_similarity` scalar function registered on the connection.
/// The connection sits behind a blocking Mutex, so concurrent searches
/// are serialized.
pub struct SqliteVectorStore {
    /// Connection wrapped in blocking Mutex.
    conn: Mutex<Connection>,

    /// Collection name.
    collection: String,

    /// Table holding the collection's points.
    table: String,

    /// Vector length accepted by the collection.
    dimension: usize,
}

impl SqliteVectorStore {
    /// Open or create a database file and reset the collection in it.
    pub fn open(path: impl AsRef<Path>, collection: &str, dimension: usize) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| RagError::database(format!("Failed to open database: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|e| RagError::database(format!("Failed to enable WAL: {}", e)))?;

        Self::init(conn, collection, dimension, path)
    }

    /// Open an in-memory database scoped to this process.
    pub fn open_memory(collection: &str, dimension: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RagError::database(format!("Failed to open in-memory database: {}", e)))?;

        Self::init(conn, collection, dimension, Path::new(":memory:"))
    }

    /// Open the store described by the configuration.
    pub fn from_config(config: &VectorStoreConfig, dimension: usize) -> Result<Self> {
        match &config.path {
            Some(path) => Self::open(path, &config.collection, dimension),
            None => Self::open_memory(&config.collection, dimension),
        }
    }

    /// Initialize the store with a connection, recreating the collection.
    fn init(conn: Connection, collection: &str, dimension: usize, path: &Path) -> Result<Self> {
        if !is_valid_collection_name(collection) {
            return Err(RagError::invalid_argument(format!(
                "Collection name must match [A-Za-z0-9_]+: {:?}",
                collection
            )));
        }
        if dimension == 0 {
            return Err(RagError::invalid_argument("Vector dimension must be positive"));
        }

        Self::configure_connection(&conn)?;
        Self::register_functions(&conn)?;

        // Reset on start: any previous collection of this name is dropped.
        conn.execute_batch(&recreate_points_sql(collection))
            .map_err(|e| RagError::database(format!("Failed to create collection: {}", e)))?;

        info!(
            "Collection '{}' (dim={}, distance=cosine) ready at {:?}",
            collection, dimension, path
        );

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
            table: points_table(collection),
            dimension,
        })
    }

    /// Configure SQLite connection.
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -16000;
            PRAGMA busy_timeout = 30000;
            PRAGMA temp_store = MEMORY;
            "#,
        )
        .map_err(|e| RagError::database(format!("Failed to configure connection: {}", e)))?;

        Ok(())
    }

    /// Register the cosine similarity SQL function.
    fn register_functions(conn: &Connection) -> Result<()> {
        conn.create_scalar_function(
            COSINE_FN,
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let a: Vec<u8> = ctx.get(0)?;
                let b: Vec<u8> = ctx.get(1)?;
                Ok(cosine_similarity(&bytes_to_vec(&a), &bytes_to_vec(&b)) as f64)
            },
        )
        .map_err(|e| RagError::database(format!("Failed to register {}: {}", COSINE_FN, e)))
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self.conn.lock().map_err(|e| RagError::database(e.to_string()))?;
        f(&conn)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, points: &[Point]) -> Result<()> {
        for point in points {
            self.check_dimension(&point.vector)?;
        }

        let rows = points
            .iter()
            .map(|p| -> Result<(i64, Vec<u8>, String)> {
                Ok((p.id as i64, vec_to_bytes(&p.vector), serde_json::to_string(&p.payload)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let sql = format!(
            r#"
            INSERT INTO "{}" (id, vector, payload) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET vector = excluded.vector, payload = excluded.payload
            "#,
            self.table
        );

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            {
                let mut stmt = tx
                    .prepare(&sql)
                    .map_err(|e| RagError::database(e.to_string()))?;

                for (id, vector, payload) in &rows {
                    stmt.execute(params![id, vector, payload])
                        .map_err(|e| RagError::database(format!("Failed to upsert point {}: {}", id, e)))?;
                }
            }

            tx.commit()
                .map_err(|e| RagError::database(e.to_string()))?;

            debug!("Upserted {} points into {}", rows.len(), self.collection);
            Ok(())
        })
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        self.check_dimension(vector)?;

        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_bytes = vec_to_bytes(vector);
        let sql = format!(
            r#"
            SELECT id, payload, {}(vector, ?1) AS score
            FROM "{}"
            ORDER BY score DESC
            LIMIT ?2
            "#,
            COSINE_FN, self.table
        );

        let rows: Vec<(i64, String, f64)> = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| RagError::database(e.to_string()))?;

            let rows = stmt
                .query_map(params![query_bytes, limit as i64], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })
                .map_err(|e| RagError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| RagError::database(e.to_string()))?;

            Ok(rows)
        })?;

        debug!("Vector search returned {} hits", rows.len());

        rows.into_iter()
            .map(|(id, payload, score)| -> Result<SearchHit> {
                let payload: FaqEntry = serde_json::from_str(&payload)?;
                Ok(SearchHit {
                    id: id as u64,
                    score: score as f32,
                    payload,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<usize> {
        let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, self.table);
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row(&sql, [], |row| row.get(0))
                .map_err(|e| RagError::database(e.to_string()))?;
            Ok(count as usize)
        })
    }
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
