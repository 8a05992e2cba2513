use pgvector::Vector;
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Row};

use docvec_core::{EmbeddedFragment, FragmentKind};

use crate::error::StoreError;

// ── Types ──────────────────────────────────────────

/// A single nearest-neighbor match, in ascending-distance order.
#[derive(Debug, Clone)]
pub struct FragmentHit {
    pub text: String,
    pub source_file: String,
    pub category: String,
    pub seq_index: i32,
    pub kind: FragmentKind,
    /// Cosine distance to the query vector, in [0, 2] for normalized
    /// embeddings; the caller derives similarity as `1 - distance`.
    pub distance: f64,
}

/// Fragment count for one category.
#[derive(Debug, Clone)]
pub struct CategoryCount {
    pub category: String,
    pub total: i64,
}

/// Fragment count for one (category, kind) pair.
#[derive(Debug, Clone)]
pub struct StatRow {
    pub category: String,
    pub kind: FragmentKind,
    pub total: i64,
}

// ── Store ──────────────────────────────────────────

/// Handle to the fragment index. One connection, opened per request on the
/// query path and dropped when the request finishes.
pub struct Store {
    conn: PgConnection,
}

impl Store {
    /// Open a connection to the index.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let conn = PgConnection::connect(url).await?;
        Ok(Self { conn })
    }

    /// Drop and recreate both tables, then insert every fragment inside one
    /// transaction. The vector column dimension is taken from the first
    /// fragment -- all embeddings in a run share it.
    pub async fn rebuild(&mut self, fragments: &[EmbeddedFragment]) -> Result<(), StoreError> {
        let dim = match fragments.first() {
            Some(f) => f.embedding.len(),
            None => return Err(StoreError::EmptyRebuild),
        };
        tracing::info!(count = fragments.len(), dim, "rebuilding index");

        let create_vectors = format!(
            "CREATE TABLE fragment_vectors (
                id        BIGINT PRIMARY KEY REFERENCES fragments(id),
                embedding VECTOR({dim}) NOT NULL
            )"
        );

        let mut tx = self.conn.begin().await?;

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DROP TABLE IF EXISTS fragment_vectors")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DROP TABLE IF EXISTS fragments")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "CREATE TABLE fragments (
                id          BIGINT PRIMARY KEY,
                text        TEXT NOT NULL,
                source_file TEXT NOT NULL,
                category    TEXT NOT NULL,
                seq_index   INTEGER NOT NULL,
                kind        TEXT NOT NULL
            )",
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query(&create_vectors).execute(&mut *tx).await?;

        for (i, item) in fragments.iter().enumerate() {
            let id = (i + 1) as i64;
            let f = &item.fragment;
            sqlx::query(
                "INSERT INTO fragments (id, text, source_file, category, seq_index, kind) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(id)
            .bind(&f.text)
            .bind(&f.source_file)
            .bind(&f.category)
            .bind(f.seq_index as i32)
            .bind(f.kind.as_str())
            .execute(&mut *tx)
            .await?;

            let embedding = Vector::from(item.embedding.clone());
            sqlx::query("INSERT INTO fragment_vectors (id, embedding) VALUES ($1, $2)")
                .bind(id)
                .bind(&embedding)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(count = fragments.len(), "index rebuilt");
        Ok(())
    }

    /// Return the `k` globally-nearest fragments to `query`, ascending by
    /// cosine distance. No filtering happens here -- the index only supports
    /// a flat top-k query with a numeric cap.
    pub async fn nearest(
        &mut self,
        query: &[f32],
        k: i64,
    ) -> Result<Vec<FragmentHit>, StoreError> {
        let embedding = Vector::from(query.to_vec());
        let rows = sqlx::query(
            "SELECT f.text, f.source_file, f.category, f.seq_index, f.kind, \
             (v.embedding <=> $1::vector)::float8 AS distance \
             FROM fragment_vectors v \
             JOIN fragments f ON f.id = v.id \
             ORDER BY v.embedding <=> $1::vector \
             LIMIT $2",
        )
        .bind(&embedding)
        .bind(k)
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows
            .iter()
            .map(|row| FragmentHit {
                text: row.get("text"),
                source_file: row.get("source_file"),
                category: row.get("category"),
                seq_index: row.get("seq_index"),
                kind: FragmentKind::from_tag(row.get("kind")),
                distance: row.get("distance"),
            })
            .collect())
    }

    /// Fragment counts per category, alphabetically. Empty when no index
    /// has been built.
    pub async fn category_counts(&mut self) -> Result<Vec<CategoryCount>, StoreError> {
        let rows = sqlx::query(
            "SELECT category, COUNT(*) AS total FROM fragments \
             GROUP BY category ORDER BY category",
        )
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CategoryCount {
                category: row.get("category"),
                total: row.get("total"),
            })
            .collect())
    }

    /// Fragment counts per (category, kind), for the ingest `--stats` view.
    pub async fn stats(&mut self) -> Result<Vec<StatRow>, StoreError> {
        let rows = sqlx::query(
            "SELECT category, kind, COUNT(*) AS total FROM fragments \
             GROUP BY category, kind ORDER BY category, kind",
        )
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows
            .iter()
            .map(|row| StatRow {
                category: row.get("category"),
                kind: FragmentKind::from_tag(row.get("kind")),
                total: row.get("total"),
            })
            .collect())
    }
}
