//! Fragment store -- the persistent vector index behind docvec.
//!
//! Postgres with the pgvector extension plays the role of the
//! nearest-neighbor engine: a metadata table and a parallel vector table
//! keyed by the same surrogate id, queried with `ORDER BY embedding <=> $1`
//! and a numeric result cap. The store is rebuilt wholesale by the ingest
//! pipeline and opened read-only, one connection per request, by the query
//! service.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{CategoryCount, FragmentHit, StatRow, Store};
