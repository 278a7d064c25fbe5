//! Embedded vector index adapter (component B, SPEC_FULL §4.2).
//!
//! Treats the index as an external key-vector store: `upsert`/`query`/
//! `get_by_ids`/`count`. Raw `(id -> encoded IndexRecord)` pairs live in a
//! pluggable [`backend::IndexBackend`] (redb on disk, an in-memory map for
//! tests); embeddings also live in an in-process [`ann::AnnIndex`] so
//! `query` does not need a backend round trip per candidate.
pub mod ann;
pub mod backend;
pub mod error;
pub mod metadata;

use std::sync::RwLock;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use tracing::warn;
use zstd::{decode_all, encode_all};

pub use ann::{AnnConfig, AnnError};
pub use backend::{BackendConfig, IndexBackend, InMemoryBackend};
pub use error::IndexError;
pub use metadata::{EqField, IndexMetadata, MetadataWhere};

/// Bump whenever the on-disk [`IndexRecord`] layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

/// Quantized embedding: one signed byte per dimension.
pub type QuantizedVec = Vec<i8>;

/// A projection of a capture record into the index (SPEC_FULL §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub id: String,
    pub quantized: Option<QuantizedVec>,
    pub metadata: IndexMetadata,
    pub document: String,
}

const fn default_schema_version() -> u16 {
    INDEX_SCHEMA_VERSION
}

/// A single ranked hit: ascending distance per SPEC_FULL §4.2's contract.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub id: String,
    pub metadata: IndexMetadata,
    pub document: String,
    pub distance: f32,
}

/// Quantize an `f32` embedding to `i8` with a fixed scale; values outside
/// `[-scale, scale]` are clamped rather than rejected.
pub fn quantize(embedding: &[f32], scale: f32) -> QuantizedVec {
    embedding
        .iter()
        .map(|v| ((v / scale) * 127.0).clamp(-127.0, 127.0).round() as i8)
        .collect()
}

/// Inverse of [`quantize`] with the same scale.
pub fn dequantize(quantized: &[i8], scale: f32) -> Vec<f32> {
    quantized.iter().map(|v| (*v as f32 / 127.0) * scale).collect()
}

fn encode_record(record: &IndexRecord) -> Result<Vec<u8>, IndexError> {
    let bytes = encode_to_vec(record, standard()).map_err(|e| IndexError::Encode(e.to_string()))?;
    encode_all(bytes.as_slice(), 3).map_err(|e| IndexError::Encode(e.to_string()))
}

fn decode_record(bytes: &[u8]) -> Result<IndexRecord, IndexError> {
    let raw = decode_all(bytes).map_err(|e| IndexError::Decode(e.to_string()))?;
    let (record, _) =
        decode_from_slice(&raw, standard()).map_err(|e| IndexError::Decode(e.to_string()))?;
    Ok(record)
}

/// Configuration for constructing a [`VectorIndex`].
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub backend: BackendConfig,
    pub dimension: usize,
    pub quantize_scale: f32,
    pub ann: AnnConfig,
}

impl IndexConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            backend: BackendConfig::default(),
            dimension,
            quantize_scale: 4.0,
            ann: AnnConfig::default(),
        }
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }
}

/// The component B adapter: durable key-vector storage plus an in-process
/// ANN graph kept warm for `query`.
pub struct VectorIndex {
    backend: Box<dyn IndexBackend>,
    ann: RwLock<ann::AnnIndex>,
    quantize_scale: f32,
    dimension: usize,
}

impl VectorIndex {
    /// Open the backend and replay its contents into the ANN graph. This is
    /// the "on-disk durability, in-memory search" split described in
    /// SPEC_FULL §4.2.
    pub fn open(config: IndexConfig) -> Result<Self, IndexError> {
        let backend = config.backend.build()?;
        let mut ann = ann::AnnIndex::new(config.dimension, config.ann);

        for (id, bytes) in backend.scan()? {
            match decode_record(&bytes) {
                Ok(record) => {
                    if let Some(q) = &record.quantized {
                        let embedding = dequantize(q, config.quantize_scale);
                        if let Err(e) = ann.insert(id.clone(), embedding) {
                            warn!(id = %id, error = %e, "vector index: dropping record with bad embedding on load");
                        }
                    }
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "vector index: dropping malformed record on load");
                }
            }
        }
        ann.build();

        Ok(Self {
            backend,
            ann: RwLock::new(ann),
            quantize_scale: config.quantize_scale,
            dimension: config.dimension,
        })
    }

    /// Idempotent by id: re-upserting replaces both the stored record and
    /// the in-memory embedding.
    pub fn upsert(
        &self,
        id: &str,
        embedding: &[f32],
        metadata: IndexMetadata,
        document: String,
    ) -> Result<(), IndexError> {
        if embedding.len() != self.dimension {
            return Err(IndexError::InvalidArgument {
                field: "embedding".to_string(),
                message: format!("expected dimension {}, got {}", self.dimension, embedding.len()),
            });
        }

        let quantized = quantize(embedding, self.quantize_scale);
        let record = IndexRecord {
            schema_version: INDEX_SCHEMA_VERSION,
            id: id.to_string(),
            quantized: Some(quantized),
            metadata,
            document,
        };
        let bytes = encode_record(&record)?;
        self.backend.put(id, &bytes)?;

        let mut ann = self
            .ann
            .write()
            .map_err(|_| IndexError::backend("ann index lock poisoned"))?;
        ann.insert(id.to_string(), embedding.to_vec())
            .map_err(|e| IndexError::InvalidArgument {
                field: "embedding".to_string(),
                message: e.to_string(),
            })?;
        ann.build();
        Ok(())
    }

    /// Top-`k` nearest neighbors under `where_clause`, ascending distance.
    pub fn query(
        &self,
        embedding: &[f32],
        k: usize,
        where_clause: &MetadataWhere,
    ) -> Result<Vec<QueryHit>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let ann = self
            .ann
            .read()
            .map_err(|_| IndexError::backend("ann index lock poisoned"))?;

        // Over-fetch past k since the where-clause is applied post-search;
        // a tighter implementation would push the predicate into the ANN
        // walk, but the store's own contract only promises a post-filter.
        let fetch = (k * 8).max(k).min(ann.len().max(k));
        let candidates = ann
            .search(embedding, fetch.max(k))
            .map_err(|e| IndexError::InvalidArgument {
                field: "embedding".to_string(),
                message: e.to_string(),
            })?;

        let mut hits = Vec::with_capacity(k);
        for candidate in candidates {
            let Some(id) = ann.get_id(candidate.index) else {
                continue;
            };
            let Some(bytes) = self.backend.get(id)? else {
                continue;
            };
            let record = decode_record(&bytes)?;
            if !where_clause.matches(&record.metadata) {
                continue;
            }
            hits.push(QueryHit {
                id: record.id,
                metadata: record.metadata,
                document: record.document,
                distance: candidate.distance,
            });
            if hits.len() == k {
                break;
            }
        }
        Ok(hits)
    }

    pub fn get_by_ids(&self, ids: &[String]) -> Result<Vec<IndexRecord>, IndexError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(bytes) = self.backend.get(id)? {
                out.push(decode_record(&bytes)?);
            }
        }
        Ok(out)
    }

    /// Cheap existence check by id, used by sync's catch-up mode to avoid
    /// re-upserting records already present in (B).
    pub fn contains(&self, id: &str) -> Result<bool, IndexError> {
        Ok(self.backend.get(id)?.is_some())
    }

    pub fn count(&self) -> Result<usize, IndexError> {
        self.backend.len()
    }

    /// Delete every record from both the backend and the in-memory ANN
    /// graph. Used by sync's rebuild mode, which repopulates (B) from (A)
    /// afterwards.
    pub fn clear(&self) -> Result<(), IndexError> {
        for (id, _) in self.backend.scan()? {
            self.backend.delete(&id)?;
        }
        let mut ann = self
            .ann
            .write()
            .map_err(|_| IndexError::backend("ann index lock poisoned"))?;
        *ann = ann::AnnIndex::new(self.dimension, ann.config());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(ts: i64, screen: &str) -> IndexMetadata {
        IndexMetadata {
            timestamp: ts,
            timestamp_iso: ts.to_string(),
            screen_name: screen.to_string(),
            text_length: 5,
            word_count: 1,
            data_type: "ocr".to_string(),
            source: "capture-v1".to_string(),
        }
    }

    fn open_index() -> VectorIndex {
        VectorIndex::open(IndexConfig::new(3)).unwrap()
    }

    #[test]
    fn quantize_dequantize_roundtrip_is_lossy_but_bounded() {
        let original = vec![1.0_f32, -2.0, 0.0];
        let q = quantize(&original, 4.0);
        let back = dequantize(&q, 4.0);
        for (a, b) in original.iter().zip(back.iter()) {
            assert!((a - b).abs() < 0.1, "a={a} b={b}");
        }
    }

    #[test]
    fn upsert_then_query_finds_closest_match() {
        let index = open_index();
        index
            .upsert("a", &[1.0, 0.0, 0.0], meta(1, "Display_1"), "doc a".into())
            .unwrap();
        index
            .upsert("b", &[0.0, 1.0, 0.0], meta(2, "Display_1"), "doc b".into())
            .unwrap();

        let hits = index.query(&[1.0, 0.0, 0.0], 1, &MetadataWhere::new()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn upsert_is_idempotent_by_id() {
        let index = open_index();
        index
            .upsert("a", &[1.0, 0.0, 0.0], meta(1, "Display_1"), "v1".into())
            .unwrap();
        index
            .upsert("a", &[1.0, 0.0, 0.0], meta(1, "Display_1"), "v2".into())
            .unwrap();
        assert_eq!(index.count().unwrap(), 1);
        let got = index.get_by_ids(&["a".to_string()]).unwrap();
        assert_eq!(got[0].document, "v2");
    }

    #[test]
    fn query_applies_metadata_where_clause() {
        let index = open_index();
        index
            .upsert("a", &[1.0, 0.0, 0.0], meta(1, "Display_1"), "doc a".into())
            .unwrap();
        index
            .upsert("b", &[1.0, 0.0, 0.0], meta(2, "Display_2"), "doc b".into())
            .unwrap();

        let where_clause = MetadataWhere::new().eq(EqField::ScreenName, "Display_2");
        let hits = index.query(&[1.0, 0.0, 0.0], 5, &where_clause).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[test]
    fn wrong_dimension_embedding_is_rejected() {
        let index = open_index();
        let err = index
            .upsert("a", &[1.0, 0.0], meta(1, "Display_1"), "doc".into())
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument { .. }));
    }

    #[test]
    fn count_reflects_upserts() {
        let index = open_index();
        assert_eq!(index.count().unwrap(), 0);
        index
            .upsert("a", &[1.0, 0.0, 0.0], meta(1, "Display_1"), "doc".into())
            .unwrap();
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn reopen_over_redb_backend_restores_ann_graph() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index.redb");
        {
            let index = VectorIndex::open(
                IndexConfig::new(3).with_backend(BackendConfig::redb(&path)),
            )
            .unwrap();
            index
                .upsert("a", &[1.0, 0.0, 0.0], meta(1, "Display_1"), "doc a".into())
                .unwrap();
        }
        let index =
            VectorIndex::open(IndexConfig::new(3).with_backend(BackendConfig::redb(&path))).unwrap();
        assert_eq!(index.count().unwrap(), 1);
        let hits = index.query(&[1.0, 0.0, 0.0], 1, &MetadataWhere::new()).unwrap();
        assert_eq!(hits[0].id, "a");
    }
}
