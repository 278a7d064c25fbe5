//! Approximate nearest neighbor search over embeddings, with an exact
//! linear-scan fallback below a configurable minimum vector count.
//! Ported from the teacher's `index::ann` HNSW wrapper; the public surface
//! and fallback threshold are unchanged, only the id/result types are
//! generalized to memex's record shape.
use std::collections::HashMap;

use hnsw_rs::prelude::*;

/// Tuning knobs for HNSW construction and search.
#[derive(Debug, Clone, Copy)]
pub struct AnnConfig {
    pub m: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
    pub max_results: usize,
    pub enabled: bool,
    /// Below this many vectors, search always falls back to linear scan
    /// (SPEC_FULL §4.2's "don't stand up an HNSW graph for a handful of
    /// points" note).
    pub min_vectors_for_ann: usize,
}

impl Default for AnnConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 50,
            max_results: 100,
            enabled: true,
            min_vectors_for_ann: 1000,
        }
    }
}

impl AnnConfig {
    pub fn with_min_vectors_for_ann(mut self, min: usize) -> Self {
        self.min_vectors_for_ann = min;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn should_use_ann(&self, num_vectors: usize) -> bool {
        self.enabled && num_vectors >= self.min_vectors_for_ann
    }
}

/// A single neighbor hit: internal vector slot plus cosine distance.
#[derive(Debug, Clone)]
pub struct AnnResult {
    pub index: usize,
    pub distance: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum AnnError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("index not built")]
    NotBuilt,
}

/// In-memory ANN graph plus a parallel id<->slot mapping. Vectors are
/// appended and only materialized into an HNSW graph on [`build`].
pub struct AnnIndex {
    config: AnnConfig,
    dimension: usize,
    hnsw: Option<Hnsw<'static, f32, DistCosine>>,
    id_to_index: HashMap<String, usize>,
    index_to_id: HashMap<usize, String>,
    vectors: Vec<Vec<f32>>,
    built: bool,
}

impl AnnIndex {
    pub fn new(dimension: usize, config: AnnConfig) -> Self {
        Self {
            config,
            dimension,
            hnsw: None,
            id_to_index: HashMap::new(),
            index_to_id: HashMap::new(),
            vectors: Vec::new(),
            built: false,
        }
    }

    pub fn insert(&mut self, id: String, vector: Vec<f32>) -> Result<(), AnnError> {
        if vector.len() != self.dimension {
            return Err(AnnError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }

        if let Some(&existing) = self.id_to_index.get(&id) {
            self.vectors[existing] = vector;
            self.built = false;
            return Ok(());
        }

        let index = self.vectors.len();
        self.vectors.push(vector);
        self.id_to_index.insert(id.clone(), index);
        self.index_to_id.insert(index, id);
        self.built = false;
        Ok(())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<AnnResult>, AnnError> {
        if query.len() != self.dimension {
            return Err(AnnError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }

        let k = k.min(self.config.max_results);

        if self.built && self.config.should_use_ann(self.vectors.len()) && self.hnsw.is_some() {
            self.hnsw_search(query, k)
        } else {
            self.linear_search(query, k)
        }
    }

    fn hnsw_search(&self, query: &[f32], k: usize) -> Result<Vec<AnnResult>, AnnError> {
        let hnsw = self.hnsw.as_ref().ok_or(AnnError::NotBuilt)?;
        let results: Vec<Neighbour> = hnsw.search(query, k, self.config.ef_search);
        Ok(results
            .into_iter()
            .map(|n| AnnResult {
                index: n.get_origin_id(),
                distance: n.distance,
            })
            .collect())
    }

    fn linear_search(&self, query: &[f32], k: usize) -> Result<Vec<AnnResult>, AnnError> {
        if self.vectors.is_empty() {
            return Ok(Vec::new());
        }
        let mut distances: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vec)| (idx, cosine_distance(query, vec)))
            .collect();
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(distances
            .into_iter()
            .take(k)
            .map(|(index, distance)| AnnResult { index, distance })
            .collect())
    }

    pub fn get_id(&self, index: usize) -> Option<&String> {
        self.index_to_id.get(&index)
    }

    pub fn get_index(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn config(&self) -> AnnConfig {
        self.config
    }

    /// Build the HNSW graph. Below 10 vectors HNSW degenerates, so the
    /// index is marked built but `search` still takes the linear path
    /// (`should_use_ann` stays false under `min_vectors_for_ann`).
    pub fn build(&mut self) {
        if self.vectors.is_empty() {
            return;
        }
        let nb_elem = self.vectors.len();
        if nb_elem < 10 {
            self.built = true;
            return;
        }

        let nb_layer = 16.min((nb_elem as f32).ln().trunc() as usize);
        let hnsw = Hnsw::<f32, DistCosine>::new(
            self.config.m,
            nb_elem,
            nb_layer,
            self.config.ef_construction,
            DistCosine {},
        );
        let data_for_insertion: Vec<(&Vec<f32>, usize)> =
            self.vectors.iter().enumerate().map(|(idx, vec)| (vec, idx)).collect();
        hnsw.parallel_insert(&data_for_insertion);

        self.hnsw = Some(hnsw);
        self.built = true;
    }

    pub fn rebuild(&mut self) {
        self.built = false;
        self.build();
    }
}

/// Cosine distance in `[0, 2]`: 0 for identical direction, 2 for opposite.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 2.0;
    }

    let similarity = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    1.0 - similarity
}

/// Monotone distance-to-relevance transform used by every tool-facing query
/// (SPEC_FULL §4.5): 1.0 at distance 0, 0.0 at distance 2 or beyond.
pub fn relevance_from_distance(distance: f32) -> f32 {
    1.0 - distance.clamp(0.0, 2.0) / 2.0
}
