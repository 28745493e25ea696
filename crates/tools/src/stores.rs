use async_trait::async_trait;
use coinq_domain::Result;

use crate::types::{NewsPassage, PricePoint};

/// Read-only collaborator backing `get_coin_price`. The real
/// implementation (out of scope here) is a document store populated by
/// an ingestion pipeline; this trait is the only seam the Executor's
/// tool bodies touch.
#[async_trait]
pub trait PriceStore: Send + Sync {
    async fn price_series(
        &self,
        coin_name: &str,
        pivot_epoch: i64,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<PricePoint>>;
}

/// Read-only collaborator backing `semantic_search`. Embedding and
/// nearest-neighbour search happen behind this seam; out of scope are
/// the vector store itself and whatever ingests it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn nearest(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        date_window: Option<(i64, i64)>,
        source: Option<&str>,
    ) -> Result<Vec<NewsPassage>>;
}

/// In-memory `PriceStore` for tests and offline CLI use: holds a fixed
/// series per coin and slices it to the requested window.
pub struct InMemoryPriceStore {
    series: std::collections::HashMap<String, Vec<PricePoint>>,
}

impl InMemoryPriceStore {
    pub fn new(series: std::collections::HashMap<String, Vec<PricePoint>>) -> Self {
        Self { series }
    }

    pub fn empty() -> Self {
        Self {
            series: std::collections::HashMap::new(),
        }
    }
}

#[async_trait]
impl PriceStore for InMemoryPriceStore {
    async fn price_series(
        &self,
        coin_name: &str,
        _pivot_epoch: i64,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<PricePoint>> {
        let points = self
            .series
            .get(&coin_name.to_uppercase())
            .map(|series| {
                series
                    .iter()
                    .filter(|p| p.epoch >= window_start && p.epoch <= window_end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(points)
    }
}

/// In-memory `VectorStore`: ranks fixed passages by a trivial distance
/// to the query embedding's first component. Deterministic, good
/// enough for exercising ranking/truncation/threshold behavior in tests.
pub struct InMemoryVectorStore {
    passages: Vec<(f32, NewsPassage)>,
}

impl InMemoryVectorStore {
    /// `key` is a per-passage embedding-space coordinate used to derive
    /// a similarity score relative to the query.
    pub fn new(passages: Vec<(f32, NewsPassage)>) -> Self {
        Self { passages }
    }

    pub fn empty() -> Self {
        Self { passages: Vec::new() }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn nearest(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        date_window: Option<(i64, i64)>,
        source: Option<&str>,
    ) -> Result<Vec<NewsPassage>> {
        let q = query_embedding.first().copied().unwrap_or(0.0);
        let mut scored: Vec<NewsPassage> = self
            .passages
            .iter()
            .filter(|(_, p)| {
                date_window.map(|(s, e)| p.date_epoch >= s && p.date_epoch <= e).unwrap_or(true)
            })
            .filter(|(_, p)| source.map(|s| p.source == s).unwrap_or(true))
            .map(|(key, p)| {
                let mut passage = p.clone();
                // closer key to query => higher similarity
                passage.similarity = 1.0 - ((key - q).abs() as f64);
                passage
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}
