//! Approximate inverted-file (IVF) vector index.
//!
//! [`IvfIndex`] partitions entries into `lists` clusters with spherical
//! k-means and, at query time, scores only the entries of the `probes`
//! clusters whose centroids are closest to the query. Clustering is fully
//! deterministic (farthest-point seeding from the first entry, a fixed
//! iteration budget, lowest-index tie-breaks), so repeated builds over the
//! same corpus answer identically. With `probes >= lists` search is exact.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::document::{Document, Embedding, IndexEntry, SearchResult};
use crate::error::Result;
use crate::index::{VectorIndex, cosine_similarity, embed_query, into_entries, rank};
use crate::preprocess::DocumentPreprocessor;

const KMEANS_ITERATIONS: usize = 16;

struct IvfState {
    dimensions: usize,
    entries: Vec<IndexEntry>,
    centroids: Vec<Embedding>,
    /// Entry positions per centroid, ascending.
    postings: Vec<Vec<usize>>,
}

/// An approximate vector index that scans only the nearest clusters.
pub struct IvfIndex {
    preprocessor: Arc<DocumentPreprocessor>,
    lists: usize,
    probes: usize,
    state: RwLock<Option<IvfState>>,
}

impl IvfIndex {
    /// Create an empty index with `lists` clusters, scanning `probes` of them per query.
    pub fn new(preprocessor: Arc<DocumentPreprocessor>, lists: usize, probes: usize) -> Self {
        Self { preprocessor, lists: lists.max(1), probes: probes.max(1), state: RwLock::new(None) }
    }
}

/// Index of the most similar centroid; ties go to the lowest index.
fn nearest(centroids: &[Embedding], vector: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let score = cosine_similarity(centroid, vector);
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    best
}

/// Farthest-point seeding: start from the first entry, then repeatedly take
/// the entry least similar to every centroid chosen so far.
fn seed_centroids(entries: &[IndexEntry], count: usize) -> Vec<Embedding> {
    let mut centroids = vec![entries[0].embedding.clone()];
    let mut closest: Vec<f32> =
        entries.iter().map(|e| cosine_similarity(&e.embedding, &centroids[0])).collect();

    while centroids.len() < count {
        let mut pick = 0;
        for (i, score) in closest.iter().enumerate() {
            if *score < closest[pick] {
                pick = i;
            }
        }
        let centroid = entries[pick].embedding.clone();
        for (entry, score) in entries.iter().zip(closest.iter_mut()) {
            *score = score.max(cosine_similarity(&entry.embedding, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn normalized_mean(members: &[usize], entries: &[IndexEntry], dimensions: usize) -> Option<Embedding> {
    let mut mean = vec![0.0f32; dimensions];
    for &i in members {
        for (m, x) in mean.iter_mut().zip(&entries[i].embedding) {
            *m += x;
        }
    }
    let norm: f32 = mean.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return None;
    }
    mean.iter_mut().for_each(|x| *x /= norm);
    Some(mean)
}

fn cluster(entries: &[IndexEntry], lists: usize, dimensions: usize) -> (Vec<Embedding>, Vec<Vec<usize>>) {
    if entries.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut centroids = seed_centroids(entries, lists.min(entries.len()));
    let mut assignment: Vec<usize> = entries.iter().map(|e| nearest(&centroids, &e.embedding)).collect();

    for _ in 0..KMEANS_ITERATIONS {
        let mut members = vec![Vec::new(); centroids.len()];
        for (i, &c) in assignment.iter().enumerate() {
            members[c].push(i);
        }
        for (centroid, members) in centroids.iter_mut().zip(&members) {
            // Empty or degenerate clusters keep their previous centroid.
            if let Some(mean) = normalized_mean(members, entries, dimensions) {
                *centroid = mean;
            }
        }

        let next: Vec<usize> = entries.iter().map(|e| nearest(&centroids, &e.embedding)).collect();
        if next == assignment {
            break;
        }
        assignment = next;
    }

    let mut postings = vec![Vec::new(); centroids.len()];
    for (i, &c) in assignment.iter().enumerate() {
        postings[c].push(i);
    }
    (centroids, postings)
}

#[async_trait]
impl VectorIndex for IvfIndex {
    fn name(&self) -> &str {
        "ivf"
    }

    async fn add(&self, documents: &[Document]) -> Result<()> {
        let (chunks, embeddings) = self.preprocessor.process(documents).await?;

        let started = Instant::now();
        let dimensions = self.preprocessor.embedder().dimensions();
        let entries = into_entries(chunks, embeddings);
        let (centroids, postings) = cluster(&entries, self.lists, dimensions);
        let entry_count = entries.len();
        let list_count = centroids.len();
        *self.state.write().await = Some(IvfState { dimensions, entries, centroids, postings });

        info!(
            index = "ivf",
            document_count = documents.len(),
            entry_count,
            list_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built vector index"
        );
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let guard = self.state.read().await;
        let Some(state) = guard.as_ref() else {
            warn!(index = "ivf", "vector index is not initialized; call `add` first");
            return Ok(Vec::new());
        };
        if k == 0 || state.entries.is_empty() {
            debug!(index = "ivf", k, "nothing to search");
            return Ok(Vec::new());
        }

        let query_embedding = embed_query(&self.preprocessor, query, state.dimensions).await?;

        let mut lists: Vec<(usize, f32)> = state
            .centroids
            .iter()
            .enumerate()
            .map(|(i, centroid)| (i, cosine_similarity(centroid, &query_embedding)))
            .collect();
        lists.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        lists.truncate(self.probes);

        let candidates = lists
            .iter()
            .flat_map(|(list, _)| state.postings[*list].iter())
            .map(|&i| &state.entries[i]);
        let results = rank(candidates, &query_embedding, k);

        debug!(index = "ivf", k, probes = lists.len(), result_count = results.len(), "search completed");
        Ok(results)
    }

    async fn len(&self) -> usize {
        self.state.read().await.as_ref().map_or(0, |state| state.entries.len())
    }

    async fn is_ready(&self) -> bool {
        self.state.read().await.is_some()
    }
}
