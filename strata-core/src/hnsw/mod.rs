//! The hierarchical navigable small world graph: layered topology,
//! insertion protocol, greedy descent, and deletion with connectivity
//! repair.
//!
//! Layer 0 holds every live key; each layer above is a sparser overlay
//! acting as an express lane. Both insertion and search enter at the top
//! layer and descend one layer at a time, carrying the best vertex found so
//! far (the "elevator") into the layer below.

pub(crate) mod heap;
pub mod node;

use std::sync::Arc;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, trace};

use crate::config::Config;
use crate::distance::{Distance, DistanceMetric};
use crate::error::{StrataError, StrataResult};
use crate::utils::create_rng;
use crate::vector::Embedding;
use node::{Key, Layer, LayerNode};

/// A single insert payload: user key plus embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<K> {
    pub key: K,
    pub vector: Embedding,
}

impl<K: Key> Node<K> {
    pub fn new(key: K, vector: impl Into<Embedding>) -> Self {
        Node {
            key,
            vector: vector.into(),
        }
    }
}

/// One search hit: the stored key and embedding plus the distance to the
/// query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<K> {
    pub key: K,
    pub vector: Embedding,
    pub distance: f32,
}

/// An approximate nearest neighbour index over HNSW.
///
/// The graph is generic over the key type and the distance function. All
/// mutable state sits behind a single reader/writer lock: `add` and
/// `delete` serialize against everything, while `search`, `lookup`, `len`
/// and `dims` run concurrently with each other.
pub struct Graph<K: Key, D: Distance> {
    config: Config,
    distance: D,
    pub(crate) inner: RwLock<GraphInner<K>>,
}

pub(crate) struct GraphInner<K> {
    /// Layer stack; index 0 is the base layer holding every live key.
    pub(crate) layers: Vec<Layer<K>>,
    /// Level-selection randomness, guarded by the write lock alongside the
    /// layers it feeds.
    rng: StdRng,
}

/// Draws the level a new node will be inserted at. Level `l` is returned at
/// the first draw exceeding `ml`; the ceiling grows logarithmically with
/// the base layer population.
fn random_level(rng: &mut StdRng, ml: f64, base_size: usize) -> usize {
    let mut max = 1;
    if base_size > 0 {
        max = ((base_size as f64).ln() / (1.0 / ml).ln()).round() as usize + 1;
    }
    for level in 0..max {
        let draw: f64 = rng.gen();
        if draw > ml {
            return level;
        }
    }
    max
}

/// The vector length the graph is committed to, or `None` while empty.
fn established_dims<K: Key>(layers: &[Layer<K>]) -> Option<usize> {
    layers
        .first()
        .and_then(Layer::entry)
        .map(|node| node.vector.len())
}

/// The vertex a layer search starts from: the elevator carried down from
/// the layer above, or any entry vertex of the layer.
fn resolve_search_point<K: Key>(elevator: &Option<K>, layer: &Layer<K>) -> StrataResult<K> {
    match elevator {
        Some(key) => Ok(key.clone()),
        None => layer.entry().map(|node| node.key.clone()).ok_or_else(|| {
            StrataError::InvariantViolation("search entered an empty layer".to_string())
        }),
    }
}

impl<K: Key, D: Distance> Graph<K, D> {
    /// Creates a new, empty graph after validating the configuration.
    pub fn new(config: Config, distance: D) -> StrataResult<Self> {
        config.validate()?;
        Ok(Graph {
            config,
            distance,
            inner: RwLock::new(GraphInner {
                layers: Vec::new(),
                rng: create_rng(config.seed),
            }),
        })
    }

    /// Returns the configuration of the graph.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Inserts nodes into the graph, replacing any existing node that
    /// shares a key.
    ///
    /// The batch is not transactional: the first failing node aborts the
    /// call and earlier nodes stay inserted.
    pub fn add(&self, nodes: impl IntoIterator<Item = Node<K>>) -> StrataResult<()> {
        let mut inner = self.inner.write();
        for node in nodes {
            self.insert_one(&mut inner, node)?;
        }
        Ok(())
    }

    fn insert_one(&self, inner: &mut GraphInner<K>, node: Node<K>) -> StrataResult<()> {
        let Node { key, vector } = node;
        let vector = Arc::new(vector);

        // The dimension guard runs before any structural mutation so a
        // failed insert leaves the graph unchanged.
        if let Some(dims) = established_dims(&inner.layers) {
            if vector.len() != dims {
                return Err(StrataError::DimensionMismatch {
                    expected: dims,
                    actual: vector.len(),
                });
            }
        }

        let pre_len = inner.layers.first().map_or(0, Layer::size);
        let insert_level = random_level(&mut inner.rng, self.config.ml, pre_len);
        trace!(key = ?key, insert_level, "inserting node");

        while inner.layers.len() <= insert_level {
            inner.layers.push(Layer::new());
        }

        let mut elevator: Option<K> = None;
        let mut is_update = false;

        for i in (0..inner.layers.len()).rev() {
            let layer = &mut inner.layers[i];

            // Freshly created layers (and the very first insert) adopt the
            // node as their sole occupant.
            if layer.is_empty() {
                layer.insert(LayerNode::new(key.clone(), Arc::clone(&vector)));
                continue;
            }

            let search_point = resolve_search_point(&elevator, layer)?;
            let neighborhood = layer.search_from(
                &search_point,
                self.config.m,
                self.config.ef_construction,
                vector.as_ref(),
                &self.distance,
            )?;
            let nearest = neighborhood.first().ok_or_else(|| {
                StrataError::InvariantViolation(
                    "layer search returned no candidates".to_string(),
                )
            })?;
            elevator = Some(nearest.key.clone());

            if i <= insert_level {
                if let Some(existing) = layer.remove(&key) {
                    layer.isolate(&existing, self.config.m)?;
                    is_update = true;
                }
                layer.insert(LayerNode::new(key.clone(), Arc::clone(&vector)));
                for member in &neighborhood {
                    // The neighborhood may still list the replaced copy of
                    // this key; edges must never loop back to the node.
                    if member.key == key {
                        continue;
                    }
                    layer.add_neighbor(&member.key, &key, self.config.m, &self.distance)?;
                    layer.add_neighbor(&key, &member.key, self.config.m, &self.distance)?;
                }
            }
        }

        let post_len = inner.layers.first().map_or(0, Layer::size);
        let expected = if is_update { pre_len } else { pre_len + 1 };
        if post_len != expected {
            return Err(StrataError::InvariantViolation(format!(
                "expected {} nodes on the base layer after insert, found {}",
                expected, post_len
            )));
        }
        debug!(key = ?key, insert_level, updated = is_update, "node inserted");
        Ok(())
    }

    /// Finds the `k` nearest neighbors of `near`, ordered by ascending
    /// distance.
    pub fn search(&self, near: &Embedding, k: usize) -> StrataResult<Vec<SearchResult<K>>> {
        let inner = self.inner.read();
        let dims = established_dims(&inner.layers).ok_or(StrataError::EmptyGraph)?;
        if near.len() != dims {
            return Err(StrataError::DimensionMismatch {
                expected: dims,
                actual: near.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        trace!(k, layers = inner.layers.len(), "searching graph");

        let mut elevator: Option<K> = None;
        for i in (1..inner.layers.len()).rev() {
            let layer = &inner.layers[i];
            let search_point = resolve_search_point(&elevator, layer)?;
            let found =
                layer.search_from(&search_point, 1, self.config.ef_search, near, &self.distance)?;
            let nearest = found.first().ok_or_else(|| {
                StrataError::InvariantViolation(
                    "layer search returned no candidates".to_string(),
                )
            })?;
            elevator = Some(nearest.key.clone());
        }

        let layer = &inner.layers[0];
        let search_point = resolve_search_point(&elevator, layer)?;
        let found =
            layer.search_from(&search_point, k, self.config.ef_search, near, &self.distance)?;

        let mut results = Vec::with_capacity(found.len());
        for candidate in found {
            let node = layer.get(&candidate.key).ok_or_else(|| {
                StrataError::InvariantViolation(format!(
                    "node {:?} missing from base layer",
                    candidate.key
                ))
            })?;
            results.push(SearchResult {
                key: candidate.key,
                vector: (*node.vector).clone(),
                distance: candidate.distance,
            });
        }
        Ok(results)
    }

    /// Removes a key from every layer, repairing the connectivity of its
    /// former neighbors. Returns whether the key was present.
    pub fn delete(&self, key: &K) -> StrataResult<bool> {
        let mut inner = self.inner.write();
        let m = self.config.m;
        let mut deleted = false;
        for layer in inner.layers.iter_mut() {
            if let Some(detached) = layer.remove(key) {
                layer.isolate(&detached, m)?;
                deleted = true;
            }
        }
        if deleted {
            // Reclaim layers emptied by the removal so the top of the
            // stack always has an entry point.
            while inner.layers.last().map_or(false, Layer::is_empty) {
                inner.layers.pop();
            }
            debug!(key = ?key, layers = inner.layers.len(), "node deleted");
        }
        Ok(deleted)
    }

    /// Returns the vector stored under `key`, if any. Only the base layer
    /// is consulted.
    pub fn lookup(&self, key: &K) -> Option<Embedding> {
        let inner = self.inner.read();
        inner
            .layers
            .first()?
            .get(key)
            .map(|node| (*node.vector).clone())
    }

    /// Number of live keys in the graph.
    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.layers.first().map_or(0, Layer::size)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The vector length the graph holds, or 0 while empty. Established by
    /// the first inserted vector.
    pub fn dims(&self) -> usize {
        let inner = self.inner.read();
        established_dims(&inner.layers).unwrap_or(0)
    }
}

impl<K: Key> Default for Graph<K, DistanceMetric> {
    /// A graph with the default configuration and cosine distance.
    fn default() -> Self {
        Graph {
            config: Config::default(),
            distance: DistanceMetric::Cosine,
            inner: RwLock::new(GraphInner {
                layers: Vec::new(),
                rng: create_rng(None),
            }),
        }
    }
}
