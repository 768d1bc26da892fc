//! Layers of the hierarchy and the per-layer neighbor management:
//! bounded neighbor insertion, greedy best-first search, two-hop
//! replenishment, and isolation of nodes about to be dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::distance::{Distance, DistanceMetric};
use crate::error::{StrataError, StrataResult};
use crate::hnsw::heap::{Candidate, CandidateHeap};
use crate::vector::Embedding;

/// Bound for graph keys: totally ordered, cloneable, printable in errors.
/// Satisfied by integers, strings, and most id types out of the box.
pub trait Key: Ord + Clone + fmt::Debug {}

impl<K: Ord + Clone + fmt::Debug> Key for K {}

/// One vertex of one layer.
///
/// A key present on several layers gets an independent `LayerNode` per
/// layer, each with its own neighbor set; the embedding itself is shared.
/// Neighbor references stay within the layer and are stored as keys into
/// the layer's node map.
#[derive(Debug, Clone)]
pub(crate) struct LayerNode<K> {
    pub(crate) key: K,
    pub(crate) vector: Arc<Embedding>,
    /// Neighbor keys within the same layer, kept sorted so searches
    /// enumerate them in ascending key order.
    pub(crate) neighbors: BTreeSet<K>,
}

impl<K: Key> LayerNode<K> {
    pub(crate) fn new(key: K, vector: Arc<Embedding>) -> Self {
        LayerNode {
            key,
            vector,
            neighbors: BTreeSet::new(),
        }
    }
}

/// One level of the hierarchy: a keyed collection of layer nodes.
#[derive(Debug, Default)]
pub(crate) struct Layer<K> {
    nodes: BTreeMap<K, LayerNode<K>>,
}

impl<K: Key> Layer<K> {
    pub(crate) fn new() -> Self {
        Layer {
            nodes: BTreeMap::new(),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a representative node to begin a search from. Which node is
    /// unspecified; greedy descent corrects for any starting point.
    pub(crate) fn entry(&self) -> Option<&LayerNode<K>> {
        self.nodes.values().next()
    }

    pub(crate) fn get(&self, key: &K) -> Option<&LayerNode<K>> {
        self.nodes.get(key)
    }

    pub(crate) fn insert(&mut self, node: LayerNode<K>) {
        self.nodes.insert(node.key.clone(), node);
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<LayerNode<K>> {
        self.nodes.remove(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &LayerNode<K>> {
        self.nodes.values()
    }

    fn node(&self, key: &K) -> StrataResult<&LayerNode<K>> {
        self.nodes.get(key).ok_or_else(|| {
            StrataError::InvariantViolation(format!("node {:?} missing from layer", key))
        })
    }

    /// Inserts `target` into `receiver`'s neighbor set, evicting the
    /// neighbor farthest from the receiver when the set grows past `m`.
    ///
    /// The eviction scan treats the first candidate as tentatively worst
    /// and replaces it only on strictly greater distance, so a NaN distance
    /// never beats a real one but still fills the initial slot: exactly one
    /// neighbor is evicted even when every distance is NaN.
    pub(crate) fn add_neighbor<D: Distance>(
        &mut self,
        receiver: &K,
        target: &K,
        m: usize,
        dist: &D,
    ) -> StrataResult<()> {
        {
            let node = self.nodes.get_mut(receiver).ok_or_else(|| {
                StrataError::InvariantViolation(format!("node {:?} missing from layer", receiver))
            })?;
            node.neighbors.insert(target.clone());
            if node.neighbors.len() <= m {
                return Ok(());
            }
        }

        let (receiver_vec, neighbor_keys) = {
            let node = self.node(receiver)?;
            (
                Arc::clone(&node.vector),
                node.neighbors.iter().cloned().collect::<Vec<_>>(),
            )
        };

        let mut worst: Option<K> = None;
        let mut worst_dist = f32::NEG_INFINITY;
        for neighbor_key in &neighbor_keys {
            let Some(neighbor) = self.nodes.get(neighbor_key) else {
                continue;
            };
            let d = dist.distance(neighbor.vector.view(), receiver_vec.view())?;
            if d > worst_dist || worst.is_none() {
                worst_dist = d;
                worst = Some(neighbor_key.clone());
            }
        }

        if let Some(worst) = worst {
            if let Some(node) = self.nodes.get_mut(receiver) {
                node.neighbors.remove(&worst);
            }
            if let Some(node) = self.nodes.get_mut(&worst) {
                node.neighbors.remove(receiver);
            }
            // An insert that immediately bounced needs no repair; a repair
            // here would recreate the same edge and never terminate.
            if worst != *target {
                self.replenish(&worst, m)?;
            }
        }
        Ok(())
    }

    /// Best-first greedy traversal of this layer starting at `start`,
    /// returning up to `k` nodes ordered by ascending distance to `target`.
    ///
    /// The frontier is capped at `ef_search` entries. Traversal stops once
    /// a whole expansion round fails to improve on the current best result
    /// while the result set is already full.
    pub(crate) fn search_from<D: Distance>(
        &self,
        start: &K,
        k: usize,
        ef_search: usize,
        target: &Embedding,
        dist: &D,
    ) -> StrataResult<Vec<Candidate<K>>> {
        let entry = self.node(start)?;
        let mut frontier = CandidateHeap::with_capacity(ef_search + 1);
        let mut result = CandidateHeap::with_capacity(k + 1);
        let mut visited: BTreeSet<K> = BTreeSet::new();

        let entry_distance = dist.distance(entry.vector.view(), target.view())?;
        visited.insert(start.clone());
        frontier.push(Candidate {
            key: start.clone(),
            distance: entry_distance,
        });
        result.push(Candidate {
            key: start.clone(),
            distance: entry_distance,
        });

        while let Some(current) = frontier.pop() {
            let current_node = self.node(&current.key)?;
            let mut improved = false;
            // Ascending key order keeps traversal deterministic across runs.
            for neighbor_key in &current_node.neighbors {
                if !visited.insert(neighbor_key.clone()) {
                    continue;
                }
                let neighbor = self.node(neighbor_key)?;
                let distance = dist.distance(neighbor.vector.view(), target.view())?;
                if let Some(min) = result.min() {
                    improved = improved || distance < min.distance;
                }

                if result.len() < k {
                    result.push(Candidate {
                        key: neighbor_key.clone(),
                        distance,
                    });
                } else if result.max().map_or(false, |max| distance < max.distance) {
                    result.pop_last();
                    result.push(Candidate {
                        key: neighbor_key.clone(),
                        distance,
                    });
                }

                frontier.push(Candidate {
                    key: neighbor_key.clone(),
                    distance,
                });
                if frontier.len() > ef_search {
                    frontier.pop_last();
                }
            }
            if !improved && result.len() >= k {
                break;
            }
        }

        Ok(result.into_sorted_vec())
    }

    /// Restores the receiver's neighbor count after an eviction or a
    /// deletion by adopting two-hop candidates: neighbors of neighbors,
    /// skipping the receiver itself, existing neighbors, and nodes that are
    /// mid-removal. Stops as soon as the receiver reaches `m` neighbors.
    ///
    /// Candidates are scored with cosine distance independently of the
    /// graph's configured distance function.
    pub(crate) fn replenish(&mut self, key: &K, m: usize) -> StrataResult<()> {
        if self.node(key)?.neighbors.len() >= m {
            return Ok(());
        }
        let neighbor_keys: Vec<K> = self.node(key)?.neighbors.iter().cloned().collect();
        for neighbor_key in neighbor_keys {
            let candidates: Vec<K> = match self.nodes.get(&neighbor_key) {
                Some(node) => node.neighbors.iter().cloned().collect(),
                None => continue,
            };
            for candidate in candidates {
                if candidate == *key
                    || !self.nodes.contains_key(&candidate)
                    || self.node(key)?.neighbors.contains(&candidate)
                {
                    continue;
                }
                self.add_neighbor(key, &candidate, m, &DistanceMetric::Cosine)?;
                self.add_neighbor(&candidate, key, m, &DistanceMetric::Cosine)?;
                if self.node(key)?.neighbors.len() >= m {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Removes every inbound edge pointing at `detached` and replenishes
    /// the nodes that lost one. The detached node's own neighbor set is
    /// left untouched; the caller is about to discard it.
    pub(crate) fn isolate(&mut self, detached: &LayerNode<K>, m: usize) -> StrataResult<()> {
        for neighbor_key in &detached.neighbors {
            let Some(node) = self.nodes.get_mut(neighbor_key) else {
                continue;
            };
            node.neighbors.remove(&detached.key);
            self.replenish(neighbor_key, m)?;
        }
        Ok(())
    }
}
