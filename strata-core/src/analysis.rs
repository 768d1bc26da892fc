//! Introspection helpers for measuring graph shape and health.
//!
//! These measurements track the implementation and carry no compatibility
//! guarantee; they exist for tests, benchmarks, and tuning sessions.

use crate::distance::Distance;
use crate::hnsw::node::Key;
use crate::hnsw::Graph;

/// Borrow-view over a graph exposing shape measurements. Each method takes
/// the graph's read lock for the duration of the call.
pub struct Analysis<'a, K: Key, D: Distance> {
    graph: &'a Graph<K, D>,
}

impl<K: Key, D: Distance> Graph<K, D> {
    /// Returns a view for measuring the graph's shape.
    pub fn analysis(&self) -> Analysis<'_, K, D> {
        Analysis { graph: self }
    }
}

impl<K: Key, D: Distance> Analysis<'_, K, D> {
    /// Number of layers in the hierarchy.
    pub fn height(&self) -> usize {
        self.graph.inner.read().layers.len()
    }

    /// Node count per layer, base layer first.
    pub fn topography(&self) -> Vec<usize> {
        self.graph
            .inner
            .read()
            .layers
            .iter()
            .map(|layer| layer.size())
            .collect()
    }

    /// Mean neighbor count per node per layer, base layer first. Values
    /// well below `m` on the base layer of a populated graph usually point
    /// at a connectivity problem.
    pub fn connectivity(&self) -> Vec<f64> {
        self.graph
            .inner
            .read()
            .layers
            .iter()
            .map(|layer| {
                if layer.is_empty() {
                    0.0
                } else {
                    let edges: usize = layer.iter().map(|node| node.neighbors.len()).sum();
                    edges as f64 / layer.size() as f64
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::distance::DistanceMetric;
    use crate::hnsw::Node;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn populated_graph(count: usize) -> Graph<u32, DistanceMetric> {
        let config = Config {
            seed: Some(99),
            ..Config::default()
        };
        let graph = Graph::new(config, DistanceMetric::Euclidean).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let nodes: Vec<Node<u32>> = (0..count)
            .map(|i| {
                let vector: Vec<f32> = (0..4).map(|_| rng.gen::<f32>()).collect();
                Node::new(i as u32, vector)
            })
            .collect();
        graph.add(nodes).unwrap();
        graph
    }

    #[test]
    fn test_empty_graph_measurements() {
        let graph: Graph<u32, DistanceMetric> = Graph::default();
        let analysis = graph.analysis();
        assert_eq!(analysis.height(), 0);
        assert!(analysis.topography().is_empty());
        assert!(analysis.connectivity().is_empty());
    }

    #[test]
    fn test_topography_counts_base_layer_first() {
        let graph = populated_graph(60);
        let analysis = graph.analysis();
        let topography = analysis.topography();
        assert_eq!(topography.len(), analysis.height());
        assert_eq!(topography[0], 60);
        // Layers never hold more nodes than the base layer.
        for &size in &topography[1..] {
            assert!(size <= 60);
        }
    }

    #[test]
    fn test_connectivity_is_bounded_by_m() {
        let graph = populated_graph(60);
        let m = graph.config().m as f64;
        let connectivity = graph.analysis().connectivity();
        assert!(connectivity[0] > 0.0);
        for mean in connectivity {
            assert!(mean <= m);
        }
    }
}
