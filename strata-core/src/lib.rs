//! An in-memory approximate nearest neighbour index built on the
//! Hierarchical Navigable Small World (HNSW) graph.
//!
//! The graph stores keyed vectors and answers k-nearest-neighbor queries
//! in expected sub-linear time under a pluggable distance function. It is
//! a pure in-memory structure: no persistence, no background threads, one
//! reader/writer lock.
//!
//! ```
//! use strata_core::{DistanceMetric, Graph, Node};
//!
//! let graph: Graph<u32, DistanceMetric> = Graph::default();
//! graph.add([
//!     Node::new(1, vec![1.0, 0.0]),
//!     Node::new(2, vec![0.0, 1.0]),
//! ])?;
//!
//! let hits = graph.search(&vec![0.9, 0.1].into(), 1)?;
//! assert_eq!(hits[0].key, 1);
//! # Ok::<(), strata_core::StrataError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod distance;
pub mod error;
pub mod hnsw;
pub mod vector;
mod utils;

// Re-export key types/traits for easier use
pub use analysis::Analysis;
pub use config::Config;
pub use distance::{calculate_distance, Distance, DistanceMetric};
pub use error::{StrataError, StrataResult};
pub use hnsw::node::Key;
pub use hnsw::{Graph, Node, SearchResult};
pub use vector::Embedding;
