//! Defines distance functions for comparing vectors.
//!
//! The graph only relies on the ordering of distances: smaller means closer.
//! Distance functions are fallible so embedders can reject malformed input;
//! any error aborts the surrounding graph operation.

use crate::error::{StrataError, StrataResult};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Enum representing the built-in distance functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Cosine distance, `1 - a.b / (|a| * |b|)`. Range [0, 2] for non-zero
    /// vectors; zero vectors produce NaN, which the graph's eviction
    /// tie-break tolerates.
    Cosine,
    /// Euclidean (L2) distance.
    Euclidean,
}

/// Calculates the distance between two vectors using the specified metric.
///
/// Returns `StrataError::DimensionMismatch` if the vectors have different
/// lengths.
pub fn calculate_distance(
    metric: DistanceMetric,
    a: ArrayView1<f32>,
    b: ArrayView1<f32>,
) -> StrataResult<f32> {
    if a.len() != b.len() {
        return Err(StrataError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    match metric {
        DistanceMetric::Cosine => {
            let dot_product = a.dot(&b);
            let norm_a = a.dot(&a).sqrt();
            let norm_b = b.dot(&b).sqrt();
            // Clamp guards against floating point drift pushing the ratio
            // outside [-1, 1]; NaN from zero norms passes through unchanged.
            Ok(1.0 - (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
        }
        DistanceMetric::Euclidean => {
            let diff = &a - &b;
            Ok(diff.dot(&diff).sqrt())
        }
    }
}

/// Trait encapsulating distance calculation, the seam where embedders plug
/// in their own functions. Implementations must be deterministic; symmetry
/// and non-negativity are not required.
pub trait Distance {
    /// Calculates the distance between two vectors, smaller meaning closer.
    fn distance(&self, a: ArrayView1<f32>, b: ArrayView1<f32>) -> StrataResult<f32>;
}

impl Distance for DistanceMetric {
    fn distance(&self, a: ArrayView1<f32>, b: ArrayView1<f32>) -> StrataResult<f32> {
        calculate_distance(*self, a, b)
    }
}

// Plain functions and closures work as distance functions too.
impl<F> Distance for F
where
    F: Fn(ArrayView1<f32>, ArrayView1<f32>) -> StrataResult<f32>,
{
    fn distance(&self, a: ArrayView1<f32>, b: ArrayView1<f32>) -> StrataResult<f32> {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_cosine_distance() {
        let v1 = arr1(&[1.0, 2.0, 3.0]);
        let v2 = arr1(&[1.0, 2.0, 3.0]);
        let v3 = arr1(&[-1.0, -2.0, -3.0]);
        let v4 = arr1(&[2.0, 4.0, 6.0]);
        let v5 = arr1(&[1.0, 0.0, 0.0]);
        let v6 = arr1(&[0.0, 1.0, 0.0]);

        // Identical and parallel vectors are at distance 0.
        assert!(
            calculate_distance(DistanceMetric::Cosine, v1.view(), v2.view())
                .unwrap()
                .abs()
                < 1e-6
        );
        assert!(
            calculate_distance(DistanceMetric::Cosine, v1.view(), v4.view())
                .unwrap()
                .abs()
                < 1e-6
        );
        // Opposite vectors are at distance 2, orthogonal at 1.
        assert!(
            (calculate_distance(DistanceMetric::Cosine, v1.view(), v3.view()).unwrap() - 2.0)
                .abs()
                < 1e-6
        );
        assert!(
            (calculate_distance(DistanceMetric::Cosine, v5.view(), v6.view()).unwrap() - 1.0)
                .abs()
                < 1e-6
        );
    }

    #[test]
    fn test_cosine_distance_zero_vector_is_nan() {
        let v = arr1(&[1.0, 2.0, 3.0]);
        let zero = arr1(&[0.0, 0.0, 0.0]);
        let d = calculate_distance(DistanceMetric::Cosine, v.view(), zero.view()).unwrap();
        assert!(d.is_nan());
    }

    #[test]
    fn test_euclidean_distance() {
        let v1 = arr1(&[1.0, 2.0, 3.0]);
        let v2 = arr1(&[1.0, 2.0, 3.0]);
        let v3 = arr1(&[4.0, 6.0, 8.0]); // Diff: [3, 4, 5]
        let zero = arr1(&[0.0, 0.0, 0.0]);

        assert!(
            calculate_distance(DistanceMetric::Euclidean, v1.view(), v2.view())
                .unwrap()
                .abs()
                < 1e-6
        );
        assert!(
            (calculate_distance(DistanceMetric::Euclidean, v1.view(), v3.view()).unwrap()
                - 50.0f32.sqrt())
            .abs()
                < 1e-6
        );
        assert!(
            (calculate_distance(DistanceMetric::Euclidean, v1.view(), zero.view()).unwrap()
                - 14.0f32.sqrt())
            .abs()
                < 1e-6
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let v1 = arr1(&[1.0, 2.0]);
        let v2 = arr1(&[1.0, 2.0, 3.0]);

        assert!(matches!(
            calculate_distance(DistanceMetric::Cosine, v1.view(), v2.view()),
            Err(StrataError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert!(matches!(
            calculate_distance(DistanceMetric::Euclidean, v1.view(), v2.view()),
            Err(StrataError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_function_as_distance() {
        fn manhattan(a: ArrayView1<f32>, b: ArrayView1<f32>) -> StrataResult<f32> {
            Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum())
        }
        let v1 = arr1(&[1.0, 2.0]);
        let v2 = arr1(&[4.0, 0.0]);
        assert!((manhattan.distance(v1.view(), v2.view()).unwrap() - 5.0).abs() < 1e-6);
    }
}
