use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Type alias for the vector embedding representation.
/// Uses `ndarray::Array1<f32>` for efficient numerical operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Array1<f32>);

// Implement Deref to allow easy access to Array1 methods
impl std::ops::Deref for Embedding {
    type Target = Array1<f32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for Embedding {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

// Implement From<Vec<f32>> for convenience
impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Embedding(Array1::from(vec))
    }
}

impl From<&[f32]> for Embedding {
    fn from(slice: &[f32]) -> Self {
        Embedding(Array1::from(slice.to_vec()))
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(embedding: Embedding) -> Self {
        embedding.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_round_trip() {
        let raw = vec![1.0f32, -2.5, 0.0];
        let embedding: Embedding = raw.clone().into();
        assert_eq!(embedding.len(), 3);
        let back: Vec<f32> = embedding.into();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_deref_exposes_array_ops() {
        let embedding: Embedding = vec![3.0f32, 4.0].into();
        assert!((embedding.dot(&embedding.0) - 25.0).abs() < 1e-6);
    }
}
