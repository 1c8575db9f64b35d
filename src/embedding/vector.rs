//! Embedding vectors and the random fallback generator.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A vector embedding representing text semantics.
///
/// The dimensionality depends on the model used (384 for MiniLM). Vectors
/// from [`random_vector`] may have any caller-chosen dimension, so two
/// embeddings are only comparable when their dimensions match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    /// The embedding vector.
    pub values: Vec<f32>,
}

impl Embedding {
    /// Creates a new embedding from a vector of values.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Returns the dimensionality of this embedding.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Euclidean length of the vector.
    pub fn l2_norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Returns a unit-length copy. Zero vectors are returned unchanged.
    pub fn normalized(&self) -> Self {
        let norm = self.l2_norm();
        if norm == 0.0 {
            return self.clone();
        }
        Self::new(self.values.iter().map(|x| x / norm).collect())
    }

    /// Computes cosine similarity with another embedding.
    ///
    /// Returns a value between -1.0 and 1.0, where 1.0 means identical.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }

        let dot: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum();

        let norm_a = self.l2_norm();
        let norm_b = other.l2_norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }

    /// Consumes the embedding, returning the raw values.
    pub fn into_inner(self) -> Vec<f32> {
        self.values
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Generates `dimension` independent uniform values in `[0, 1)`.
///
/// The result carries no meaning; it only keeps a query well-formed when no
/// model-derived vector is available.
pub fn random_vector(dimension: usize) -> Embedding {
    let mut rng = rand::thread_rng();
    Embedding::new((0..dimension).map(|_| rng.gen::<f32>()).collect())
}
