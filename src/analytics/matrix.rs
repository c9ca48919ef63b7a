//! Labeled similarity matrices.

use serde::Serialize;
use std::collections::HashMap;

/// A square matrix of similarity scores with an ordered label list:
/// `matrix[i][j]` is the similarity between `labels[i]` and `labels[j]`.
/// Symmetric by construction; the diagonal holds self-similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledMatrix<L> {
    labels: Vec<L>,
    matrix: Vec<Vec<f64>>,
}

impl<L> LabeledMatrix<L> {
    /// Build a labeled matrix. `matrix` must be square with one row per label.
    pub fn new(labels: Vec<L>, matrix: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(labels.len(), matrix.len());
        debug_assert!(matrix.iter().all(|row| row.len() == labels.len()));
        Self { labels, matrix }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix[row][col]
    }
}

/// Cosine similarity between two sparse occurrence vectors. Vectors with no
/// shared keys, and degenerate zero-magnitude vectors, score 0.
pub fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(key, weight)| b.get(key).map(|other| weight * other))
        .sum();
    let magnitude_a = magnitude(a);
    let magnitude_b = magnitude(b);
    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }
    dot / (magnitude_a * magnitude_b)
}

fn magnitude(vector: &HashMap<String, f64>) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}
