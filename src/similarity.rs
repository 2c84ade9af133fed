//! Cosine similarity between embedding vectors.
//!
//! ```text
//!            a · b
//! cos(θ) = ─────────
//!          ‖a‖ × ‖b‖
//! ```
//!
//! The result lies in `[-1.0, 1.0]`. A zero-magnitude input scores exactly
//! `0.0` instead of producing NaN. Inputs of different lengths are an error
//! ([`SimilarityError::DimensionMismatch`]); callers that compare against a
//! live corpus log it and treat the pair as not similar.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    DimensionMismatch { left: usize, right: usize },
}

impl fmt::Display for SimilarityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityError::DimensionMismatch { left, right } => {
                write!(f, "embedding dimension mismatch: {left} vs {right}")
            }
        }
    }
}

impl std::error::Error for SimilarityError {}

/// Compute cosine similarity between two vectors of equal length.
///
/// Accumulates in `f64` so long embeddings (1536+ dims) do not lose
/// precision, then narrows the result back to `f32`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(sim.clamp(-1.0, 1.0) as f32)
}
