
use crate::{FileVectorError, Result};

/// Euclidean length of `vector`, accumulated in f64
#[inline]
pub fn l2_norm(vector: &[f32]) -> f32 {
    l2_norm_f64(vector) as f32
}

fn l2_norm_f64(vector: &[f32]) -> f64 {
    vector
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Scale `vector` to unit length.
///
/// Fails with [`FileVectorError::DegenerateVector`] when the norm is zero or
/// not finite, so no NaN components are ever produced.
#[inline]
pub fn normalize(vector: &[f32]) -> Result<Vec<f32>> {
    let norm = l2_norm_f64(vector);
    if !norm.is_finite() || norm == 0.0 {
        return Err(FileVectorError::DegenerateVector { norm: norm as f32 });
    }

    Ok(vector
        .iter()
        .map(|&x| (f64::from(x) / norm) as f32)
        .collect())
}

/// Cosine of the angle between two vectors.
///
/// Returns `None` for empty vectors, mismatched lengths, or a zero-length operand.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }

    Some((dot / denom) as f32)
}
