use serde::{Deserialize, Serialize};

/// Upper bound of [`Vector::cosine_distance`]
pub const MAX_COSINE_DISTANCE: f32 = 2.0;

/// A fixed-length embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        norm(&self.data)
    }

    /// Cosine similarity in [-1, 1].
    ///
    /// A zero-length vector has no direction; it is treated as orthogonal to
    /// everything (similarity 0).
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (dot_product(&self.data, &other.data) / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    /// `1 - cosine_similarity`, clamped to [0, 2]
    #[inline]
    pub fn cosine_distance(&self, other: &Vector) -> f32 {
        (1.0 - self.cosine_similarity(other)).clamp(0.0, MAX_COSINE_DISTANCE)
    }

    /// Normalize the vector to unit length
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// Dot product with a fixed accumulation order.
///
/// Accumulates in f64 over chunks of four so the same inputs always give the
/// same bits, whichever thread computes them.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut acc0 = 0.0f64;
    let mut acc1 = 0.0f64;

    let chunks = a.chunks_exact(4);
    let remainder = chunks.remainder().len();
    for (x, y) in chunks.zip(b.chunks_exact(4)) {
        acc0 += f64::from(x[0]) * f64::from(y[0]) + f64::from(x[1]) * f64::from(y[1]);
        acc1 += f64::from(x[2]) * f64::from(y[2]) + f64::from(x[3]) * f64::from(y[3]);
    }
    for i in (a.len() - remainder)..a.len() {
        acc0 += f64::from(a[i]) * f64::from(b[i]);
    }

    (acc0 + acc1) as f32
}

#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}
