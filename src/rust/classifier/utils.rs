use ndarray::Array1;

/// A sparse feature row with strictly increasing column indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Builds a vector from `(column, value)` pairs; duplicate columns are summed
    /// and zeros dropped.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, f32)>) -> Self {
        pairs.sort_unstable_by_key(|&(i, _)| i);
        let mut indices = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (i, v) in pairs {
            debug_assert!(i < dim, "column {} out of bounds for dimension {}", i, dim);
            if indices.last() == Some(&i) {
                if let Some(last) = values.last_mut() {
                    *last += v;
                }
            } else {
                indices.push(i);
                values.push(v);
            }
        }
        let mut vector = Self { dim, indices, values };
        vector.drop_zeros();
        vector
    }

    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            ..Self::default()
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn squared_norm(&self) -> f32 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// `self · dense`
    pub fn dot(&self, dense: &Array1<f32>) -> f32 {
        self.iter().map(|(i, v)| v * dense[i]).sum()
    }

    /// `dense += alpha * self`
    pub fn scaled_add_to(&self, alpha: f32, dense: &mut Array1<f32>) {
        for (i, v) in self.iter() {
            dense[i] += alpha * v;
        }
    }

    /// Scales the vector to unit L2 norm; the zero vector is left untouched.
    pub fn normalize(&mut self) {
        let norm = self.squared_norm().sqrt();
        if norm > 1e-10 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    fn drop_zeros(&mut self) {
        if self.values.iter().all(|&v| v != 0.0) {
            return;
        }
        let (indices, values): (Vec<usize>, Vec<f32>) = self
            .iter()
            .filter(|&(_, v)| v != 0.0)
            .unzip();
        self.indices = indices;
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = SparseVector::from_pairs(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (4, 0.0)]);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(1, 2.0), (3, 1.5)]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.dim(), 5);
    }

    #[test]
    fn test_dot_and_axpy() {
        let v = SparseVector::from_pairs(3, vec![(0, 1.0), (2, 2.0)]);
        let mut w = array![0.5, 10.0, 0.25];
        assert_eq!(v.dot(&w), 1.0);
        v.scaled_add_to(2.0, &mut w);
        assert_eq!(w, array![2.5, 10.0, 4.25]);
    }

    #[test]
    fn test_normalize() {
        let mut v = SparseVector::from_pairs(2, vec![(0, 3.0), (1, 4.0)]);
        v.normalize();
        assert!((v.squared_norm() - 1.0).abs() < 1e-6);

        let mut zero = SparseVector::zeros(2);
        zero.normalize();
        assert_eq!(zero.nnz(), 0);
    }
}
