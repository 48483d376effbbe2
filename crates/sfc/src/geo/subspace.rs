//! Affine subspace helper: tracks affine independence and produces an
//! orthogonal direction to a hyperplane.
//!
//! Realized with `nalgebra`'s SVD as the rank-revealing tool for "is this
//! linear map degenerate".

use nalgebra::{DMatrix, DVector};

pub(crate) struct AffineSubspace {
    anchor: DVector<f64>,
    directions: Vec<DVector<f64>>,
}

impl AffineSubspace {
    pub fn new(anchor: DVector<f64>) -> Self {
        AffineSubspace {
            anchor,
            directions: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.directions.len()
    }

    /// Projects `v - anchor` orthogonal to the current span; if a
    /// non-negligible (> `eps`) residual remains, normalizes and appends it
    /// as a new basis direction and returns `true`. Otherwise `v` is
    /// affinely dependent on the points already added and `false` is
    /// returned.
    pub fn try_add_independent(&mut self, v: &DVector<f64>, eps: f64) -> bool {
        let mut w = v - &self.anchor;
        for d in &self.directions {
            let coeff = d.dot(&w);
            w -= d * coeff;
        }
        let norm = w.norm();
        if norm <= eps {
            return false;
        }
        w /= norm;
        self.directions.push(w);
        true
    }

    /// A unit vector orthogonal to every direction currently in the
    /// subspace. Meaningful for QuickHull's use when `dim() == ambient_dim -
    /// 1` (a hyperplane through the anchor has a 1-dimensional orthogonal
    /// complement).
    pub fn orthogonal_vector(&self, ambient_dim: usize) -> DVector<f64> {
        if self.directions.is_empty() {
            let mut e = DVector::zeros(ambient_dim);
            e[0] = 1.0;
            return e;
        }
        let rows = self.directions.len();
        let mut m = DMatrix::zeros(rows, ambient_dim);
        for (i, d) in self.directions.iter().enumerate() {
            m.row_mut(i).copy_from(&d.transpose());
        }
        let svd = m.svd(true, true);
        let v_t = svd.v_t.expect("svd right-singular vectors");
        v_t.row(v_t.nrows() - 1).transpose().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthogonal_to_axis_aligned_plane() {
        let mut s = AffineSubspace::new(DVector::from_vec(vec![0.0, 0.0, 0.0]));
        assert!(s.try_add_independent(&DVector::from_vec(vec![1.0, 0.0, 0.0]), 1e-9));
        assert!(s.try_add_independent(&DVector::from_vec(vec![0.0, 1.0, 0.0]), 1e-9));
        assert!(!s.try_add_independent(&DVector::from_vec(vec![2.0, 3.0, 0.0]), 1e-9));
        let n = s.orthogonal_vector(3);
        assert!(n[2].abs() > 0.999);
    }
}
