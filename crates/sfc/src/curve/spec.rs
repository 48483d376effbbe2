//! Curve specifications: a root polytope, a per-state child grammar, and
//! per-`(state, child)` transition matrices mapping root-vertex affine
//! combinations to the child's vertices.
//!
//! The k^d-tree family (Peano, Hilbert, Morton) is built through the
//! private [`super::kd`] module; the remaining factories (`sierpinski`,
//! `custom_triangle`, `gosper`, `beta_omega`) build their grammar and
//! transition matrices directly.

use nalgebra::DMatrix;

use crate::error::SfcError;

use super::kd;

/// A curve specified as a geometric production system: a root polytope
/// (`root_points`, one column per vertex), a grammar mapping `(state,
/// child slot)` to the child's state, and transition matrices giving each
/// child's vertices as affine combinations of the parent's.
#[derive(Debug, Clone)]
pub struct CurveSpecification {
    pub d: usize,
    pub root_points: DMatrix<f64>,
    pub grammar: Vec<Vec<usize>>,
    pub transition_mats: Vec<Vec<DMatrix<f64>>>,
}

impl CurveSpecification {
    /// Branching factor `b`: number of children per state.
    pub fn num_children(&self) -> usize {
        self.grammar[0].len()
    }

    pub fn num_states(&self) -> usize {
        self.grammar.len()
    }

    pub fn num_root_vertices(&self) -> usize {
        self.root_points.ncols()
    }

    /// Computes the `j`-th child's vertex matrix under state `state`, as
    /// `root_points * transition_mats[state][j]`.
    pub fn child_points(&self, state: usize, j: usize) -> DMatrix<f64> {
        &self.root_points * &self.transition_mats[state][j]
    }

    /// Checks that the grammar and transition-matrix tables agree in shape:
    /// every grammar row has `num_children()` entries and points at a valid
    /// state, and every transition matrix is square with as many rows as
    /// `root_points` has columns.
    pub fn validate(&self) -> Result<(), SfcError> {
        let b = self.num_children();
        let n = self.num_states();
        let num_vertices = self.root_points.ncols();

        if self.grammar.is_empty() {
            return Err(SfcError::SpecShape("grammar has no states".to_string()));
        }
        for (state, row) in self.grammar.iter().enumerate() {
            if row.len() != b {
                return Err(SfcError::SpecShape(format!(
                    "grammar row {state} has {} children, expected {b}",
                    row.len()
                )));
            }
            for &child_state in row {
                if child_state >= n {
                    return Err(SfcError::SpecShape(format!(
                        "grammar row {state} references out-of-range child state {child_state}"
                    )));
                }
            }
        }

        if self.transition_mats.len() != n {
            return Err(SfcError::SpecShape(format!(
                "transition_mats has {} states, grammar has {n}",
                self.transition_mats.len()
            )));
        }
        for (state, row) in self.transition_mats.iter().enumerate() {
            if row.len() != b {
                return Err(SfcError::SpecShape(format!(
                    "transition_mats row {state} has {} matrices, expected {b}",
                    row.len()
                )));
            }
            for (j, m) in row.iter().enumerate() {
                if m.nrows() != num_vertices {
                    return Err(SfcError::SpecShape(format!(
                        "transition_mats[{state}][{j}] has {} rows, root polytope has {num_vertices} vertices",
                        m.nrows()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Local model of a (possibly higher-dimensional) Sierpinski curve:
    /// recursive simplex bisection. For `d > 2` the limit curve is
    /// apparently continuous but the simplices degenerate with level.
    pub fn sierpinski(d: usize) -> CurveSpecification {
        assert!(d >= 2, "sierpinski curve needs d >= 2");

        let mut root_points = DMatrix::zeros(d, d + 1);
        for i in 0..d {
            root_points[(i, i)] = 1.0;
        }

        let grammar = vec![vec![0usize, 0usize]];

        let mut first = DMatrix::zeros(d + 1, d + 1);
        first[(0, d)] = 0.5;
        first[(1, d)] = 0.5;
        for dim in (2..d).rev() {
            first[(dim + 1, dim)] = 1.0;
        }

        let mut second = first.clone();

        first[(0, 0)] = 1.0;
        first[(2, 1)] = 1.0;
        second[(2, 0)] = 1.0;
        second[(1, 1)] = 1.0;

        CurveSpecification {
            d,
            root_points,
            grammar,
            transition_mats: vec![vec![first, second]],
        }
    }

    /// A curve on an equilateral triangle whose limit curve is not
    /// continuous — kept as a named example of a pathological
    /// specification for negative test cases.
    pub fn custom_triangle() -> CurveSpecification {
        let root_points = DMatrix::from_column_slice(2, 3, &[0.0, 0.0, 1.0, 0.0, 0.5, 0.5 * 3f64.sqrt()]);

        let grammar = vec![vec![0usize, 0usize, 0usize]];

        let c = 1.0 / 3.0;
        #[rustfmt::skip]
        let m1 = DMatrix::from_row_slice(3, 3, &[
            0.0, 1.0, c,
            1.0, 0.0, c,
            0.0, 0.0, c,
        ]);
        #[rustfmt::skip]
        let m2 = DMatrix::from_row_slice(3, 3, &[
            c, 0.0, 0.0,
            c, 1.0, 0.0,
            c, 0.0, 1.0,
        ]);
        #[rustfmt::skip]
        let m3 = DMatrix::from_row_slice(3, 3, &[
            0.0, c, 1.0,
            0.0, c, 0.0,
            1.0, c, 0.0,
        ]);

        CurveSpecification {
            d: 2,
            root_points,
            grammar,
            transition_mats: vec![vec![m1, m2, m3]],
        }
    }

    /// Semi-local model of the Gosper curve on a hexagonal root polytope.
    /// The refined hexagonal grid's affine-combination vectors (`p[0..23]`)
    /// are derived here at construction time via the inverse of an explicit
    /// "inner hexagon in outer-hexagon coordinates" matrix, rather than
    /// hand-frozen into literal constants, since that inversion is exactly
    /// the part that's easy to get subtly wrong transcribing by hand (see
    /// DESIGN.md).
    pub fn gosper() -> CurveSpecification {
        let sidelength = 0.5;
        let dx = sidelength / 2.0;
        let dy = 3f64.sqrt() * dx;
        #[rustfmt::skip]
        let root_points = DMatrix::from_row_slice(2, 6, &[
            -dx, dx, sidelength, dx, -dx, -sidelength,
            -dy, -dy, 0.0, dy, dy, 0.0,
        ]);

        #[rustfmt::skip]
        let transposed_inner_to_outer = DMatrix::from_row_slice(6, 6, &[
            0.0, 0.0, 0.0, -1.0, 0.0, 2.0,
            2.0, 0.0, 0.0, 0.0, -1.0, 0.0,
            0.0, 2.0, 0.0, 0.0, 0.0, -1.0,
            -1.0, 0.0, 2.0, 0.0, 0.0, 0.0,
            0.0, -1.0, 0.0, 2.0, 0.0, 0.0,
            0.0, 0.0, -1.0, 0.0, 2.0, 0.0,
        ]);
        let outer_to_inner = transposed_inner_to_outer
            .transpose()
            .try_inverse()
            .expect("gosper inner/outer change of basis is invertible");

        let c: Vec<_> = (0..6).map(|i| outer_to_inner.column(i).into_owned()).collect();

        let mut p = vec![nalgebra::DVector::<f64>::zeros(6); 24];
        p[0] = &c[5] + &c[0] - &c[3];
        p[1] = &c[1] + &c[0] - &c[3];
        p[2] = 2.0 * &c[5] - &c[3];
        p[3] = &c[0] + &c[1] - &c[2];
        p[4] = 2.0 * &c[1] - &c[3];
        p[5] = &c[5] + &c[4] - &c[3];
        p[6] = c[0].clone();
        p[7] = &c[1] + &c[2] - &c[3];
        p[8] = 2.0 * &c[5] - &c[1];
        p[9] = c[5].clone();
        p[10] = c[1].clone();
        p[11] = 2.0 * &c[1] - &c[5];
        p[12] = 2.0 * &c[4] - &c[2];
        p[13] = c[4].clone();
        p[14] = c[2].clone();
        p[15] = 2.0 * &c[2] - &c[4];
        p[16] = &c[3] + &c[5] - &c[1];
        p[17] = c[3].clone();
        p[18] = &c[3] + &c[1] - &c[5];
        p[19] = &c[3] + &c[4] - &c[1];
        p[20] = &c[3] + &c[4] - &c[5];
        p[21] = &c[3] + &c[2] - &c[5];
        p[22] = 2.0 * &c[3] - &c[1];
        p[23] = 2.0 * &c[3] - &c[5];

        let col = |idxs: [usize; 6]| {
            let mut m = DMatrix::zeros(6, 6);
            for (col, &idx) in idxs.iter().enumerate() {
                m.column_mut(col).copy_from(&p[idx]);
            }
            m
        };

        let first = vec![
            col([2, 0, 3, 6, 9, 5]),
            col([3, 1, 4, 7, 10, 6]),
            col([10, 14, 17, 13, 9, 6]),
            col([9, 13, 16, 12, 8, 5]),
            col([16, 13, 17, 20, 22, 19]),
            col([17, 14, 18, 21, 23, 20]),
            col([18, 14, 10, 7, 11, 15]),
        ];
        let second = vec![
            col([2, 0, 3, 6, 9, 5]),
            col([3, 1, 4, 7, 10, 6]),
            col([10, 7, 11, 15, 18, 14]),
            col([18, 21, 23, 20, 17, 14]),
            col([17, 13, 9, 6, 10, 14]),
            col([9, 13, 16, 12, 8, 5]),
            col([16, 13, 17, 20, 22, 19]),
        ];

        CurveSpecification {
            d: 2,
            root_points,
            grammar: vec![
                vec![0, 1, 1, 0, 0, 0, 1],
                vec![0, 1, 1, 1, 0, 0, 1],
            ],
            transition_mats: vec![first, second],
        }
    }

    /// Semi-local model of the beta-Omega curve on the unit square.
    pub fn beta_omega() -> CurveSpecification {
        let root_points = kd::generate_unit_cube(2);

        let p: Vec<nalgebra::DVector<f64>> = [
            [1.0, 0.0, 0.0, 0.0],
            [0.5, 0.5, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.5, 0.0, 0.5, 0.0],
            [0.5, 0.0, 0.0, 0.5],
            [0.0, 0.5, 0.0, 0.5],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.5, 0.5],
            [0.0, 0.0, 0.0, 1.0],
        ]
        .into_iter()
        .map(|row| nalgebra::DVector::from_vec(row.to_vec()))
        .collect();

        let col = |idxs: [usize; 4]| {
            let mut m = DMatrix::zeros(4, 4);
            for (col, &idx) in idxs.iter().enumerate() {
                m.column_mut(col).copy_from(&p[idx]);
            }
            m
        };

        let grammar = vec![
            vec![1, 3, 1, 3],
            vec![2, 1, 3, 5],
            vec![1, 2, 4, 6],
            vec![5, 1, 3, 4],
            vec![6, 2, 4, 3],
            vec![2, 1, 3, 4],
            vec![1, 2, 4, 3],
        ];

        let transition_mats = vec![
            vec![col([4, 3, 1, 0]), col([4, 7, 3, 6]), col([4, 5, 7, 8]), col([4, 1, 5, 2])],
            vec![col([0, 1, 3, 4]), col([4, 7, 3, 6]), col([4, 5, 7, 8]), col([4, 1, 5, 2])],
            vec![col([3, 4, 6, 7]), col([3, 0, 4, 1]), col([1, 2, 4, 5]), col([5, 8, 4, 7])],
            vec![col([3, 4, 6, 7]), col([4, 5, 7, 8]), col([4, 1, 5, 2]), col([4, 3, 1, 0])],
            vec![col([0, 1, 3, 4]), col([1, 2, 4, 5]), col([5, 8, 4, 7]), col([7, 6, 4, 3])],
            vec![col([0, 1, 3, 4]), col([4, 7, 3, 6]), col([4, 5, 7, 8]), col([4, 1, 5, 2])],
            vec![col([3, 4, 6, 7]), col([3, 0, 4, 1]), col([1, 2, 4, 5]), col([5, 8, 4, 7])],
        ];

        CurveSpecification {
            d: 2,
            root_points,
            grammar,
            transition_mats,
        }
    }

    /// Generic Peano curve, arbitrary dimension, `k` cells per row (`k`
    /// odd, `>= 3`).
    pub fn peano(d: usize, k: usize) -> CurveSpecification {
        kd::peano_kd(d, k).into_curve_specification()
    }

    /// Generic Hilbert curve, arbitrary dimension.
    pub fn hilbert(d: usize) -> CurveSpecification {
        kd::hilbert_kd(d).into_curve_specification()
    }

    /// Row-major (Morton / Z-order) curve, arbitrary dimension and
    /// sub-cube count `k`.
    pub fn morton(d: usize, k: usize) -> CurveSpecification {
        kd::morton_kd(d, k).into_curve_specification()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sierpinski_2d_is_one_state_two_children() {
        let spec = CurveSpecification::sierpinski(2);
        assert_eq!(spec.num_states(), 1);
        assert_eq!(spec.num_children(), 2);
        spec.validate().unwrap();
    }

    #[test]
    fn hilbert_2d_matches_kd_grammar_size() {
        let spec = CurveSpecification::hilbert(2);
        assert_eq!(spec.num_children(), 4);
        spec.validate().unwrap();
    }

    #[test]
    fn peano_2d_level1_pos4_has_nine_children() {
        let spec = CurveSpecification::peano(2, 3);
        assert_eq!(spec.num_children(), 9);
        spec.validate().unwrap();
    }

    #[test]
    fn morton_2d_identity_grammar() {
        let spec = CurveSpecification::morton(2, 2);
        assert_eq!(spec.grammar, vec![vec![0, 0, 0, 0]]);
        spec.validate().unwrap();
    }

    #[test]
    fn gosper_children_are_affine_combinations() {
        let spec = CurveSpecification::gosper();
        spec.validate().unwrap();
        for state in 0..spec.num_states() {
            for j in 0..spec.num_children() {
                let m = &spec.transition_mats[state][j];
                for c in 0..m.ncols() {
                    let sum: f64 = m.column(c).iter().sum();
                    assert!((sum - 1.0).abs() < 1e-9, "column {c} of [{state}][{j}] sums to {sum}");
                }
            }
        }
    }

    #[test]
    fn beta_omega_children_are_affine_combinations() {
        let spec = CurveSpecification::beta_omega();
        spec.validate().unwrap();
        for state in 0..spec.num_states() {
            for j in 0..spec.num_children() {
                let m = &spec.transition_mats[state][j];
                for c in 0..m.ncols() {
                    let sum: f64 = m.column(c).iter().sum();
                    assert!((sum - 1.0).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn custom_triangle_is_degenerate_but_shape_valid() {
        let spec = CurveSpecification::custom_triangle();
        spec.validate().unwrap();
    }
}
