//! Internal k^d-tree curve builder.
//!
//! A smaller, more regular specification (grammar + a per-grammar-element
//! child ordering over a `k^d` grid of sub-cubes) that gets expanded into a
//! full [`super::spec::CurveSpecification`] via a tensor-product transition
//! matrix. Kept private — only the named factories on `CurveSpecification`
//! are public.

use nalgebra::DMatrix;

use super::spec::CurveSpecification;

pub(super) struct KdCurveSpecification {
    k: usize,
    d: usize,
    grammar: Vec<Vec<usize>>,
    child_ordering: Vec<Vec<usize>>,
}

/// `k^d`-cube unit root points, one column per cube corner, corner `i`'s
/// coordinates given by the bits of `i`.
pub(super) fn generate_unit_cube(dim: usize) -> DMatrix<f64> {
    let num_edges = 1usize << dim;
    let mut result = DMatrix::zeros(dim, num_edges);
    for point_idx in 0..num_edges {
        for d in 0..dim {
            result[(d, point_idx)] = ((point_idx >> d) & 1) as f64;
        }
    }
    result
}

impl KdCurveSpecification {
    fn new(k: usize, d: usize, num_grammar_elements: usize) -> Self {
        let num_children = k.pow(d as u32);
        KdCurveSpecification {
            k,
            d,
            grammar: vec![vec![0; num_children]; num_grammar_elements],
            child_ordering: vec![vec![0; num_children]; num_grammar_elements],
        }
    }

    /// Global model: one transition matrix per grammar element, keyed by the
    /// grammar's own child order (no renumbering to a "local" corner frame).
    pub(super) fn into_curve_specification(self) -> CurveSpecification {
        let num_children = self.k.pow(self.d as u32);
        let num_edges = 1usize << self.d;
        let k_inv = 1.0 / self.k as f64;

        let mut transition_mats = Vec::with_capacity(self.grammar.len());
        for (grammar_element, ordering) in self.child_ordering.iter().enumerate() {
            let mut vec = Vec::with_capacity(num_children);
            for &reduced_index_original in ordering.iter() {
                let mut matrix = DMatrix::from_element(num_edges, num_edges, 1.0);
                let mut reduced_index = reduced_index_original;
                for dim in 0..self.d {
                    let remainder = reduced_index % self.k;
                    reduced_index /= self.k;
                    for edge in 0..num_edges {
                        let offset = remainder + ((edge >> dim) & 1);
                        let coordinate = offset as f64 * k_inv;
                        for source_edge in 0..num_edges {
                            let factor = if (source_edge >> dim) & 1 == 1 {
                                coordinate
                            } else {
                                1.0 - coordinate
                            };
                            matrix[(source_edge, edge)] *= factor;
                        }
                    }
                }
                vec.push(matrix);
            }
            let _ = grammar_element;
            transition_mats.push(vec);
        }

        CurveSpecification {
            d: self.d,
            root_points: generate_unit_cube(self.d),
            grammar: self.grammar,
            transition_mats,
        }
    }
}

/// Tracks, per dimension, whether the Peano curve's traversal order is
/// flipped at the current k-ary digit.
#[derive(Clone)]
struct Orientation {
    data: Vec<bool>,
}

impl Orientation {
    fn new(d: usize) -> Self {
        Orientation { data: vec![false; d] }
    }

    fn with_binary(d: usize, binary: usize) -> Self {
        let mut o = Orientation::new(d);
        for dim in 0..d {
            if (binary >> dim) & 1 == 1 {
                o.data[dim] = true;
            }
        }
        o
    }

    fn flip_except(&mut self, dim: usize) {
        for (other_dim, flag) in self.data.iter_mut().enumerate() {
            if other_dim != dim {
                *flag = !*flag;
            }
        }
    }

    fn binary(&self) -> usize {
        let mut binary = 0usize;
        for (i, &flag) in self.data.iter().enumerate() {
            if flag {
                binary |= 1 << i;
            }
        }
        binary
    }
}

/// Generic Peano curve in `d` dimensions, `k` cells per row (`k` odd, >= 3).
pub(super) fn peano_kd(d: usize, k: usize) -> KdCurveSpecification {
    assert!(k % 2 == 1 && k >= 3, "peano requires odd k >= 3");
    let num_grammar_elements = 1usize << d;
    let num_children = k.pow(d as u32);
    let mut spec = KdCurveSpecification::new(k, d, num_grammar_elements);

    for grammar_element in 0..num_grammar_elements {
        for child in 0..num_children {
            let orientation = Orientation::with_binary(d, grammar_element);

            let mut ordered_child = 0usize;
            let mut power = k.pow((d - 1) as u32);
            let mut higher_dimensions_flip = false;

            for inv_dim in 0..d {
                let dim = d - 1 - inv_dim;
                let mut k_ary_digit = (child / power) % k;

                if orientation.data[dim] != higher_dimensions_flip {
                    k_ary_digit = k - 1 - k_ary_digit;
                }

                ordered_child += power * k_ary_digit;

                if k_ary_digit % 2 == 1 {
                    higher_dimensions_flip = !higher_dimensions_flip;
                }

                power /= k;
            }

            let mut orientation = orientation;
            let mut reduced_index = child;
            for dim in 0..d {
                let remainder = reduced_index % k;
                reduced_index /= k;
                if remainder % 2 == 1 {
                    orientation.flip_except(dim);
                }
            }

            spec.grammar[grammar_element][child] = orientation.binary();
            spec.child_ordering[grammar_element][child] = ordered_child;
        }
    }

    spec
}

#[derive(Clone, Copy)]
struct HilbertDirection {
    vertex: usize,
    dim: usize,
}

/// Generic Hilbert curve in `d` dimensions, discovered breadth-first:
/// grammar elements correspond to `(entry vertex, first travel dimension)`
/// pairs, reached by exploring sub-cube traversal orders starting from the
/// identity element.
pub(super) fn hilbert_kd(d: usize) -> KdCurveSpecification {
    let num_children = 1usize << d;

    let mut direction_to_grammar: Vec<Vec<Option<usize>>> = vec![vec![None; d]; num_children];
    let mut grammar_to_direction = vec![HilbertDirection { vertex: 0, dim: 0 }];
    direction_to_grammar[0][0] = Some(0);

    let mut grammar_rows: Vec<Vec<usize>> = Vec::new();
    let mut orderings: Vec<Vec<usize>> = Vec::new();

    let mut current_grammar_element = 0;
    while current_grammar_element < grammar_to_direction.len() {
        let current_direction = grammar_to_direction[current_grammar_element];
        let mut next_ordering = vec![current_direction.vertex];

        let mut next_dim = (current_direction.dim + 1) % d;
        next_ordering.push(current_direction.vertex ^ (1 << next_dim));

        let first_direction = HilbertDirection {
            vertex: current_direction.vertex,
            dim: next_dim,
        };
        let mut next_directions = vec![first_direction; 2];

        while next_dim != current_direction.dim {
            next_dim = (next_dim + 1) % d;

            let current_len = next_directions.len();
            for index in (0..current_len).rev() {
                let mut dir = next_directions[index];
                let bitmask = (1 << dir.dim) | (1 << next_dim);
                dir.vertex ^= bitmask;
                next_directions.push(dir);

                let mut ordering_index = next_ordering[index];
                ordering_index ^= 1 << next_dim;
                next_ordering.push(ordering_index);
            }

            let middle = next_directions.len() / 2;
            next_directions[middle].vertex ^= (1 << next_directions[middle].dim) | (1 << next_dim);
            next_directions[middle].dim = next_dim;
            next_directions[middle - 1].dim = next_dim;
        }

        let mut next_rule = vec![0usize; num_children];
        for i in 0..num_children {
            let dir = next_directions[i];
            let grammar_index = match direction_to_grammar[dir.vertex][dir.dim] {
                Some(idx) => idx,
                None => {
                    let idx = grammar_to_direction.len();
                    direction_to_grammar[dir.vertex][dir.dim] = Some(idx);
                    grammar_to_direction.push(dir);
                    idx
                }
            };
            next_rule[i] = grammar_index;
        }

        grammar_rows.push(next_rule);
        orderings.push(next_ordering);
        current_grammar_element += 1;
    }

    let mut spec = KdCurveSpecification::new(2, d, grammar_rows.len());
    spec.grammar = grammar_rows;
    spec.child_ordering = orderings;
    spec
}

/// Row-major (Morton / Z-order) traversal: a single grammar element, no
/// reordering of the natural `k^d` enumeration.
pub(super) fn morton_kd(d: usize, k: usize) -> KdCurveSpecification {
    let num_children = k.pow(d as u32);
    let mut spec = KdCurveSpecification::new(k, d, 1);
    spec.grammar[0] = vec![0; num_children];
    spec.child_ordering[0] = (0..num_children).collect();
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_corners() {
        let cube = generate_unit_cube(2);
        assert_eq!(cube.ncols(), 4);
        assert_eq!(cube.column(0), nalgebra::DVector::from_vec(vec![0.0, 0.0]));
        assert_eq!(cube.column(3), nalgebra::DVector::from_vec(vec![1.0, 1.0]));
    }

    #[test]
    fn hilbert_2d_has_four_grammar_elements() {
        let kd = hilbert_kd(2);
        assert_eq!(kd.grammar.len(), 4);
        assert_eq!(kd.grammar[0].len(), 4);
    }

    #[test]
    fn peano_2d_grammar_is_nine_children() {
        let kd = peano_kd(2, 3);
        assert_eq!(kd.grammar[0].len(), 9);
        assert_eq!(kd.grammar.len(), 4);
    }

    #[test]
    fn morton_is_identity_ordering() {
        let kd = morton_kd(2, 2);
        assert_eq!(kd.child_ordering[0], vec![0, 1, 2, 3]);
    }
}
