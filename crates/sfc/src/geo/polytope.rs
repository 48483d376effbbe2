//! The exported combinatorial face lattice.
//!
//! A vector of vectors of `Face`, one inner vector per dimension 0..=d,
//! with linear `find_face` lookup and a canonical `sort`.

use nalgebra::DMatrix;

use crate::config::HullCfg;
use crate::error::SfcError;
use crate::natset::NatSet;

#[derive(Debug, Clone)]
pub struct Face {
    pub dim: usize,
    pub vertices: NatSet,
    pub parent_indexes: Vec<usize>,
    pub child_indexes: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ConvexPolytope {
    pub(crate) faces: Vec<Vec<Face>>,
}

impl ConvexPolytope {
    pub fn new(d: usize) -> Self {
        ConvexPolytope {
            faces: vec![Vec::new(); d + 1],
        }
    }

    pub fn dimension(&self) -> usize {
        self.faces.len() - 1
    }

    pub fn faces_at(&self, dim: usize) -> &[Face] {
        &self.faces[dim]
    }

    /// Linear scan for a face with exactly this vertex set.
    pub fn find_face(&self, dim: usize, vertex_set: &NatSet) -> Option<usize> {
        self.faces[dim].iter().position(|f| &f.vertices == vertex_set)
    }

    /// Canonicalizes face order within each dimension so that two polytopes
    /// built from the same vertex set under different input permutations
    /// compare equal. Faces are keyed by `min(v, v.reverse_at(bound))`
    /// (bound = the number of vertices minus one), which is invariant to the
    /// arbitrary "which side is which" choice QuickHull makes while
    /// sweeping; parent/child index lists are rewritten to match.
    pub fn sort(&mut self) {
        let bound = if self.faces[0].is_empty() {
            0
        } else {
            self.faces[0].len() as u32 - 1
        };

        for dim in 0..self.faces.len() {
            let n = self.faces[dim].len();
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| {
                let ka = canonical_key(&self.faces[dim][a].vertices, bound);
                let kb = canonical_key(&self.faces[dim][b].vertices, bound);
                ka.compare(&kb)
                    .then_with(|| self.faces[dim][a].vertices.compare(&self.faces[dim][b].vertices))
            });

            let mut old_to_new = vec![0usize; n];
            for (new_idx, &old_idx) in order.iter().enumerate() {
                old_to_new[old_idx] = new_idx;
            }

            let old_faces = std::mem::take(&mut self.faces[dim]);
            let mut new_faces: Vec<Option<Face>> = (0..n).map(|_| None).collect();
            for (old_idx, face) in old_faces.into_iter().enumerate() {
                new_faces[old_to_new[old_idx]] = Some(face);
            }
            self.faces[dim] = new_faces.into_iter().map(|f| f.unwrap()).collect();

            self.remap_links(dim, &old_to_new);
        }
    }

    /// Computes the convex hull of `points` (one vertex candidate per
    /// column) and returns its full face lattice, sorted canonically. Thin
    /// wrapper over [`crate::geo::quickhull::quickhull`], kept here so
    /// callers reach the algorithm through `ConvexPolytope` rather than the
    /// free function directly.
    pub fn convex_hull(points: &DMatrix<f64>, cfg: HullCfg) -> Result<Self, SfcError> {
        super::quickhull::quickhull(points, cfg)
    }

    fn remap_links(&mut self, dim: usize, old_to_new: &[usize]) {
        if dim + 1 < self.faces.len() {
            // faces at dim+1 might reference children at `dim`.
        }
        // The face list at `dim` was just reordered; fix up references
        // that other dimensions hold *into* dim.
        if dim > 0 {
            for f in self.faces[dim - 1].iter_mut() {
                for p in f.parent_indexes.iter_mut() {
                    *p = old_to_new[*p];
                }
            }
        }
        if dim + 1 < self.faces.len() {
            for f in self.faces[dim + 1].iter_mut() {
                for c in f.child_indexes.iter_mut() {
                    *c = old_to_new[*c];
                }
            }
        }
    }
}

fn canonical_key(v: &NatSet, bound: u32) -> NatSet {
    let r = v.reverse_at(bound);
    if v.compare(&r) == std::cmp::Ordering::Less {
        v.clone()
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sizes_faces_to_d_plus_one() {
        let p = ConvexPolytope::new(3);
        assert_eq!(p.faces.len(), 4);
    }

    #[test]
    fn find_face_matches_by_vertex_set() {
        let mut p = ConvexPolytope::new(2);
        p.faces[1].push(Face {
            dim: 1,
            vertices: NatSet::from_iter([0, 1]),
            parent_indexes: vec![],
            child_indexes: vec![],
        });
        assert_eq!(p.find_face(1, &NatSet::from_iter([1, 0])), Some(0));
        assert_eq!(p.find_face(1, &NatSet::from_iter([0, 2])), None);
    }
}
