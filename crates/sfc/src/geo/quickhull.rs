//! QuickHull in arbitrary dimension with full face-lattice output.
//!
//! Faces live in an arena of stable indices rather than a graph of raw
//! pointers: `arena: Vec<Option<FaceNode>>` indexed by `FaceId`, `None` once
//! a face is deleted. All cross-face links (`parents`, `children`,
//! `faces_to_connect`) are `HashSet<FaceId>` instead of pointer sets.
//!
//! The algorithm itself — `initialize_simplex`, `compute_neighbors`,
//! `add_point`, `prepare_connect`, the face-status algebra (KEEP / CONNECT /
//! REMOVE / EXTEND) — is this crate's hardest component, and its bookkeeping
//! (which counters get incremented on which traversal, in which order) is
//! exactly the part that's easy to get subtly wrong by "simplifying", so
//! it's kept close to the textbook incremental-hull algorithm rather than
//! restructured.

use std::collections::{HashMap, HashSet, VecDeque};

use nalgebra::{DMatrix, DVector};

use crate::config::HullCfg;
use crate::error::SfcError;
use crate::geo::polytope::{ConvexPolytope, Face};
use crate::geo::subspace::AffineSubspace;
use crate::natset::NatSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FaceId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaceStatus {
    Remove,
    Extend,
    Connect,
    Keep,
}

#[derive(Debug, Clone)]
struct FacetRecord {
    normal: DVector<f64>,
    offset: f64,
    outside_set: Vec<usize>,
}

#[derive(Debug, Clone)]
struct FaceNode {
    dim: usize,
    vertex_set: NatSet,
    parents: HashSet<FaceId>,
    children: HashSet<FaceId>,
    faces_to_connect: HashSet<FaceId>,
    /// Number of facets of the *current* hull this face is a face of.
    num_ancestor_facets: u32,
    /// Ancestor facets on the outside of the current point.
    p: u32,
    /// Ancestor facets the current point is coplanar with.
    z: u32,
    should_remove: bool,
    visited: bool,
    polytope_index: usize,
    facet: Option<FacetRecord>,
}

impl FaceNode {
    fn status(&self) -> FaceStatus {
        let n = self.num_ancestor_facets as i64 - self.p as i64 - self.z as i64;
        if n > 0 {
            if self.p > 0 {
                FaceStatus::Connect
            } else {
                FaceStatus::Keep
            }
        } else if self.p > 0 {
            FaceStatus::Remove
        } else {
            FaceStatus::Extend
        }
    }

    fn is_vertex(&self) -> bool {
        self.vertex_set.len() == 1
    }
}

struct QuickHull {
    vertices: Vec<DVector<f64>>,
    inner_point: DVector<f64>,
    dim: usize,
    eps: f64,
    arena: Vec<Option<FaceNode>>,
    vertex_faces: HashSet<FaceId>,
    facets: HashSet<FaceId>,
    unprocessed_facets: VecDeque<FaceId>,
    connect_faces: HashSet<FaceId>,
    new_connect_faces: HashSet<FaceId>,
}

impl QuickHull {
    fn node(&self, id: FaceId) -> &FaceNode {
        self.arena[id.0].as_ref().expect("face already deleted")
    }

    fn node_mut(&mut self, id: FaceId) -> &mut FaceNode {
        self.arena[id.0].as_mut().expect("face already deleted")
    }

    fn new_face(&mut self, dim: usize, vertex_set: NatSet) -> FaceId {
        let id = FaceId(self.arena.len());
        self.arena.push(Some(FaceNode {
            dim,
            vertex_set,
            parents: HashSet::new(),
            children: HashSet::new(),
            faces_to_connect: HashSet::new(),
            num_ancestor_facets: 0,
            p: 0,
            z: 0,
            should_remove: false,
            visited: false,
            polytope_index: 0,
            facet: None,
        }));
        id
    }

    fn signed_distance(&self, facet: FaceId, v: &DVector<f64>) -> f64 {
        let rec = self.node(facet).facet.as_ref().expect("not a facet");
        v.dot(&rec.normal) - rec.offset
    }

    fn distance_sign(&self, facet: FaceId, v: &DVector<f64>) -> i32 {
        let d = self.signed_distance(facet, v);
        if d > self.eps {
            1
        } else if d < -self.eps {
            -1
        } else {
            0
        }
    }

    fn set_facet_normal(&mut self, facet: FaceId, vertex_indices: &[usize]) {
        assert!(!vertex_indices.is_empty(), "facet has no vertices");
        let first_point = self.vertices[vertex_indices[0]].clone();
        let mut subspace = AffineSubspace::new(first_point.clone());
        for &idx in &vertex_indices[1..] {
            subspace.try_add_independent(&self.vertices[idx], self.eps);
        }
        let mut normal = subspace.orthogonal_vector(self.dim);
        if normal.dot(&(&first_point - &self.inner_point)) < 0.0 {
            normal = -normal;
        }
        let offset = normal.dot(&first_point);
        let rec = self.node_mut(facet).facet.as_mut().expect("not a facet");
        rec.normal = normal;
        rec.offset = offset;
    }

    /// DFS through `children`, flipping the `visited` flag of every face
    /// reachable from `start` to `visited_value` and collecting them in
    /// visit order. Decouples the traversal from the per-face effect: the
    /// caller applies effects over the returned ids, avoiding a recursive
    /// closure that would need to reborrow `self` mutably.
    fn collect_via_children(&mut self, start: FaceId, visited_value: bool) -> Vec<FaceId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.node(id).visited == visited_value {
                continue;
            }
            self.node_mut(id).visited = visited_value;
            result.push(id);
            let children: Vec<FaceId> = self.node(id).children.iter().copied().collect();
            stack.extend(children);
        }
        result
    }

    fn collect_via_parents(&mut self, start: FaceId, visited_value: bool) -> Vec<FaceId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.node(id).visited == visited_value {
                continue;
            }
            self.node_mut(id).visited = visited_value;
            result.push(id);
            let parents: Vec<FaceId> = self.node(id).parents.iter().copied().collect();
            stack.extend(parents);
        }
        result
    }

    /// Applies `func` once per face reached from each element of `starts`,
    /// independently — a face reachable from two different starts gets
    /// `func` applied twice. This is what makes `p` and `z` counts equal
    /// "number of ancestor facets with this property".
    fn visit_children_for_each(&mut self, starts: &[FaceId], mut func: impl FnMut(&mut Self, FaceId)) {
        for &start in starts {
            let ids = self.collect_via_children(start, true);
            for id in ids {
                func(self, id);
            }
            self.collect_via_children(start, false);
        }
    }

    /// Applies `func` exactly once per face in the union of faces reachable
    /// from `starts`.
    fn visit_children_once(&mut self, starts: &[FaceId], mut func: impl FnMut(&mut Self, FaceId)) {
        let mut all_ids = Vec::new();
        for &start in starts {
            all_ids.extend(self.collect_via_children(start, true));
        }
        for &id in &all_ids {
            func(self, id);
        }
        for &start in starts {
            self.collect_via_parents_noop(start);
        }
    }

    /// Resets the `visited` flag set by `collect_via_children(start, true)`
    /// without re-collecting ids; used by `visit_children_once`'s second
    /// sweep.
    fn collect_via_parents_noop(&mut self, start: FaceId) {
        self.collect_via_children(start, false);
    }

    fn initialize_simplex(&mut self) -> Result<(), SfcError> {
        let n = self.vertices.len();
        if n < self.dim + 1 {
            return Err(SfcError::DegenerateInput {
                have: n,
                need: self.dim + 1,
            });
        }

        let mut simplex_vertices = NatSet::new();
        simplex_vertices.insert(0);
        let mut subspace = AffineSubspace::new(self.vertices[0].clone());
        let mut unprocessed: Vec<usize> = Vec::new();
        let mut remaining = self.dim;

        for i in 1..n {
            if remaining > 0 && subspace.try_add_independent(&self.vertices[i], self.eps) {
                simplex_vertices.insert(i as u32);
                remaining -= 1;
            } else {
                unprocessed.push(i);
            }
        }

        if remaining > 0 {
            return Err(SfcError::DegenerateInput {
                have: self.dim + 1 - remaining,
                need: self.dim + 1,
            });
        }

        let mut inner = DVector::zeros(self.dim);
        for idx in simplex_vertices.iter() {
            inner += &self.vertices[idx as usize];
        }
        inner /= (self.dim + 1) as f64;
        self.inner_point = inner;

        // initial_faces[d] maps a (d)-dimensional vertex subset to its face,
        // for d in 0..=dim-1. Dimension `dim` (the facets) lives at index
        // `dim - 1`.
        let mut initial_faces: Vec<HashMap<NatSet, FaceId>> = vec![HashMap::new(); self.dim];

        for idx in simplex_vertices.iter() {
            let vs = NatSet::singleton(idx);
            let id = self.new_face(0, vs.clone());
            self.node_mut(id).num_ancestor_facets = self.dim as u32;
            initial_faces[0].insert(vs, id);
            self.vertex_faces.insert(id);
        }

        for d in 1..self.dim {
            let entries: Vec<(NatSet, FaceId)> = initial_faces[d - 1]
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect();
            for (vs_child, child_id) in entries {
                for idx in simplex_vertices.iter() {
                    if vs_child.contains(idx) {
                        continue;
                    }
                    let mut vs_parent = vs_child.clone();
                    vs_parent.insert(idx);
                    if let Some(&parent_id) = initial_faces[d].get(&vs_parent) {
                        self.node_mut(parent_id).children.insert(child_id);
                        self.node_mut(child_id).parents.insert(parent_id);
                    } else {
                        let parent_id = self.new_face(d, vs_parent.clone());
                        self.node_mut(parent_id).num_ancestor_facets = (self.dim - d) as u32;
                        self.node_mut(parent_id).children.insert(child_id);
                        self.node_mut(child_id).parents.insert(parent_id);
                        if d + 1 == self.dim {
                            self.node_mut(parent_id).facet = Some(FacetRecord {
                                normal: DVector::zeros(self.dim),
                                offset: 0.0,
                                outside_set: Vec::new(),
                            });
                        }
                        initial_faces[d].insert(vs_parent, parent_id);
                    }
                }
            }
        }

        for facet_id in initial_faces[self.dim - 1].values().copied() {
            let vertex_indices: Vec<usize> =
                self.node(facet_id).vertex_set.iter().map(|v| v as usize).collect();
            self.set_facet_normal(facet_id, &vertex_indices);
            self.facets.insert(facet_id);
            self.unprocessed_facets.push_back(facet_id);
        }

        // Non-corner vertex sets are only known once the hull is complete;
        // clear them now (they were needed above purely as hashmap keys).
        for d in 1..self.dim {
            let ids: Vec<FaceId> = initial_faces[d].values().copied().collect();
            for id in ids {
                self.node_mut(id).vertex_set = NatSet::new();
            }
        }

        for i in unprocessed {
            let facets: Vec<FaceId> = self.facets.iter().copied().collect();
            for facet_id in facets {
                if self.distance_sign(facet_id, &self.vertices[i]) > 0 {
                    self.node_mut(facet_id).facet.as_mut().unwrap().outside_set.push(i);
                    break;
                }
            }
        }

        Ok(())
    }

    fn compute_neighbors(&mut self, point: &DVector<f64>, start_facet: FaceId) -> (Vec<FaceId>, Vec<FaceId>) {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        queue.push_back(start_facet);
        visited.insert(start_facet);
        let mut above = Vec::new();
        let mut inside = Vec::new();

        while let Some(facet_id) = queue.pop_front() {
            let sign = self.distance_sign(facet_id, point);
            if sign < 0 {
                continue;
            }
            if sign == 0 {
                inside.push(facet_id);
            } else {
                above.push(facet_id);
            }

            let children: Vec<FaceId> = self.node(facet_id).children.iter().copied().collect();
            for child in children {
                let parents: Vec<FaceId> = self.node(child).parents.iter().copied().collect();
                for parent in parents {
                    if self.node(parent).facet.is_some() && visited.insert(parent) {
                        queue.push_back(parent);
                    }
                }
            }
        }

        (above, inside)
    }

    fn prepare_connect(&mut self, face: FaceId, other_faces: &[FaceId]) {
        for &other in other_faces {
            match self.node(other).status() {
                FaceStatus::Connect => {
                    self.node_mut(other).faces_to_connect.insert(face);
                    self.new_connect_faces.insert(other);
                }
                FaceStatus::Remove => {
                    let parents: Vec<FaceId> = self.node(other).parents.iter().copied().collect();
                    for parent in parents {
                        if self.node(parent).status() == FaceStatus::Extend {
                            self.node_mut(parent).children.insert(face);
                            self.node_mut(face).parents.insert(parent);
                            break;
                        }
                    }
                }
                FaceStatus::Keep | FaceStatus::Extend => {}
            }
        }
    }

    fn delete_face_recursively(&mut self, face: FaceId) {
        if self.node(face).is_vertex() {
            self.vertex_faces.remove(&face);
        }

        let parents: Vec<FaceId> = self.node(face).parents.iter().copied().collect();
        for parent in parents {
            self.node_mut(parent).children.remove(&face);
        }

        let children: Vec<FaceId> = self.node(face).children.iter().copied().collect();
        for child in children {
            self.node_mut(child).parents.remove(&face);
            if self.node(child).should_remove {
                self.delete_face_recursively(child);
            }
        }

        self.arena[face.0] = None;
    }

    fn add_point(&mut self, point_index: usize, facet: FaceId) {
        let point = self.vertices[point_index].clone();
        let (above, inside) = self.compute_neighbors(&point, facet);

        self.visit_children_for_each(&above, |qh, id| {
            qh.node_mut(id).p += 1;
            if qh.node(id).is_vertex() {
                qh.connect_faces.insert(id);
            }
        });
        self.visit_children_for_each(&inside, |qh, id| {
            qh.node_mut(id).z += 1;
        });

        let new_corner = self.new_face(0, NatSet::singleton(point_index as u32));
        self.vertex_faces.insert(new_corner);

        let initial_connect: Vec<FaceId> = self.connect_faces.drain().collect();
        self.prepare_connect(new_corner, &initial_connect);

        // Connect faces but not hyperfacets: ascend from dim 1 to dim-2.
        for _ in 1..self.dim.saturating_sub(1) {
            let round: Vec<FaceId> = self.new_connect_faces.drain().collect();
            for face in round {
                let current_connect_faces: Vec<FaceId> = self.node(face).parents.iter().copied().collect();
                let mut children: HashSet<FaceId> =
                    std::mem::take(&mut self.node_mut(face).faces_to_connect);
                children.insert(face);
                let new_dim = self.node(face).dim + 1;
                let new_face_id = self.new_face(new_dim, NatSet::new());
                for &child in &children {
                    self.node_mut(child).parents.insert(new_face_id);
                }
                self.node_mut(new_face_id).children = children;
                self.prepare_connect(new_face_id, &current_connect_faces);
            }
        }

        // Connect hyperfacets.
        let facet_round: Vec<FaceId> = self.new_connect_faces.drain().collect();
        let mut new_facets: Vec<FaceId> = Vec::new();
        for face in facet_round {
            let mut children: HashSet<FaceId> = std::mem::take(&mut self.node_mut(face).faces_to_connect);
            children.insert(face);
            let new_facet = self.new_face(self.dim, NatSet::new());
            self.node_mut(new_facet).facet = Some(FacetRecord {
                normal: DVector::zeros(self.dim),
                offset: 0.0,
                outside_set: Vec::new(),
            });
            for &child in &children {
                self.node_mut(child).parents.insert(new_facet);
            }
            self.node_mut(new_facet).children = children;

            let mut facet_vertex_indices = Vec::new();
            let ids = self.collect_via_children(new_facet, true);
            for &id in &ids {
                self.node_mut(id).num_ancestor_facets += 1;
                if self.node(id).is_vertex() {
                    facet_vertex_indices.push(self.node(id).vertex_set.any_element().unwrap() as usize);
                }
            }
            self.collect_via_children(new_facet, false);

            self.set_facet_normal(new_facet, &facet_vertex_indices);

            new_facets.push(new_facet);
            self.facets.insert(new_facet);
            self.unprocessed_facets.push_back(new_facet);
        }

        self.visit_children_once(&above, |qh, id| {
            if qh.node(id).status() == FaceStatus::Remove {
                qh.node_mut(id).should_remove = true;
            }
        });

        self.visit_children_for_each(&above, |qh, id| {
            qh.node_mut(id).num_ancestor_facets -= 1;
            qh.node_mut(id).p -= 1;
        });

        for &f in &above {
            let outside = std::mem::take(&mut self.node_mut(f).facet.as_mut().unwrap().outside_set);
            for pt in outside {
                let mut found = false;
                for &fnew in &new_facets {
                    if self.distance_sign(fnew, &self.vertices[pt]) > 0 {
                        self.node_mut(fnew).facet.as_mut().unwrap().outside_set.push(pt);
                        found = true;
                        break;
                    }
                }
                if !found {
                    for &fnew in &inside {
                        if self.distance_sign(fnew, &self.vertices[pt]) > 0 {
                            self.node_mut(fnew).facet.as_mut().unwrap().outside_set.push(pt);
                            break;
                        }
                    }
                }
            }

            self.facets.remove(&f);
            self.delete_face_recursively(f);
        }

        self.visit_children_for_each(&inside, |qh, id| {
            if qh.node(id).z == 0 {
                qh.node_mut(id).num_ancestor_facets += 1;
            } else {
                qh.node_mut(id).z -= 1;
            }
        });

        self.connect_faces.clear();
        self.new_connect_faces.clear();
    }

    fn compute(&mut self) -> Result<(), SfcError> {
        self.initialize_simplex()?;

        while let Some(facet_id) = self.unprocessed_facets.pop_front() {
            if !self.facets.contains(&facet_id) {
                continue;
            }

            let outside = self.node(facet_id).facet.as_ref().unwrap().outside_set.clone();
            if outside.is_empty() {
                continue;
            }

            let mut max_dist = f64::NEG_INFINITY;
            let mut max_index = outside[0];
            for &idx in &outside {
                let dist = self.signed_distance(facet_id, &self.vertices[idx]);
                if dist > max_dist {
                    max_dist = dist;
                    max_index = idx;
                }
            }

            self.add_point(max_index, facet_id);
        }

        let vertex_faces: Vec<FaceId> = self.vertex_faces.iter().copied().collect();
        for vface in vertex_faces {
            let vidx = self.node(vface).vertex_set.any_element().unwrap();
            let ancestors = self.collect_via_parents(vface, true);
            for &id in &ancestors {
                self.node_mut(id).vertex_set.insert(vidx);
            }
            self.collect_via_parents(vface, false);
        }

        Ok(())
    }

    fn add_to_polytope_recursively(&mut self, face: FaceId, d: usize, polytope: &mut ConvexPolytope) {
        let index = polytope.faces[d].len();
        let vertices = self.node(face).vertex_set.clone();

        let parents: Vec<FaceId> = self.node(face).parents.iter().copied().collect();
        let mut parent_indexes = Vec::new();
        for parent in parents {
            if !self.node(parent).visited {
                self.add_to_polytope_recursively(parent, d + 1, polytope);
            }
            let parent_poly_index = self.node(parent).polytope_index;
            parent_indexes.push(parent_poly_index);
            polytope.faces[d + 1][parent_poly_index].child_indexes.push(index);
        }

        self.node_mut(face).polytope_index = index;
        polytope.faces[d].push(Face {
            dim: d,
            vertices,
            parent_indexes,
            child_indexes: Vec::new(),
        });
        self.node_mut(face).visited = true;
    }

    fn export(&mut self) -> ConvexPolytope {
        let mut polytope = ConvexPolytope::new(self.dim);

        let vertex_faces: Vec<FaceId> = self.vertex_faces.iter().copied().collect();
        for vface in vertex_faces {
            if !self.node(vface).visited {
                self.add_to_polytope_recursively(vface, 0, &mut polytope);
            }
        }

        let mut interior = Face {
            dim: self.dim,
            vertices: NatSet::new(),
            parent_indexes: Vec::new(),
            child_indexes: Vec::new(),
        };
        let n_facets = polytope.faces[self.dim - 1].len();
        for i in 0..n_facets {
            interior.child_indexes.push(i);
            polytope.faces[self.dim - 1][i].parent_indexes.push(0);
        }
        for vf in &polytope.faces[0] {
            if let Some(v) = vf.vertices.any_element() {
                interior.vertices.insert(v);
            }
        }
        polytope.faces[self.dim].push(interior);

        polytope
    }
}

/// Computes the full combinatorial face lattice of the convex hull of
/// `points` (one candidate vertex per column). Points not on the hull are
/// dropped; degenerate input (fewer than `d+1` affinely independent
/// vertices) is reported as [`SfcError::DegenerateInput`].
pub fn quickhull(points: &DMatrix<f64>, cfg: HullCfg) -> Result<ConvexPolytope, SfcError> {
    let mut qh = new_quickhull(points, cfg);
    qh.compute()?;
    let mut polytope = qh.export();
    polytope.sort();
    Ok(polytope)
}

fn new_quickhull(points: &DMatrix<f64>, cfg: HullCfg) -> QuickHull {
    let dim = points.nrows();
    let n = points.ncols();
    QuickHull {
        vertices: (0..n).map(|i| points.column(i).into_owned()).collect(),
        inner_point: DVector::zeros(dim),
        dim,
        eps: cfg.eps_dist,
        arena: Vec::new(),
        vertex_faces: HashSet::new(),
        facets: HashSet::new(),
        unprocessed_facets: VecDeque::new(),
        connect_faces: HashSet::new(),
        new_connect_faces: HashSet::new(),
    }
}

/// Test-only entry point that additionally returns each live facet's actual
/// hyperplane (`vertex_set -> (outer_normal_vector, offset)`), keyed by
/// vertex set so lookups survive `ConvexPolytope::sort()`'s reordering.
/// `quickhull` itself drops this data once the arena is freed.
#[cfg(test)]
fn quickhull_with_facet_planes(
    points: &DMatrix<f64>,
    cfg: HullCfg,
) -> Result<(ConvexPolytope, HashMap<NatSet, (DVector<f64>, f64)>), SfcError> {
    let mut qh = new_quickhull(points, cfg);
    qh.compute()?;

    let mut planes = HashMap::new();
    for &facet_id in &qh.facets {
        let node = qh.node(facet_id);
        let rec = node.facet.as_ref().expect("live facet has a FacetRecord");
        planes.insert(node.vertex_set.clone(), (rec.normal.clone(), rec.offset));
    }

    let mut polytope = qh.export();
    polytope.sort();
    Ok((polytope, planes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    fn euler_characteristic(p: &ConvexPolytope) -> i64 {
        let mut sum = 0i64;
        for dim in 0..p.dimension() {
            let sign = if dim % 2 == 0 { 1 } else { -1 };
            sum += sign * p.faces_at(dim).len() as i64;
        }
        sum
    }

    #[test]
    fn unit_square_face_counts() {
        let points = dmatrix![
            0.0, 1.0, 0.0, 1.0;
            0.0, 0.0, 1.0, 1.0
        ];
        let poly = quickhull(&points, HullCfg::default()).unwrap();
        assert_eq!(poly.faces_at(0).len(), 4);
        assert_eq!(poly.faces_at(1).len(), 4);
        assert_eq!(poly.faces_at(2).len(), 1);
        assert_eq!(euler_characteristic(&poly), 0);
    }

    #[test]
    fn unit_cube_face_counts() {
        let mut points = DMatrix::<f64>::zeros(3, 8);
        for i in 0..8usize {
            for d in 0..3 {
                points[(d, i)] = ((i >> d) & 1) as f64;
            }
        }
        let poly = quickhull(&points, HullCfg::default()).unwrap();
        assert_eq!(poly.faces_at(0).len(), 8);
        assert_eq!(poly.faces_at(1).len(), 12);
        assert_eq!(poly.faces_at(2).len(), 6);
        assert_eq!(poly.faces_at(3).len(), 1);
        for facet in poly.faces_at(2) {
            assert_eq!(facet.vertices.len(), 4);
        }
        assert_eq!(euler_characteristic(&poly), 2);
    }

    #[test]
    fn interior_points_are_dropped() {
        let points = dmatrix![
            0.0, 1.0, 0.0, 1.0, 0.5;
            0.0, 0.0, 1.0, 1.0, 0.5
        ];
        let poly = quickhull(&points, HullCfg::default()).unwrap();
        assert_eq!(poly.faces_at(0).len(), 4);
    }

    #[test]
    fn too_few_points_is_degenerate() {
        let points = dmatrix![0.0, 1.0; 0.0, 0.0];
        let err = quickhull(&points, HullCfg::default()).unwrap_err();
        assert_eq!(
            err,
            SfcError::DegenerateInput {
                have: 2,
                need: 3
            }
        );
    }

    #[test]
    fn all_facets_are_on_or_inside_the_hyperplane() {
        let cfg = HullCfg::default();

        let square = dmatrix![
            0.0, 1.0, 0.0, 1.0;
            0.0, 0.0, 1.0, 1.0
        ];
        assert_half_space_invariant(&square, cfg);

        let mut cube = DMatrix::<f64>::zeros(3, 8);
        for i in 0..8usize {
            for d in 0..3 {
                cube[(d, i)] = ((i >> d) & 1) as f64;
            }
        }
        assert_half_space_invariant(&cube, cfg);
    }

    /// Spec §8: "for every facet F and every input point p, `signed_distance(p,
    /// F) <= eps`." Recomputes each facet's actual outer hyperplane (via
    /// `quickhull_with_facet_planes`, which keeps what `quickhull` discards)
    /// and checks every input column against every facet.
    fn assert_half_space_invariant(points: &DMatrix<f64>, cfg: HullCfg) {
        let (poly, planes) = quickhull_with_facet_planes(points, cfg).unwrap();
        let facet_dim = poly.dimension() - 1;
        for facet in poly.faces_at(facet_dim) {
            let (normal, offset) = planes
                .get(&facet.vertices)
                .expect("every exported facet has a recorded hyperplane");
            for col in 0..points.ncols() {
                let p = points.column(col).into_owned();
                let signed = p.dot(normal) - offset;
                assert!(
                    signed <= cfg.eps_dist,
                    "point {col} lies outside facet {:?}: signed_distance = {signed}",
                    facet.vertices
                );
            }
        }
    }

    #[test]
    fn permutation_invariant_after_sort() {
        let points_a = dmatrix![
            0.0, 1.0, 0.0, 1.0;
            0.0, 0.0, 1.0, 1.0
        ];
        let points_b = dmatrix![
            1.0, 0.0, 1.0, 0.0;
            1.0, 1.0, 0.0, 0.0
        ];
        let mut poly_a = quickhull(&points_a, HullCfg::default()).unwrap();
        let mut poly_b = quickhull(&points_b, HullCfg::default()).unwrap();
        poly_a.sort();
        poly_b.sort();
        for dim in 0..=poly_a.dimension() {
            assert_eq!(poly_a.faces_at(dim).len(), poly_b.faces_at(dim).len());
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn euler_characteristic(p: &ConvexPolytope) -> i64 {
        let mut sum = 0i64;
        for dim in 0..p.dimension() {
            let sign = if dim % 2 == 0 { 1 } else { -1 };
            sum += sign * p.faces_at(dim).len() as i64;
        }
        sum
    }

    fn matrix_from_cols(cols: &[(f64, f64)]) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(2, cols.len());
        for (i, &(x, y)) in cols.iter().enumerate() {
            m[(0, i)] = x;
            m[(1, i)] = y;
        }
        m
    }

    fn permuted(m: &DMatrix<f64>, perm: &[usize]) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(m.nrows(), m.ncols());
        for (new_col, &old_col) in perm.iter().enumerate() {
            out.column_mut(new_col).copy_from(&m.column(old_col));
        }
        out
    }

    proptest! {
        /// Random 2D point clouds that do produce a hull (some degenerate
        /// inputs are rejected by `initialize_simplex`, which is covered
        /// separately) satisfy the boundary-lattice Euler characteristic.
        #[test]
        fn euler_characteristic_holds_for_random_clouds(
            pts in proptest::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 4..12),
        ) {
            let m = matrix_from_cols(&pts);
            if let Ok(poly) = quickhull(&m, HullCfg::default()) {
                prop_assert_eq!(euler_characteristic(&poly), 0);
            }
        }

        /// Re-running QuickHull on a permuted column order yields an equal
        /// (by per-dimension face count, after `sort()`) polytope.
        #[test]
        fn permutation_invariant_for_random_clouds(
            pts in proptest::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 4..10),
            shuffle_seed in 0usize..10_000,
        ) {
            let m = matrix_from_cols(&pts);
            let mut perm: Vec<usize> = (0..pts.len()).collect();
            for i in (1..perm.len()).rev() {
                let j = (shuffle_seed + i * 2654435761) % (i + 1);
                perm.swap(i, j);
            }
            let m2 = permuted(&m, &perm);

            if let (Ok(mut poly_a), Ok(mut poly_b)) =
                (quickhull(&m, HullCfg::default()), quickhull(&m2, HullCfg::default()))
            {
                poly_a.sort();
                poly_b.sort();
                prop_assert_eq!(poly_a.dimension(), poly_b.dimension());
                for dim in 0..=poly_a.dimension() {
                    prop_assert_eq!(poly_a.faces_at(dim).len(), poly_b.faces_at(dim).len());
                }
            }
        }
    }
}
