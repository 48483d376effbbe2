//! Curve analysis: polytope structure per state, and the
//! neighbor/opponent/parent-facet lookup tables that drive the O(1)
//! neighbor algorithms in [`crate::algorithms`].
//!
//! Explores the (generally infinite) geometric tree only up to the point
//! where every reachable *state* (not node) has been visited once, builds
//! each state's combinatorial polytope via QuickHull, then explores pairs of
//! adjacent/opponent cells to completion the same way, recording facet
//! adjacency as it's discovered.

use std::collections::HashMap;

use nalgebra::DMatrix;
use tracing::{info, warn};

use crate::completion::CompletionAlgorithm;
use crate::config::HullCfg;
use crate::error::SfcError;
use crate::geo::ConvexPolytope;
use crate::multidim::MultidimArray;
use crate::natset::NatSet;

use super::spec::CurveSpecification;

/// A node of the (infinite) geometric tree generated by repeatedly applying
/// a [`CurveSpecification`]'s grammar: a state plus the concrete points of
/// the cell at this tree position.
#[derive(Debug, Clone)]
pub struct GeometricTreeNode {
    pub state: usize,
    pub points: DMatrix<f64>,
}

impl GeometricTreeNode {
    pub fn new(state: usize, points: DMatrix<f64>) -> Self {
        GeometricTreeNode { state, points }
    }
}

/// A discovered pair of adjacent cells, carrying their concrete geometry so
/// the completion can keep descending into genuinely adjacent children:
/// two occurrences of the same state are not interchangeable here, since
/// adjacency depends on where each cell actually sits.
#[derive(Debug, Clone)]
struct TreeNodePair {
    first: GeometricTreeNode,
    second: GeometricTreeNode,
    first_facet: usize,
    second_facet: usize,
}

/// Structural key used only for completion dedup: two pairs are "the same"
/// if they relate the same two states via the same two facets, regardless
/// of which side is "first".
fn pair_key(p: &TreeNodePair) -> (usize, usize, usize, usize) {
    let a = (p.first.state, p.first_facet);
    let b = (p.second.state, p.second_facet);
    if a <= b {
        (p.first.state, p.second.state, p.first_facet, p.second_facet)
    } else {
        (p.second.state, p.first.state, p.second_facet, p.first_facet)
    }
}

/// Computed facet-adjacency information for a [`CurveSpecification`]:
/// per-state polytope structure plus the neighbor, opponent, and
/// parent-facet tables used by the generic table-driven SFC algorithms.
pub struct CurveInformation {
    spec: CurveSpecification,
    polytope_structures: HashMap<usize, ConvexPolytope>,
    state_reachability: Vec<bool>,
    /// `[child_index][parent_state][facet]` -> sibling child index sharing
    /// that facet within the same parent cell.
    neighbor_table: MultidimArray<Option<usize>>,
    /// `[child_index][parent_state][opponent_parent_state][facet]` -> the
    /// child index across the facet, in the adjacent parent cell.
    opponent_table: MultidimArray<Option<usize>>,
    /// `[child_index][parent_state][facet]` -> the parent's own facet index
    /// that this child-facet pair descends from.
    parent_facet_table: MultidimArray<Option<usize>>,
    opponent_inconsistent: bool,
    has_palindrome_property: bool,
}

impl CurveInformation {
    /// Explores the geometric tree generated by `spec` to completion and
    /// builds the adjacency tables. Fails only if some reachable state's
    /// cell is geometrically degenerate (fewer than `d+1` affinely
    /// independent vertices).
    pub fn analyze(spec: CurveSpecification, cfg: HullCfg) -> Result<CurveInformation, SfcError> {
        spec.validate()?;
        let num_states = spec.num_states();

        let mut info = CurveInformation {
            spec,
            polytope_structures: HashMap::new(),
            state_reachability: vec![false; num_states],
            neighbor_table: MultidimArray::new(3, None),
            opponent_table: MultidimArray::new(4, None),
            parent_facet_table: MultidimArray::new(3, None),
            opponent_inconsistent: false,
            has_palindrome_property: true,
        };

        info.compute_information(cfg)?;

        if info.opponent_inconsistent {
            warn!("CurveInformation::analyze: opponent table is inconsistent");
        } else if info.has_palindrome_property {
            info!("the curve has the modified palindrome property");
        } else {
            info!("the curve does not have the modified palindrome property");
        }

        Ok(info)
    }

    pub fn root_node(&self) -> GeometricTreeNode {
        GeometricTreeNode::new(0, self.spec.root_points.clone())
    }

    pub fn children(&self, node: &GeometricTreeNode) -> Vec<GeometricTreeNode> {
        let mut result = Vec::with_capacity(self.spec.num_children());
        for i in 0..self.spec.num_children() {
            let next_state = self.spec.grammar[node.state][i];
            let points = &node.points * &self.spec.transition_mats[node.state][i];
            result.push(GeometricTreeNode::new(next_state, points));
        }
        result
    }

    pub fn polytope_for_state(&self, state: usize) -> Option<&ConvexPolytope> {
        self.polytope_structures.get(&state)
    }

    pub fn num_states(&self) -> usize {
        self.spec.num_states()
    }

    pub fn num_children(&self) -> usize {
        self.spec.num_children()
    }

    /// The state a child slot leads to, without touching any geometry —
    /// the table-driven algorithms need the grammar alone to climb and
    /// descend the tree of states.
    pub fn child_state(&self, state: usize, child: usize) -> usize {
        self.spec.grammar[state][child]
    }

    pub fn is_state_reachable(&self, state: usize) -> bool {
        self.state_reachability.get(state).copied().unwrap_or(false)
    }

    pub fn neighbor(&self, child_index: usize, parent_state: usize, facet: usize) -> Option<usize> {
        self.neighbor_table.get(&[child_index, parent_state, facet])
    }

    pub fn opponent(
        &self,
        child_index: usize,
        parent_state: usize,
        opponent_parent_state: usize,
        facet: usize,
    ) -> Option<usize> {
        self.opponent_table
            .get(&[child_index, parent_state, opponent_parent_state, facet])
    }

    pub fn parent_facet(&self, child_index: usize, parent_state: usize, facet: usize) -> Option<usize> {
        self.parent_facet_table.get(&[child_index, parent_state, facet])
    }

    pub fn opponent_inconsistent(&self) -> bool {
        self.opponent_inconsistent
    }

    pub fn has_palindrome_property(&self) -> bool {
        self.has_palindrome_property
    }

    fn try_find_adjacent_facets(
        &self,
        first: &GeometricTreeNode,
        second: &GeometricTreeNode,
        cfg: HullCfg,
    ) -> Option<(usize, usize)> {
        let sq_eps = cfg.eps_coincident * cfg.eps_coincident;

        let mut first_vertex_set = NatSet::new();
        let mut second_vertex_set = NatSet::new();

        for first_col in 0..first.points.ncols() {
            for second_col in 0..second.points.ncols() {
                let diff = first.points.column(first_col) - second.points.column(second_col);
                if diff.norm_squared() < sq_eps {
                    first_vertex_set.insert(first_col as u32);
                    second_vertex_set.insert(second_col as u32);
                }
            }
        }

        let d = self.spec.d;
        let first_facet = self
            .polytope_structures
            .get(&first.state)?
            .find_face(d - 1, &first_vertex_set)?;
        let second_facet = self
            .polytope_structures
            .get(&second.state)?
            .find_face(d - 1, &second_vertex_set)?;

        Some((first_facet, second_facet))
    }

    fn compute_information(&mut self, cfg: HullCfg) -> Result<(), SfcError> {
        let root = self.root_node();
        let mut node_alg = CompletionAlgorithm::new(vec![root], |n: &GeometricTreeNode| n.state);

        let mut hull_error: Option<SfcError> = None;
        node_alg.compute_single_completion(|node| {
            if hull_error.is_some() {
                return Vec::new();
            }
            self.state_reachability[node.state] = true;
            match ConvexPolytope::convex_hull(&node.points, cfg) {
                Ok(polytope) => {
                    self.polytope_structures.insert(node.state, polytope);
                }
                Err(e) => {
                    hull_error = Some(e);
                    return Vec::new();
                }
            }
            self.children(node)
        });

        if let Some(e) = hull_error {
            return Err(e);
        }

        let mut pair_alg: CompletionAlgorithm<TreeNodePair, (usize, usize, usize, usize)> =
            CompletionAlgorithm::new(Vec::new(), pair_key);

        for node in node_alg.result() {
            let children = self.children(node);
            for i in 0..children.len() {
                for j in (i + 1)..children.len() {
                    if let Some((first_facet, second_facet)) =
                        self.try_find_adjacent_facets(&children[i], &children[j], cfg)
                    {
                        self.neighbor_table.set(&[i, node.state, first_facet], Some(j));
                        self.neighbor_table.set(&[j, node.state, second_facet], Some(i));
                        pair_alg.add(TreeNodePair {
                            first: children[i].clone(),
                            second: children[j].clone(),
                            first_facet,
                            second_facet,
                        });
                    }
                }
            }
        }

        pair_alg.compute_single_completion(|pair| {
            let first_children = self.children(&pair.first);
            let second_children = self.children(&pair.second);

            let mut new_pairs = Vec::new();
            for i in 0..first_children.len() {
                for j in 0..second_children.len() {
                    if let Some((first_facet, second_facet)) =
                        self.try_find_adjacent_facets(&first_children[i], &second_children[j], cfg)
                    {
                        let key_ij = [i, pair.first.state, pair.second.state, first_facet];
                        if let Some(existing) = self.opponent_table.get(&key_ij) {
                            if existing != j {
                                self.opponent_inconsistent = true;
                            }
                        }
                        self.opponent_table.set(&key_ij, Some(j));

                        let key_ji = [j, pair.second.state, pair.first.state, second_facet];
                        if let Some(existing) = self.opponent_table.get(&key_ji) {
                            if existing != i {
                                self.opponent_inconsistent = true;
                            }
                        }
                        self.opponent_table.set(&key_ji, Some(i));

                        self.parent_facet_table
                            .set(&[i, pair.first.state, first_facet], Some(pair.first_facet));
                        self.parent_facet_table
                            .set(&[j, pair.second.state, second_facet], Some(pair.second_facet));

                        new_pairs.push(TreeNodePair {
                            first: first_children[i].clone(),
                            second: second_children[j].clone(),
                            first_facet,
                            second_facet,
                        });
                    }
                }
            }
            new_pairs
        });

        let b = self.spec.num_children();
        for (idx, value) in self.opponent_table.dense_iter() {
            if let Some(v) = value {
                let opposite = b - 1 - idx[0];
                if v != opposite {
                    self.has_palindrome_property = false;
                    break;
                }
            }
        }

        Ok(())
    }
}
