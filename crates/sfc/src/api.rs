//! Curated internal API for agents (UNSTABLE).
//!
//! Important
//! - This is not a public API. It is a convenience surface for project-internal
//!   code and tickets. Breaking changes are allowed and expected.
//! - Prefer these re-exports for clarity and consistency across experiments.
//!
//! See AGENTS.md → “API Policy (Internal Only)”.

// Curve specifications and facet-adjacency analysis
pub use crate::curve::{CurveInformation, CurveSpecification, GeometricTreeNode};

// Convex geometry: face lattice and the QuickHull engine that builds it
pub use crate::geo::{quickhull, ConvexPolytope, Face};

// Shared infrastructure used across the hull/curve machinery
pub use crate::completion::CompletionAlgorithm;
pub use crate::multidim::MultidimArray;
pub use crate::natset::NatSet;

// Configuration and errors
pub use crate::config::HullCfg;
pub use crate::error::SfcError;

// O(1)-average neighbor-finding algorithms, one module per curve family
pub use crate::algorithms::{hilbert, morton, peano, sierpinski};
