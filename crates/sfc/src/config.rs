//! Numeric tolerances shared by the hull and curve-analysis algorithms.
//!
//! A small `Copy` struct of named epsilons with a `Default` giving the
//! literal constants used throughout this crate.

/// Tolerances for QuickHull and curve-information facet-adjacency tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullCfg {
    /// Absolute epsilon for hyperplane side tests (`signed_distance`).
    /// Fixed at `1e-9`; see the epsilon scaling discussion in DESIGN.md for
    /// when this stops being adequate.
    pub eps_dist: f64,
    /// Absolute epsilon (on squared distance) for deciding that two points
    /// in different cells coincide, used by curve-information adjacency
    /// tests.
    pub eps_coincident: f64,
}

impl Default for HullCfg {
    fn default() -> Self {
        HullCfg {
            eps_dist: 1e-9,
            eps_coincident: 1e-9,
        }
    }
}
