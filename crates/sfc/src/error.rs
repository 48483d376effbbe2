//! Error taxonomy for the curve and polytope algorithms.
//!
//! Only genuinely fatal conditions become `SfcError` variants. Conditions
//! that are non-fatal by design (an inconsistent opponent table, a neighbor
//! query that has no answer) are surfaced as `bool` flags or `None`, never
//! as errors — see `curve::CurveInformation::opponent_inconsistent` and the
//! `Option` returns of the `algorithms` module.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SfcError {
    /// Fewer than `need` affinely independent vertices were found among
    /// `have` input points; QuickHull cannot seed an initial simplex.
    #[error("degenerate input: found {have} affinely independent vertices, need {need}")]
    DegenerateInput { have: usize, need: usize },

    /// A curve specification's grammar rows or transition matrices disagree
    /// in shape (row length, column count).
    #[error("curve specification shape error: {0}")]
    SpecShape(String),
}
