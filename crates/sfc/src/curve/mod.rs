//! Curve specifications and the facet-adjacency analysis built on top of
//! them.

mod kd;

pub mod info;
pub mod spec;

pub use info::{CurveInformation, GeometricTreeNode};
pub use spec::CurveSpecification;
