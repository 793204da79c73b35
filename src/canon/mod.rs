//! Canonicalization into standard conic form.

pub mod affine;
pub mod canonicalizer;
pub mod program;

pub(crate) use canonicalizer::{canonicalize, Canonical, DualRows};
pub use program::{ConeDims, ProblemData, SplitData, UnifiedData};
