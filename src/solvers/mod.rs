//! Solver backends and the dispatch layer.
//!
//! Each supported backend gets one adapter module that converts the
//! canonical conic data into the backend's calling convention and
//! normalizes the backend's raw return into [`RawSolution`]. The set of
//! backends is the closed [`SolverId`] enumeration; callers never touch a
//! backend crate directly.
//!
//! Option handling is strict: a key the chosen backend does not recognize
//! fails with [`crate::Error::UnsupportedOption`] before the backend runs,
//! and a recognized key carrying a value of the wrong type fails with
//! [`crate::Error::Config`].

pub mod clarabel;
pub mod microlp;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::canon::Canonical;
use crate::error::{Error, Result};

/// The supported solver backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverId {
    /// Clarabel interior-point conic solver. Handles zero, nonnegative
    /// and second-order cones; reports duals.
    Clarabel,
    /// Microlp simplex solver. Handles linear rows only; reports no
    /// duals.
    Microlp,
}

impl SolverId {
    /// Every supported backend.
    pub const ALL: [SolverId; 2] = [SolverId::Clarabel, SolverId::Microlp];

    /// The backend's name as used in messages and option errors.
    pub fn name(&self) -> &'static str {
        match self {
            SolverId::Clarabel => clarabel::NAME,
            SolverId::Microlp => microlp::NAME,
        }
    }

    /// Whether the backend consumes the split `(c, A, b, G, h, dims)`
    /// family rather than the unified `(data, dims)` bundle.
    pub fn consumes_split(&self) -> bool {
        match self {
            SolverId::Clarabel => false,
            SolverId::Microlp => true,
        }
    }
}

impl fmt::Display for SolverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(SolverId::Clarabel),
            "microlp" => Ok(SolverId::Microlp),
            other => Err(Error::Config(format!("unknown solver `{other}`"))),
        }
    }
}

/// Normalized outcome of a solve, shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// An optimal solution was found.
    Optimal,
    /// No point satisfies all constraints.
    Infeasible,
    /// The objective can be improved without bound.
    Unbounded,
    /// The backend gave up: iteration/time limit, numerical breakdown,
    /// or an internal failure.
    NumericalTrouble,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::NumericalTrouble => "numerical trouble",
        };
        f.write_str(s)
    }
}

/// A value in the solver options map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    /// A boolean switch.
    Bool(bool),
    /// An integer parameter.
    Int(i64),
    /// A floating-point parameter.
    Float(f64),
}

impl SettingValue {
    pub(crate) fn as_u32(&self, key: &str) -> Result<u32> {
        match self {
            SettingValue::Int(i) if *i >= 0 && *i <= u32::MAX as i64 => Ok(*i as u32),
            other => Err(Error::Config(format!(
                "option `{key}` expects a nonnegative integer, got {other:?}"
            ))),
        }
    }

    pub(crate) fn as_f64(&self, key: &str) -> Result<f64> {
        match self {
            SettingValue::Float(v) => Ok(*v),
            other => Err(Error::Config(format!(
                "option `{key}` expects a float, got {other:?}"
            ))),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<i32> for SettingValue {
    fn from(v: i32) -> Self {
        SettingValue::Int(v as i64)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Float(v)
    }
}

/// Options for a solve: a verbosity switch plus a map of backend-specific
/// tuning parameters, passed through verbatim to the adapter.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    verbose: bool,
    settings: BTreeMap<String, SettingValue>,
}

impl SolveOptions {
    /// Default options: quiet, no tuning parameters.
    pub fn new() -> Self {
        SolveOptions::default()
    }

    /// Ask the backend to print its own progress log. Backends without a
    /// verbosity switch ignore the flag.
    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    /// Add a backend-specific tuning parameter.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Whether the verbose flag is set.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The tuning parameters, in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// What an adapter hands back after calling its backend.
#[derive(Debug, Clone)]
pub(crate) struct RawSolution {
    pub status: SolveStatus,
    /// Values for all canonical columns; empty unless optimal.
    pub primal: Vec<f64>,
    /// Duals for the zero-cone rows; empty when the backend has none.
    pub dual_eq: Vec<f64>,
    /// Duals for the remaining cone rows; empty when the backend has
    /// none.
    pub dual_cone: Vec<f64>,
    /// Wall-clock seconds spent inside the backend.
    pub solve_time: f64,
    /// Iterations reported by the backend, zero if it reports none.
    pub iterations: u32,
}

/// Route canonical data to the chosen backend.
pub(crate) fn dispatch(
    solver: SolverId,
    canonical: &Canonical,
    options: &SolveOptions,
) -> Result<RawSolution> {
    log::debug!("dispatching to {solver}");
    match solver {
        SolverId::Clarabel => clarabel::solve(&canonical.unified(), options),
        SolverId::Microlp => microlp::solve(&canonical.split(), options),
    }
}
