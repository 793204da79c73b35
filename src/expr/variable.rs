//! Decision variables.
//!
//! A [`Variable`] is a cheap, clonable handle: clones share the same
//! identity and the same post-solve value cell. The value cell is written
//! exclusively by [`crate::problem::Problem::solve_with`] and cleared at
//! the start of every solve, so callers holding a handle always observe
//! the outcome of the most recent solve.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::shape::Shape;

/// Unique identifier for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u64);

impl VarId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        VarId(NEXT.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct VarInner {
    id: VarId,
    shape: Shape,
    name: Option<String>,
    value: RwLock<Option<Vec<f64>>>,
}

/// A decision variable.
#[derive(Debug, Clone)]
pub struct Variable {
    inner: Arc<VarInner>,
}

impl Variable {
    /// Create a variable with the given shape.
    pub fn new(shape: Shape) -> Self {
        Variable {
            inner: Arc::new(VarInner {
                id: VarId::next(),
                shape,
                name: None,
                value: RwLock::new(None),
            }),
        }
    }

    /// Create a scalar variable.
    pub fn scalar() -> Self {
        Variable::new(Shape::scalar())
    }

    /// Create a vector variable of length `n`.
    pub fn vector(n: usize) -> Self {
        Variable::new(Shape::vector(n))
    }

    /// Create a named variable with the given shape.
    pub fn named(name: impl Into<String>, shape: Shape) -> Self {
        Variable {
            inner: Arc::new(VarInner {
                id: VarId::next(),
                shape,
                name: Some(name.into()),
                value: RwLock::new(None),
            }),
        }
    }

    /// The variable's unique id.
    pub fn id(&self) -> VarId {
        self.inner.id
    }

    /// The variable's shape.
    pub fn shape(&self) -> Shape {
        self.inner.shape
    }

    /// The variable's name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The value attached by the most recent successful solve.
    ///
    /// `None` before the first solve, after a failed solve, or after a
    /// solve that ended infeasible/unbounded.
    pub fn value(&self) -> Option<Vec<f64>> {
        self.inner.value.read().expect("variable lock poisoned").clone()
    }

    /// The attached value of a scalar variable.
    pub fn scalar_value(&self) -> Option<f64> {
        self.value().and_then(|v| v.first().copied())
    }

    pub(crate) fn set_value(&self, value: Vec<f64>) {
        *self.inner.value.write().expect("variable lock poisoned") = Some(value);
    }

    pub(crate) fn clear_value(&self) {
        *self.inner.value.write().expect("variable lock poisoned") = None;
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Variable {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Variable::scalar();
        let b = Variable::scalar();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn clones_share_identity_and_value() {
        let x = Variable::vector(3);
        let alias = x.clone();
        assert_eq!(x, alias);

        x.set_value(vec![1.0, 2.0, 3.0]);
        assert_eq!(alias.value(), Some(vec![1.0, 2.0, 3.0]));

        alias.clear_value();
        assert_eq!(x.value(), None);
    }

    #[test]
    fn named_variable() {
        let x = Variable::named("weights", Shape::vector(2));
        assert_eq!(x.name(), Some("weights"));
        assert_eq!(x.shape(), Shape::vector(2));
    }

    #[test]
    fn scalar_value_accessor() {
        let t = Variable::scalar();
        assert_eq!(t.scalar_value(), None);
        t.set_value(vec![2.5]);
        assert_eq!(t.scalar_value(), Some(2.5));
    }
}
