//! The bound-parameter sequence filled during one `compile()` pass.

use crate::value::Value;

/// Ordered, append-only list of bound values.
///
/// A value's 1-based position is its placeholder index; the dialect renders
/// that index (`$3`) or ignores it (`?`). One `Bound` is created per
/// compilation and shared by nested sub-queries so their placeholders number
/// contiguously with the outer statement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bound {
    values: Vec<Value>,
}

impl Bound {
    /// Create a new empty sequence.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Get the current value count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the values in placeholder order.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    /// Consume the sequence, returning the values in placeholder order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
