//! Operand stack.

use crate::error::{CalcError, Result};

/// Unbounded LIFO stack of domain values.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack<V> {
    items: Vec<V>,
}

impl<V> Default for Stack<V> {
    fn default() -> Self {
        Stack { items: Vec::new() }
    }
}

impl<V> Stack<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: V) {
        self.items.push(value);
    }

    /// Remove and return the top value.
    pub fn pop(&mut self) -> Result<V> {
        self.items.pop().ok_or(CalcError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<&V> {
        self.items.last().ok_or(CalcError::StackUnderflow)
    }

    /// Remove the top `n` values, returned in push order (deepest first).
    ///
    /// Fails without touching the stack when fewer than `n` values are held.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<V>> {
        if n > self.items.len() {
            return Err(CalcError::StackUnderflow);
        }
        Ok(self.items.split_off(self.items.len() - n))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<V> {
        self.items
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
