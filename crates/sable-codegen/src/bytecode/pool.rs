//! Deduplicating tables for module-level operands.
//!
//! Strings, type references and method references are stored once per module
//! and referenced from instructions by index.

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// An insertion-ordered table that hands out one index per distinct value.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    values: Vec<T>,
    index: FxHashMap<T, u32>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T: Clone + Eq + Hash> Pool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get the existing value, returns its index.
    pub fn add(&mut self, value: T) -> u32 {
        if let Some(&idx) = self.index.get(&value) {
            return idx;
        }
        let idx = self.values.len() as u32;
        self.values.push(value.clone());
        self.index.insert(value, idx);
        idx
    }

    /// Index of `value` if it was added before.
    pub fn find(&self, value: &T) -> Option<u32> {
        self.index.get(value).copied()
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.values.get(index as usize)
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
