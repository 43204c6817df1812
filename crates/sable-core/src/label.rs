//! Jump labels.

use std::fmt;

/// An opaque jump target inside one method body.
///
/// Labels compare by id. The binder numbers the labels it creates from 0 and
/// records the first free id in [`BoundProgram::next_label`](crate::BoundProgram::next_label);
/// anything synthesized later comes from a [`LabelGenerator`] seeded there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label{}", self.0)
    }
}

/// Mints fresh labels from a monotonically increasing counter.
#[derive(Debug, Clone)]
pub struct LabelGenerator {
    next: u32,
}

impl LabelGenerator {
    pub fn new(first: u32) -> Self {
        Self { next: first }
    }

    /// A label that has never been returned by this generator.
    pub fn fresh(&mut self) -> Label {
        let label = Label(self.next);
        self.next += 1;
        label
    }

    /// Number of the next label to be minted.
    pub fn peek(&self) -> u32 {
        self.next
    }
}
