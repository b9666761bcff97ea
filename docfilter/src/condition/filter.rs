//! Merging several conditions into one filter document.

use super::Condition;
use crate::value::Document;

/// A conjunction of conditions on distinct fields.
///
/// A later condition on the same key replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    document: Document,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, builder style.
    pub fn and(mut self, condition: impl Condition) -> Self {
        self.push(&condition);
        self
    }

    pub fn push(&mut self, condition: &dyn Condition) {
        self.document.merge(condition.to_document());
    }

    /// Number of fields constrained.
    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    pub fn to_document(&self) -> Document {
        self.document.clone()
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

impl From<Filter> for Document {
    fn from(filter: Filter) -> Self {
        filter.document
    }
}
