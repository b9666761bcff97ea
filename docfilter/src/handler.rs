//! Data-access interface that executes filter documents.
//!
//! A `condition` argument is always a filter document as produced by
//! [`Condition::to_document`](crate::Condition::to_document) or
//! [`Filter::to_document`](crate::Filter::to_document).

use std::cmp::Ordering;
use std::fmt;

use crate::value::Document;
use crate::{Error, Result};

/// Storage operations over named collections of documents.
pub trait DataHandler {
    /// Insert one document.
    fn insert(&mut self, collection: &str, document: Document) -> Result<()>;

    /// Remove every matching document. Returns the number removed.
    fn delete_by_condition(&mut self, collection: &str, condition: &Document) -> Result<usize>;

    /// Set the patch's fields on every matching document. Returns the number
    /// of documents matched.
    fn update_by_condition(
        &mut self,
        collection: &str,
        patch: &Document,
        condition: &Document,
    ) -> Result<usize>;

    /// First matching document, projected to `fields` (all fields when empty).
    fn find_one(
        &self,
        collection: &str,
        fields: &[String],
        condition: &Document,
    ) -> Result<Option<Document>>;

    /// Matching documents, sorted, then skipped and limited.
    fn find_many(
        &self,
        collection: &str,
        fields: &[String],
        condition: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>>;

    /// Number of matching documents.
    fn count(&self, collection: &str, condition: &Document) -> Result<usize>;

    /// Allocate the next auto-increment id for a collection.
    fn next_id(&mut self, collection: &str) -> Result<i64>;
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    #[default]
    Asc,
    Desc,
}

impl Dir {
    /// Apply this direction to an ascending ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }
}

/// One sort clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub dir: Dir,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: Dir::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: Dir::Desc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dir {
            Dir::Asc => write!(f, "{}", self.field),
            Dir::Desc => write!(f, "-{}", self.field),
        }
    }
}

/// Sort, skip and limit for [`DataHandler::find_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub skip: usize,
    /// `None` means no limit.
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Parse a sort spec like `"name,-age,+id"`.
    ///
    /// A leading `-` sorts descending; `+` or no prefix sorts ascending.
    /// Blank entries are skipped.
    pub fn parse_sort(spec: &str) -> Result<Vec<SortKey>> {
        let mut keys = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let key = if let Some(name) = part.strip_prefix('-') {
                SortKey::desc(name)
            } else {
                SortKey::asc(part.strip_prefix('+').unwrap_or(part))
            };
            if key.field.is_empty() {
                return Err(Error::Parse {
                    pos: spec.find(part).unwrap_or(0),
                    message: format!("sort key {:?} has no field name", part),
                });
            }
            keys.push(key);
        }
        Ok(keys)
    }
}
