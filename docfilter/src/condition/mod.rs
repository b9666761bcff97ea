//! Condition builders that produce filter documents.
//!
//! - [`Field`]: operator conditions on one field, with nested element-match
//!   scopes
//! - [`ExactMatch`]: a field bound to one literal value
//! - [`Filter`]: several conditions merged into one filter document

mod exact;
mod field;
mod filter;
mod ops;

pub use exact::ExactMatch;
pub use field::{field, Field};
pub use filter::Filter;
pub use ops::Operator;

use crate::value::Document;
use crate::Result;

/// A finished condition that can be serialized.
pub trait Condition {
    /// Field name the condition applies to.
    fn key(&self) -> &str;

    /// `{ <key>: <condition> }`, or an empty document if the key is illegal.
    fn to_document(&self) -> Document;

    /// JSON encoding of the condition's key and value, without legality checks.
    fn to_wire(&self) -> Result<String>;
}

/// Whether `key` may appear in a filter document.
pub(crate) fn is_legal_key(key: &str) -> bool {
    !key.is_empty()
}
