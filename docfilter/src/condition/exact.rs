//! Exact value match on a field.

use log::debug;
use serde::Serialize;

use super::{is_legal_key, Condition};
use crate::value::{Document, Value};
use crate::Result;

/// A field bound directly to a literal: `{ <field>: <value> }`.
///
/// Produced by [`Field::array_match`](super::Field::array_match). For arrays
/// the match is exact, element order included. No further operators can be
/// added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactMatch {
    key: String,
    value: Value,
}

impl ExactMatch {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Condition for ExactMatch {
    fn key(&self) -> &str {
        &self.key
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if !is_legal_key(&self.key) {
            debug!("dropping exact match on illegal key {:?}", self.key);
            return doc;
        }
        doc.insert(self.key.clone(), self.value.clone());
        doc
    }

    fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
