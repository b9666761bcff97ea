//! Per-collection convenience wrapper over a [`DataHandler`].

use crate::handler::{DataHandler, FindOptions};
use crate::value::Document;
use crate::Result;

/// A named collection bound to a handler.
pub struct Collection<'h, H: DataHandler> {
    handler: &'h mut H,
    name: String,
    id_field: String,
}

impl<'h, H: DataHandler> Collection<'h, H> {
    pub fn new(handler: &'h mut H, name: impl Into<String>) -> Self {
        Self {
            handler,
            name: name.into(),
            id_field: "id".to_string(),
        }
    }

    /// Use a different field for allocated ids.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocate an id, store it in the id field and insert the document.
    pub fn create(&mut self, mut document: Document) -> Result<i64> {
        let id = self.handler.next_id(&self.name)?;
        document.insert(self.id_field.clone(), id);
        self.handler.insert(&self.name, document)?;
        Ok(id)
    }

    pub fn delete(&mut self, condition: &Document) -> Result<usize> {
        self.handler.delete_by_condition(&self.name, condition)
    }

    pub fn update(&mut self, patch: &Document, condition: &Document) -> Result<usize> {
        self.handler.update_by_condition(&self.name, patch, condition)
    }

    pub fn get_one(&self, condition: &Document) -> Result<Option<Document>> {
        self.handler.find_one(&self.name, &[], condition)
    }

    pub fn get_many(
        &self,
        fields: &[String],
        condition: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        self.handler.find_many(&self.name, fields, condition, options)
    }

    pub fn count(&self, condition: &Document) -> Result<usize> {
        self.handler.count(&self.name, condition)
    }
}
