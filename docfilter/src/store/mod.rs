//! Store - a file-backed [`DataHandler`] over document collections.
//!
//! Collections are held in memory and persisted as JSON lines, one file per
//! collection, next to a file of auto-increment counters.

mod atomic;
pub mod matcher;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;

use log::debug;

use crate::handler::{DataHandler, FindOptions};
use crate::value::{Document, Value};
use crate::config::check_collection_name;
use crate::{Config, Error, Result};

pub use matcher::{canonical_cmp, matches};

static MISSING: Value = Value::Null;

/// In-memory collections with optional persistence under the config root.
#[derive(Debug)]
pub struct Store {
    config: Config,
    collections: BTreeMap<String, Vec<Document>>,
    sequences: BTreeMap<String, i64>,
}

impl Store {
    /// Create an empty store. Nothing is read from disk.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            collections: BTreeMap::new(),
            sequences: BTreeMap::new(),
        }
    }

    /// Open a store, loading any collections saved under the config root.
    pub fn open(config: Config) -> Result<Self> {
        let mut store = Self::new(config);
        store.load_collections()?;
        store.load_sequences()?;
        Ok(store)
    }

    /// Get config reference.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names of all known collections, sorted.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Write every collection and the id counters to disk.
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(self.config.collections_dir())?;

        for (name, documents) in &self.collections {
            let mut content = String::new();
            for document in documents {
                content.push_str(&document.to_json_string()?);
                content.push('\n');
            }
            atomic::write_file(&self.config.collection_path(name)?, content.as_bytes())?;
        }

        let sequences = serde_json::to_vec_pretty(&self.sequences)?;
        atomic::write_file(&self.config.sequences_path(), &sequences)?;

        debug!(
            "saved {} collection(s) to {}",
            self.collections.len(),
            self.config.root.display()
        );
        Ok(())
    }

    fn load_collections(&mut self) -> Result<()> {
        let dir = self.config.collections_dir();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let contents = fs::read_to_string(&path)?;
            let mut documents = Vec::new();
            for (lineno, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let document: Document = serde_json::from_str(line).map_err(|e| {
                    Error::Storage(format!("{}:{}: {}", path.display(), lineno + 1, e))
                })?;
                documents.push(document);
            }

            debug!("loaded {} document(s) into {}", documents.len(), name);
            self.collections.insert(name.to_string(), documents);
        }
        Ok(())
    }

    fn load_sequences(&mut self) -> Result<()> {
        let path = self.config.sequences_path();
        if !path.exists() {
            return Ok(());
        }
        let contents = fs::read_to_string(&path)?;
        self.sequences = serde_json::from_str(&contents)
            .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    fn documents(&self, collection: &str) -> &[Document] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn matching<'a>(
        &'a self,
        collection: &str,
        condition: &'a Document,
    ) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents(collection)
            .iter()
            .filter(move |document| matches(document, condition))
    }
}

impl DataHandler for Store {
    fn insert(&mut self, collection: &str, document: Document) -> Result<()> {
        check_collection_name(collection)?;
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    fn delete_by_condition(&mut self, collection: &str, condition: &Document) -> Result<usize> {
        let Some(documents) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|document| !matches(document, condition));
        Ok(before - documents.len())
    }

    fn update_by_condition(
        &mut self,
        collection: &str,
        patch: &Document,
        condition: &Document,
    ) -> Result<usize> {
        let Some(documents) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut updated = 0;
        for document in documents.iter_mut().filter(|d| matches(d, condition)) {
            for (key, value) in patch.iter() {
                document.insert(key, value.clone());
            }
            updated += 1;
        }
        Ok(updated)
    }

    fn find_one(
        &self,
        collection: &str,
        fields: &[String],
        condition: &Document,
    ) -> Result<Option<Document>> {
        Ok(self
            .matching(collection, condition)
            .next()
            .map(|document| document.project(fields)))
    }

    fn find_many(
        &self,
        collection: &str,
        fields: &[String],
        condition: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        let mut results: Vec<&Document> = self.matching(collection, condition).collect();

        if !options.sort.is_empty() {
            results.sort_by(|a, b| {
                for key in &options.sort {
                    let left = a.get_path(&key.field).unwrap_or(&MISSING);
                    let right = b.get_path(&key.field).unwrap_or(&MISSING);
                    let ordering = key.dir.apply(canonical_cmp(left, right));
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let limit = options
            .limit
            .or(self.config.default_limit)
            .unwrap_or(usize::MAX);

        Ok(results
            .into_iter()
            .skip(options.skip)
            .take(limit)
            .map(|document| document.project(fields))
            .collect())
    }

    fn count(&self, collection: &str, condition: &Document) -> Result<usize> {
        Ok(self.matching(collection, condition).count())
    }

    fn next_id(&mut self, collection: &str) -> Result<i64> {
        check_collection_name(collection)?;
        let counter = self.sequences.entry(collection.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
