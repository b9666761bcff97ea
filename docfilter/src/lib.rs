//! docfilter: fluent builder for MongoDB-style filter documents.
//!
//! Conditions are built per field, serialized to a filter document and handed
//! to a [`DataHandler`] for execution. A file-backed [`Store`] implements the
//! handler for local use.

pub mod collection;
pub mod condition;
pub mod config;
pub mod error;
pub mod expr;
pub mod handler;
pub mod store;
pub mod value;

pub use collection::Collection;
pub use condition::{field, Condition, ExactMatch, Field, Filter, Operator};
pub use config::Config;
pub use error::{Error, Result};
pub use expr::{build_conditions, build_filter, parse_clauses, parse_filter};
pub use handler::{DataHandler, Dir, FindOptions, SortKey};
pub use store::Store;
pub use value::{Document, Value};
