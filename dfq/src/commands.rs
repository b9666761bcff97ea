//! CLI command implementations.

use std::io::{self, Read};
use std::path::Path;

use docfilter::{
    build_conditions, build_filter, parse_clauses, parse_filter, Collection, Config, DataHandler,
    Document, Error, FindOptions, Store, Value,
};
use log::debug;

/// Options for `dfq find`.
pub struct FindArgs {
    pub fields: Vec<String>,
    pub sort: Option<String>,
    pub skip: usize,
    pub limit: Option<usize>,
    pub one: bool,
}

fn load_config(root: Option<&Path>) -> docfilter::Result<Config> {
    match root {
        Some(root) => Config::load_from(root),
        None => Config::load(),
    }
}

fn open_store(root: Option<&Path>) -> docfilter::Result<Store> {
    let config = load_config(root)?;
    debug!("opening store at {}", config.root.display());
    Store::open(config)
}

/// Print the filter document for an expression.
pub fn filter(expr: &str, wire: bool) -> docfilter::Result<()> {
    let clauses = parse_clauses(expr)?;

    if wire {
        for condition in build_conditions(&clauses)? {
            println!("{}", condition.to_wire()?);
        }
        return Ok(());
    }

    let document = build_filter(&clauses)?.into_document();
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Insert documents from a file or stdin, printing the allocated ids.
pub fn insert(root: Option<&Path>, collection: &str, file: Option<&Path>) -> docfilter::Result<()> {
    let input = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let documents = parse_documents(&input)?;

    let mut store = open_store(root)?;
    let id_field = store.config().id_field.clone();

    let ids = {
        let mut target = Collection::new(&mut store, collection).with_id_field(id_field);
        documents
            .into_iter()
            .map(|document| target.create(document))
            .collect::<docfilter::Result<Vec<i64>>>()?
    };
    store.save()?;

    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

/// Accepts one JSON object, a JSON array of objects, or JSON lines.
fn parse_documents(input: &str) -> docfilter::Result<Vec<Document>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return match value {
            Value::Document(document) => Ok(vec![document]),
            Value::Array(items) => items.into_iter().map(expect_document).collect(),
            other => expect_document(other).map(|d| vec![d]),
        };
    }

    let mut documents = Vec::new();
    let mut pos = 0;
    for line in input.lines() {
        if !line.trim().is_empty() {
            let document: Document = serde_json::from_str(line).map_err(|e| Error::Parse {
                pos,
                message: e.to_string(),
            })?;
            documents.push(document);
        }
        pos += line.len() + 1;
    }
    Ok(documents)
}

fn expect_document(value: Value) -> docfilter::Result<Document> {
    match value {
        Value::Document(document) => Ok(document),
        other => Err(Error::Parse {
            pos: 0,
            message: format!("expected an object, found {}", other.type_name()),
        }),
    }
}

/// Print matching documents as JSON lines.
pub fn find(root: Option<&Path>, collection: &str, expr: &str, args: &FindArgs) -> docfilter::Result<()> {
    let condition = parse_filter(expr)?.into_document();
    let store = open_store(root)?;

    if args.one {
        if let Some(document) = store.find_one(collection, &args.fields, &condition)? {
            println!("{}", document.to_json_string()?);
        }
        return Ok(());
    }

    let mut options = FindOptions::new().skip(args.skip);
    if let Some(spec) = &args.sort {
        options.sort = FindOptions::parse_sort(spec)?;
    }
    options.limit = args.limit;

    for document in store.find_many(collection, &args.fields, &condition, &options)? {
        println!("{}", document.to_json_string()?);
    }
    Ok(())
}

pub fn count(root: Option<&Path>, collection: &str, expr: &str) -> docfilter::Result<()> {
    let condition = parse_filter(expr)?.into_document();
    let store = open_store(root)?;
    println!("{}", store.count(collection, &condition)?);
    Ok(())
}

/// Merge the `--set` object into every matching document.
pub fn update(root: Option<&Path>, collection: &str, expr: &str, set: &str) -> docfilter::Result<()> {
    let condition = parse_filter(expr)?.into_document();
    let patch: Document = serde_json::from_str(set).map_err(|e| Error::Parse {
        pos: 0,
        message: format!("--set: {}", e),
    })?;

    let mut store = open_store(root)?;
    let updated = store.update_by_condition(collection, &patch, &condition)?;
    store.save()?;

    println!("Updated {} document(s)", updated);
    Ok(())
}

pub fn delete(root: Option<&Path>, collection: &str, expr: &str) -> docfilter::Result<()> {
    let condition = parse_filter(expr)?.into_document();
    let mut store = open_store(root)?;
    let deleted = store.delete_by_condition(collection, &condition)?;
    store.save()?;

    println!("Deleted {} document(s)", deleted);
    Ok(())
}

/// Show the configuration, optionally writing it out first.
pub fn config(root: Option<&Path>, init: bool) -> docfilter::Result<()> {
    let config = load_config(root)?;

    if init {
        if config.config_path().exists() {
            println!("Config already exists at {}", config.config_path().display());
        } else {
            config.save()?;
            println!("Wrote {}", config.config_path().display());
        }
    }

    println!("root = {}", config.root.display());
    println!("id_field = {}", config.id_field);
    match config.default_limit {
        Some(limit) => println!("default_limit = {}", limit),
        None => println!("default_limit = (none)"),
    }
    Ok(())
}
