//! Per-field condition builder with nested element-match scopes.

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use super::exact::ExactMatch;
use super::ops::Operator;
use super::{is_legal_key, Condition};
use crate::value::{Document, Value};
use crate::Result;

/// Index of a node in a [`Field`]'s arena.
type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Value(Value),
    /// Element-match scope that has not been folded into its owner yet.
    Scope(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    key: String,
    entries: IndexMap<String, Operand>,
    /// Enclosing node. Only used to find where a closed scope folds.
    parent: Option<NodeId>,
}

impl Node {
    fn new(key: String, parent: Option<NodeId>) -> Self {
        Self {
            key,
            entries: IndexMap::new(),
            parent,
        }
    }

    /// A repeated key keeps its position.
    fn set(&mut self, key: &str, operand: Operand) {
        self.entries.insert(key.to_string(), operand);
    }
}

/// Conditions on one field, accumulated by chaining operator calls.
///
/// Every operator call adds `{ <op>: <value> }` to the field's condition
/// mapping; distinct operators combine with AND, a repeated operator replaces
/// its earlier value.
///
/// ```ignore
/// let doc = field("age").gte(18).lt(65).to_document();
/// // { "age": { "$gte": 18, "$lt": 65 } }
///
/// let doc = field("scores").elem_match().gte(80).lt(85).end_elem_match().to_document();
/// // { "scores": { "$elemMatch": { "$gte": 80, "$lt": 85 } } }
/// ```
///
/// [`elem_match`](Field::elem_match) and [`end_elem_match`](Field::end_elem_match)
/// must be paired. While a scope is open, operator calls and serialization
/// apply to the innermost scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    nodes: Vec<Node>,
    cursor: NodeId,
}

/// Start building conditions for `key`.
///
/// The key is not checked here; an illegal key makes
/// [`to_document`](Condition::to_document) drop the whole condition.
pub fn field(key: impl Into<String>) -> Field {
    Field::new(key)
}

impl Field {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(key.into(), None)],
            cursor: ROOT,
        }
    }

    fn with(mut self, op: Operator, value: impl Into<Value>) -> Self {
        self.nodes[self.cursor].set(op.symbol(), Operand::Value(value.into()));
        self
    }

    fn with_sequence<I, V>(self, op: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.with(op, Value::Array(items))
    }

    /// `{ <field>: { $eq: <value> } }`
    pub fn eq(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Eq, value)
    }

    /// `{ <field>: { $ne: <value> } }`
    pub fn neq(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Ne, value)
    }

    /// `{ <field>: { $gt: <value> } }`
    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Gt, value)
    }

    /// `{ <field>: { $gte: <value> } }`
    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Gte, value)
    }

    /// `{ <field>: { $lt: <value> } }`
    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Lt, value)
    }

    /// `{ <field>: { $lte: <value> } }`
    pub fn lte(self, value: impl Into<Value>) -> Self {
        self.with(Operator::Lte, value)
    }

    /// `{ <field>: { $in: [ <v1>, <v2>, ... ] } }`
    pub fn is_in<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_sequence(Operator::In, values)
    }

    /// `{ <field>: { $nin: [ <v1>, <v2>, ... ] } }`
    pub fn not_in<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_sequence(Operator::Nin, values)
    }

    /// `{ <field>: { $exists: <bool> } }`
    pub fn exists(self, present: bool) -> Self {
        self.with(Operator::Exists, present)
    }

    /// Type filtering is not supported; the field is returned unchanged.
    pub fn of_type(self, _type_name: impl Into<Value>) -> Self {
        self
    }

    /// `{ <field>: { $all: [ <v1>, <v2>, ... ] } }`
    ///
    /// Matches arrays containing every listed element regardless of order or
    /// of other elements. The list is stored in the given order.
    pub fn all<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_sequence(Operator::All, values)
    }

    /// `{ <field>: { $size: <len> } }`
    ///
    /// The length is passed through as given, negative values included.
    pub fn size(self, len: i64) -> Self {
        self.with(Operator::Size, len)
    }

    /// Open an element-match scope on the current node.
    ///
    /// The returned builder targets the new scope: following operator calls
    /// describe what a single array element must satisfy.
    pub fn elem_match(mut self) -> Self {
        let key = Operator::ElemMatch.symbol();
        let id = self.nodes.len();
        self.nodes.push(Node::new(key.to_string(), Some(self.cursor)));
        self.nodes[self.cursor].set(key, Operand::Scope(id));
        self.cursor = id;
        self
    }

    /// Close element-match scopes, folding each into its owner up to the root.
    ///
    /// Without an open scope this does nothing.
    pub fn end_elem_match(mut self) -> Self {
        if self.nodes[self.cursor].parent.is_none() {
            debug!(
                "end_elem_match on {:?} with no open scope, ignoring",
                self.nodes[self.cursor].key
            );
            return self;
        }

        while let Some(parent) = self.nodes[self.cursor].parent {
            let folded = self.resolve(self.cursor);
            let key = self.nodes[self.cursor].key.clone();
            self.nodes[parent].set(&key, Operand::Value(Value::Document(folded)));
            self.cursor = parent;
        }

        // Only the root is still referenced.
        self.nodes.truncate(1);
        self
    }

    /// Replace the field's conditions with an exact value match.
    ///
    /// Conditions added so far are discarded; only the key of the current
    /// node carries over.
    pub fn array_match(self, value: impl Into<Value>) -> ExactMatch {
        ExactMatch::new(self.nodes[self.cursor].key.clone(), value)
    }

    /// Number of element-match scopes currently open.
    pub fn open_scopes(&self) -> usize {
        let mut depth = 0;
        let mut node = &self.nodes[self.cursor];
        while let Some(parent) = node.parent {
            depth += 1;
            node = &self.nodes[parent];
        }
        depth
    }

    /// True when no element-match scope is open.
    pub fn is_closed(&self) -> bool {
        self.cursor == ROOT
    }

    /// The condition mapping of the current node.
    pub fn conditions(&self) -> Document {
        self.resolve(self.cursor)
    }

    fn resolve(&self, id: NodeId) -> Document {
        self.nodes[id]
            .entries
            .iter()
            .map(|(key, operand)| {
                let value = match operand {
                    Operand::Value(v) => v.clone(),
                    Operand::Scope(child) => Value::Document(self.resolve(*child)),
                };
                (key.clone(), value)
            })
            .collect()
    }

    fn note_open_scopes(&self) {
        let depth = self.open_scopes();
        if depth > 0 {
            debug!(
                "serializing {:?} with {} element-match scope(s) still open",
                self.nodes[self.cursor].key, depth
            );
        }
    }
}

#[derive(Serialize)]
struct WireField<'a> {
    key: &'a str,
    value: Document,
}

impl Condition for Field {
    fn key(&self) -> &str {
        &self.nodes[self.cursor].key
    }

    fn to_document(&self) -> Document {
        self.note_open_scopes();
        let key = self.key();
        let mut doc = Document::new();
        if !is_legal_key(key) {
            debug!("dropping condition on illegal key {:?}", key);
            return doc;
        }
        doc.insert(key, self.conditions());
        doc
    }

    fn to_wire(&self) -> Result<String> {
        self.note_open_scopes();
        let wire = WireField {
            key: self.key(),
            value: self.conditions(),
        };
        Ok(serde_json::to_string(&wire)?)
    }
}
