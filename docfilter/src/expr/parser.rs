//! Parser for filter expressions.

use crate::condition::{Condition, ExactMatch, Field, Filter, Operator};
use crate::value::Value;
use crate::{Error, Result};

/// One parsed clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `field<op>value` or `field:name=value`
    Compare {
        field: String,
        op: Operator,
        value: Value,
    },
    /// `field==value`
    Exact { field: String, value: Value },
    /// `field{ ... }`
    ElemMatch { field: String, scope: Scope },
}

impl Clause {
    /// The field the clause applies to.
    pub fn field(&self) -> &str {
        match self {
            Clause::Compare { field, .. }
            | Clause::Exact { field, .. }
            | Clause::ElemMatch { field, .. } => field,
        }
    }
}

/// Body of an element-match scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    /// Operators every matching element must satisfy.
    pub ops: Vec<(Operator, Value)>,
    /// Inner scope for arrays of arrays. A later `{...}` replaces an earlier one.
    pub nested: Option<Box<Scope>>,
}

/// Parse an expression straight into a [`Filter`].
pub fn parse_filter(input: &str) -> Result<Filter> {
    let clauses = parse_clauses(input)?;
    build_filter(&clauses)
}

/// Parse an expression into clauses.
pub fn parse_clauses(input: &str) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();
    let mut remaining = input;

    loop {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }
        let (clause, rest) = parse_clause(input, remaining)?;
        clauses.push(clause);
        remaining = rest;
    }

    Ok(clauses)
}

/// Byte offset of `rest` within `input`.
fn offset(input: &str, rest: &str) -> usize {
    input.len() - rest.len()
}

fn error(input: &str, rest: &str, message: impl Into<String>) -> Error {
    Error::Parse {
        pos: offset(input, rest),
        message: message.into(),
    }
}

/// Parse one clause starting at `s`.
fn parse_clause<'a>(input: &str, s: &'a str) -> Result<(Clause, &'a str)> {
    let name_end = s
        .find(|c: char| c.is_whitespace() || "=!<>:{}".contains(c))
        .unwrap_or(s.len());
    if name_end == 0 {
        return Err(error(input, s, "expected field name"));
    }
    let field = s[..name_end].to_string();
    let after = &s[name_end..];

    // Exact match: field==value
    if let Some(value_str) = after.strip_prefix("==") {
        let (value, rest) = parse_value(input, value_str)?;
        return Ok((Clause::Exact { field, value }, rest));
    }

    // Element match: field{ ... }
    if let Some(body) = after.strip_prefix('{') {
        let (scope, rest) = parse_scope(input, body)?;
        return Ok((Clause::ElemMatch { field, scope }, rest));
    }

    // Named operator: field:name=value
    if let Some(named) = after.strip_prefix(':') {
        let ((op, value), rest) = parse_named(input, named)?;
        return Ok((Clause::Compare { field, op, value }, rest));
    }

    // Comparison: field<op>value
    match try_parse_op(after) {
        Some((op, value_str)) => {
            let (value, rest) = parse_value(input, value_str)?;
            Ok((Clause::Compare { field, op, value }, rest))
        }
        None => Err(error(input, after, format!("expected operator after {:?}", field))),
    }
}

/// Parse the inside of `{ ... }`, returning the input after the closing brace.
fn parse_scope<'a>(input: &str, s: &'a str) -> Result<(Scope, &'a str)> {
    let mut scope = Scope::default();
    let mut remaining = s;

    loop {
        remaining = remaining.trim_start();

        if let Some(rest) = remaining.strip_prefix('}') {
            return Ok((scope, rest));
        }
        if remaining.is_empty() {
            return Err(error(input, remaining, "unclosed '{'"));
        }

        if let Some(body) = remaining.strip_prefix('{') {
            let (nested, rest) = parse_scope(input, body)?;
            scope.nested = Some(Box::new(nested));
            remaining = rest;
            continue;
        }

        if let Some(named) = remaining.strip_prefix(':') {
            let (pair, rest) = parse_named(input, named)?;
            scope.ops.push(pair);
            remaining = rest;
            continue;
        }

        match try_parse_op(remaining) {
            Some((op, value_str)) => {
                let (value, rest) = parse_value(input, value_str)?;
                scope.ops.push((op, value));
                remaining = rest;
            }
            None => return Err(error(input, remaining, "expected operator inside '{'")),
        }
    }
}

/// Try to parse a comparison operator (two-char operators first).
fn try_parse_op(s: &str) -> Option<(Operator, &str)> {
    const OPS: [(&str, Operator); 7] = [
        (">=", Operator::Gte),
        ("<=", Operator::Lte),
        ("<>", Operator::Ne),
        ("!=", Operator::Ne),
        ("=", Operator::Eq),
        (">", Operator::Gt),
        ("<", Operator::Lt),
    ];

    OPS.iter()
        .find_map(|(token, op)| s.strip_prefix(*token).map(|rest| (*op, rest)))
}

/// Parse `name=value` after a ':'.
fn parse_named<'a>(input: &str, s: &'a str) -> Result<((Operator, Value), &'a str)> {
    let name_end = s.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(s.len());
    let name = &s[..name_end];

    let op = match name {
        "in" => Operator::In,
        "nin" => Operator::Nin,
        "all" => Operator::All,
        "size" => Operator::Size,
        "exists" => Operator::Exists,
        _ => return Err(error(input, s, format!("unknown operator {:?}", name))),
    };

    let after = &s[name_end..];
    let Some(value_str) = after.strip_prefix('=') else {
        return Err(error(input, after, format!("expected '=' after :{}", name)));
    };
    let (value, rest) = parse_value(input, value_str)?;

    if let Some(problem) = operand_problem(op, &value) {
        return Err(error(input, value_str, format!(":{} {}", name, problem)));
    }

    Ok(((op, value), rest))
}

/// Parse a value, stopping at whitespace or at a '}' closing the scope.
fn parse_value<'a>(input: &str, s: &'a str) -> Result<(Value, &'a str)> {
    let end = find_value_end(s);
    if end == 0 {
        return Err(error(input, s, "expected value"));
    }
    Ok((parse_literal(&s[..end]), &s[end..]))
}

fn find_value_end(s: &str) -> usize {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' if depth > 0 => depth -= 1,
            // Closes the enclosing scope
            '}' => return i,
            c if c.is_whitespace() && depth == 0 => return i,
            _ => {}
        }
    }
    s.len()
}

/// JSON if it parses, a list of literals for `[a,b]`, otherwise a string.
fn parse_literal(raw: &str) -> Value {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(raw) {
        return Value::from(json);
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let items = split_top_level(inner)
            .into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(parse_literal)
            .collect();
        return Value::Array(items);
    }
    Value::String(raw.to_string())
}

/// Split on commas that are not nested in brackets.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Why `value` cannot be the operand of `op`, if it cannot.
fn operand_problem(op: Operator, value: &Value) -> Option<&'static str> {
    match op {
        Operator::Size if value.as_i64().is_none() => Some("takes an integer"),
        Operator::Exists if value.as_bool().is_none() => Some("takes true or false"),
        Operator::ElemMatch => Some("is written as a braced scope"),
        _ => None,
    }
}

/// Builder state for one field while clauses are applied.
enum Built {
    Field(Field),
    Exact(ExactMatch),
}

impl Built {
    fn into_field(self) -> Field {
        match self {
            Built::Field(f) => f,
            // A later operator clause replaces an exact match.
            Built::Exact(e) => Field::new(e.key()),
        }
    }
}

/// Turn clauses into one condition per field, in order of first appearance.
///
/// Fails with [`Error::InvalidOperand`] when a clause carries an operand its
/// operator cannot take.
pub fn build_conditions(clauses: &[Clause]) -> Result<Vec<Box<dyn Condition>>> {
    let mut built: Vec<(String, Built)> = Vec::new();

    for clause in clauses {
        let key = clause.field();
        let idx = match built.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                built.push((key.to_string(), Built::Field(Field::new(key))));
                built.len() - 1
            }
        };
        let slot = &mut built[idx].1;
        let current = std::mem::replace(slot, Built::Field(Field::new(key)));
        *slot = apply_clause(current, clause)?;
    }

    Ok(built
        .into_iter()
        .map(|(_, b)| -> Box<dyn Condition> {
            match b {
                Built::Field(f) => Box::new(f),
                Built::Exact(e) => Box::new(e),
            }
        })
        .collect())
}

/// Turn clauses into a merged [`Filter`].
pub fn build_filter(clauses: &[Clause]) -> Result<Filter> {
    let mut filter = Filter::new();
    for condition in build_conditions(clauses)? {
        filter.push(condition.as_ref());
    }
    Ok(filter)
}

fn apply_clause(current: Built, clause: &Clause) -> Result<Built> {
    match clause {
        Clause::Exact { value, .. } => Ok(Built::Exact(
            current.into_field().array_match(value.clone()),
        )),
        Clause::Compare { op, value, .. } => Ok(Built::Field(apply_op(
            current.into_field(),
            *op,
            value.clone(),
        )?)),
        Clause::ElemMatch { scope, .. } => {
            let opened = current.into_field().elem_match();
            Ok(Built::Field(apply_scope(opened, scope)?.end_elem_match()))
        }
    }
}

/// Apply a scope's operators, then open its nested scope. The caller closes
/// every level with a single `end_elem_match`.
fn apply_scope(mut field: Field, scope: &Scope) -> Result<Field> {
    for (op, value) in &scope.ops {
        field = apply_op(field, *op, value.clone())?;
    }
    match &scope.nested {
        Some(nested) => apply_scope(field.elem_match(), nested),
        None => Ok(field),
    }
}

fn apply_op(field: Field, op: Operator, value: Value) -> Result<Field> {
    if let Some(problem) = operand_problem(op, &value) {
        return Err(Error::InvalidOperand {
            op,
            message: format!("{}, got {}", problem, value),
        });
    }

    let field = match op {
        Operator::Eq => field.eq(value),
        Operator::Ne => field.neq(value),
        Operator::Gt => field.gt(value),
        Operator::Gte => field.gte(value),
        Operator::Lt => field.lt(value),
        Operator::Lte => field.lte(value),
        Operator::In => field.is_in(into_sequence(value)),
        Operator::Nin => field.not_in(into_sequence(value)),
        Operator::All => field.all(into_sequence(value)),
        Operator::Exists => match value.as_bool() {
            Some(present) => field.exists(present),
            None => field,
        },
        Operator::Size => match value.as_i64() {
            Some(len) => field.size(len),
            None => field,
        },
        // Checked above
        Operator::ElemMatch => field,
    };
    Ok(field)
}

fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
