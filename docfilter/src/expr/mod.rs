//! Filter expression micro-language.
//!
//! # Syntax Overview
//!
//! An expression is a whitespace separated list of clauses:
//!
//! - **Comparison**: `age>=18`, `name=ada`, `status!=done` (`<>` also works)
//! - **Named operators**: `tags:in=[a,b]`, `tags:nin=[x]`, `tags:all=[a,b]`,
//!   `tags:size=2`, `email:exists=false`
//! - **Exact match**: `tags==[a,b]` (order matters)
//! - **Element match**: `scores{>=80 <90}`, nested as `grid{:size=2 {>0}}`
//!
//! Values are JSON when they parse as JSON (`3`, `true`, `"a b"`, `[1,2]`),
//! otherwise bare strings. Clauses on the same field combine.

mod parser;

pub use parser::{build_conditions, build_filter, parse_clauses, parse_filter, Clause, Scope};
