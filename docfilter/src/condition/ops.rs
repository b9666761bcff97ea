//! Operator symbols understood by the target query engine.

use std::fmt;

/// A query operator with a fixed wire symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `$eq`: field equals value.
    Eq,
    /// `$ne`: field does not equal value.
    Ne,
    /// `$gt`
    Gt,
    /// `$gte`
    Gte,
    /// `$lt`
    Lt,
    /// `$lte`
    Lte,
    /// `$in`: field equals one of the candidates.
    In,
    /// `$nin`: field equals none of the candidates.
    Nin,
    /// `$exists`: field presence.
    Exists,
    /// `$all`: array field contains every listed element, in any order.
    All,
    /// `$size`: array field has exactly this many elements.
    Size,
    /// `$elemMatch`: some array element satisfies the nested conditions.
    ElemMatch,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::Nin,
        Operator::Exists,
        Operator::All,
        Operator::Size,
        Operator::ElemMatch,
    ];

    /// The operator's key in a condition document.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Exists => "$exists",
            Operator::All => "$all",
            Operator::Size => "$size",
            Operator::ElemMatch => "$elemMatch",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
