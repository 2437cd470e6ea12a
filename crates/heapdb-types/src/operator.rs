//! Comparison operators for single-column predicates

use std::{fmt, str::FromStr};

/// Operator of a `column OP literal` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl ComparisonOp {
    /// All operators, in declaration order.
    pub const ALL: [ComparisonOp; 6] = [
        ComparisonOp::Equal,
        ComparisonOp::NotEqual,
        ComparisonOp::Greater,
        ComparisonOp::GreaterOrEqual,
        ComparisonOp::Less,
        ComparisonOp::LessOrEqual,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessOrEqual => "<=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Error returned when an operator symbol is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown comparison operator '{0}'")]
pub struct ParseOperatorError(pub String);

impl FromStr for ComparisonOp {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(ComparisonOp::Equal),
            "<>" | "!=" => Ok(ComparisonOp::NotEqual),
            ">" => Ok(ComparisonOp::Greater),
            ">=" => Ok(ComparisonOp::GreaterOrEqual),
            "<" => Ok(ComparisonOp::Less),
            "<=" => Ok(ComparisonOp::LessOrEqual),
            other => Err(ParseOperatorError(other.to_string())),
        }
    }
}
