use std::str::FromStr;

use heapdb_types::ComparisonOp;

/// A `table.column OP literal` predicate given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub table: String,
    pub column: String,
    pub op: ComparisonOp,
    /// Literal text with surrounding quotes removed.
    pub literal: String,
}

impl FromStr for Predicate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let is_op_char = |c: char| matches!(c, '<' | '>' | '=' | '!');
        let op_start = s
            .find(is_op_char)
            .ok_or_else(|| anyhow::anyhow!("no comparison operator in '{}'", s))?;
        let op_len = s[op_start..].find(|c: char| !is_op_char(c)).unwrap_or(s.len() - op_start);

        let (lhs, rest) = s.split_at(op_start);
        let (op, literal) = rest.split_at(op_len);
        let (table, column) = lhs
            .trim()
            .split_once('.')
            .ok_or_else(|| anyhow::anyhow!("expected table.column before '{}' in '{}'", op, s))?;
        if table.is_empty() || column.is_empty() {
            anyhow::bail!("expected table.column before '{}' in '{}'", op, s);
        }

        let literal = literal.trim();
        if literal.is_empty() {
            anyhow::bail!("missing literal after '{}' in '{}'", op, s);
        }

        Ok(Predicate {
            table: table.to_string(),
            column: column.to_string(),
            op: op.parse()?,
            literal: unquote(literal).to_string(),
        })
    }
}

fn unquote(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return inner;
        }
    }
    text
}
