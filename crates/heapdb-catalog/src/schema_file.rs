//! Catalog schema files.
//!
//! One table per line:
//!
//! ```text
//! users (id int pk, name string)
//! orders (id int, user_id int, note string)
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use heapdb_types::DataType;

use crate::{errors::CatalogError, ColumnSchema, TableSchema};

/// Parse the contents of a schema file into table schemas, in file order.
pub fn parse_schema_file(contents: &str) -> Result<Vec<TableSchema>, CatalogError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| parse_table_line(idx + 1, line))
        .collect()
}

fn parse_table_line(line_no: usize, line: &str) -> Result<TableSchema, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidSchemaLine { line: line_no, reason };

    let open = line.find('(').ok_or_else(|| invalid("missing '('".to_string()))?;
    let close = line.rfind(')').ok_or_else(|| invalid("missing ')'".to_string()))?;
    if close < open {
        return Err(invalid("')' before '('".to_string()));
    }

    let name = line[..open].trim();
    if name.is_empty() {
        return Err(invalid("missing table name".to_string()));
    }

    let mut columns = Vec::new();
    let mut primary_key = None;
    for field in line[open + 1..close].split(',') {
        let parts: Vec<&str> = field.split_whitespace().collect();
        let (column, type_name, annotation) = match parts.as_slice() {
            [column, type_name] => (*column, *type_name, None),
            [column, type_name, annotation] => (*column, *type_name, Some(*annotation)),
            _ => return Err(invalid(format!("cannot parse field '{}'", field.trim()))),
        };

        let data_type = match type_name.to_ascii_lowercase().as_str() {
            "int" => DataType::Integer,
            "string" => DataType::string(),
            other => return Err(invalid(format!("unknown type '{}'", other))),
        };

        match annotation {
            None => {}
            Some("pk") => primary_key = Some(column.to_string()),
            Some(other) => return Err(invalid(format!("unknown annotation '{}'", other))),
        }

        columns.push(ColumnSchema::new(column, data_type));
    }

    Ok(TableSchema { name: name.to_string(), columns, primary_key })
}
