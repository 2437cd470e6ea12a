use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::Arc,
};

use anyhow::{bail, Context};
use heapdb_catalog::{ColumnSchema, TableId, TableSchema};
use heapdb_storage::{HeapFile, Tuple};
use heapdb_types::{DataType, SqlValue};
use tracing::info;

/// Parse a `int,string,...` column type list.
pub fn parse_types(list: &str) -> anyhow::Result<Vec<DataType>> {
    list.split(',')
        .map(|t| match t.trim().to_ascii_lowercase().as_str() {
            "int" => Ok(DataType::Integer),
            "string" => Ok(DataType::string()),
            other => bail!("unknown column type '{}' (expected int or string)", other),
        })
        .collect()
}

/// Convert comma-separated text rows into a heap file.
///
/// Returns `(tuples, pages)` written.
pub fn convert(input: &Path, types: &[DataType], output: &Path) -> anyhow::Result<(usize, usize)> {
    let columns =
        types.iter().enumerate().map(|(i, t)| ColumnSchema::new(format!("field{}", i), *t)).collect();
    let schema = Arc::new(TableSchema::new("converted", columns));

    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?,
    );
    let mut tuples = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read '{}'", input.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        tuples.push(parse_row(&line, types).with_context(|| format!("line {}", line_number + 1))?);
    }

    let file = HeapFile::create(output)
        .with_context(|| format!("Failed to create '{}'", output.display()))?;
    let count = tuples.len();
    let pages = file.append_tuples(TableId(0), &schema, tuples)?;
    info!(tuples = count, pages, output = %output.display(), "converted heap file");
    Ok((count, pages))
}

fn parse_row(line: &str, types: &[DataType]) -> anyhow::Result<Tuple> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != types.len() {
        bail!("expected {} fields, found {}", types.len(), fields.len());
    }
    let values = fields
        .iter()
        .zip(types)
        .map(|(text, data_type)| {
            SqlValue::parse_as(text, data_type)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not a valid {}", text.trim(), data_type))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Tuple::new(values))
}
