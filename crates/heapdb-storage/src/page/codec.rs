// ============================================================================
// Row Encoding
// ============================================================================
//
// Fields are written back to back in column order:
// - INTEGER: 4 bytes, big-endian two's complement
// - VARCHAR(n): 4-byte big-endian length, then n bytes of UTF-8 padded with zeros

use heapdb_catalog::TableSchema;
use heapdb_types::{DataType, SqlValue, INTEGER_WIDTH, STRING_LENGTH_PREFIX};

/// Write one row into `slot`, which must be exactly `schema.row_width()` bytes.
///
/// The values must already have been checked against the schema.
pub(crate) fn write_row(slot: &mut [u8], schema: &TableSchema, values: &[SqlValue]) {
    let mut offset = 0;
    for (column, value) in schema.columns.iter().zip(values) {
        let width = column.data_type.byte_width();
        let field = &mut slot[offset..offset + width];
        match value {
            SqlValue::Integer(v) => field.copy_from_slice(&v.to_be_bytes()),
            SqlValue::Varchar(s) => {
                let bytes = s.as_bytes();
                field[..STRING_LENGTH_PREFIX].copy_from_slice(&(bytes.len() as u32).to_be_bytes());
                field[STRING_LENGTH_PREFIX..STRING_LENGTH_PREFIX + bytes.len()]
                    .copy_from_slice(bytes);
                field[STRING_LENGTH_PREFIX + bytes.len()..].fill(0);
            }
        }
        offset += width;
    }
}

/// Parse one row out of `slot`. Errors carry a human-readable reason.
pub(crate) fn read_row(slot: &[u8], schema: &TableSchema) -> Result<Vec<SqlValue>, String> {
    let mut values = Vec::with_capacity(schema.column_count());
    let mut offset = 0;
    for (idx, column) in schema.columns.iter().enumerate() {
        let width = column.data_type.byte_width();
        let field = slot
            .get(offset..offset + width)
            .ok_or_else(|| format!("row truncated at column {}", idx))?;
        values.push(read_field(field, &column.data_type).map_err(|e| format!("column {}: {}", idx, e))?);
        offset += width;
    }
    Ok(values)
}

fn read_field(field: &[u8], data_type: &DataType) -> Result<SqlValue, String> {
    match data_type {
        DataType::Integer => {
            let bytes: [u8; INTEGER_WIDTH] =
                field.try_into().map_err(|_| "integer field has wrong width".to_string())?;
            Ok(SqlValue::Integer(i32::from_be_bytes(bytes)))
        }
        DataType::Varchar { max_length } => {
            let prefix: [u8; STRING_LENGTH_PREFIX] = field[..STRING_LENGTH_PREFIX]
                .try_into()
                .map_err(|_| "string length prefix truncated".to_string())?;
            let len = u32::from_be_bytes(prefix) as usize;
            if len > *max_length {
                return Err(format!(
                    "string length {} exceeds declared maximum {}",
                    len, max_length
                ));
            }
            let payload = &field[STRING_LENGTH_PREFIX..STRING_LENGTH_PREFIX + len];
            let s = std::str::from_utf8(payload)
                .map_err(|e| format!("string is not valid UTF-8: {}", e))?;
            Ok(SqlValue::Varchar(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use heapdb_catalog::ColumnSchema;

    use super::*;

    fn schema() -> TableSchema {
        TableSchema::new(
            "t",
            vec![
                ColumnSchema::new("id", DataType::Integer),
                ColumnSchema::new("name", DataType::Varchar { max_length: 8 }),
            ],
        )
    }

    #[test]
    fn test_row_bytes() {
        let schema = schema();
        let mut slot = vec![0xAA; schema.row_width()];
        write_row(&mut slot, &schema, &[SqlValue::Integer(-2), SqlValue::from("hi")]);

        assert_eq!(&slot[0..4], &[0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(&slot[4..8], &[0, 0, 0, 2]);
        assert_eq!(&slot[8..10], b"hi");
        assert!(slot[10..].iter().all(|&b| b == 0));

        let values = read_row(&slot, &schema).unwrap();
        assert_eq!(values, vec![SqlValue::Integer(-2), SqlValue::from("hi")]);
    }

    #[test]
    fn test_string_longer_than_declared_is_rejected() {
        let schema = schema();
        let mut slot = vec![0u8; schema.row_width()];
        slot[4..8].copy_from_slice(&9u32.to_be_bytes());

        let err = read_row(&slot, &schema).unwrap_err();
        assert!(err.contains("exceeds declared maximum"), "{}", err);
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let schema = schema();
        let mut slot = vec![0u8; schema.row_width()];
        slot[4..8].copy_from_slice(&1u32.to_be_bytes());
        slot[8] = 0xFF;

        assert!(read_row(&slot, &schema).unwrap_err().contains("UTF-8"));
    }
}
