//! Row codec
//!
//! The column list is the authority for how many bits each value occupies;
//! the stream itself carries no per-value type information.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{DeltaError, Result};
use crate::schema::{Column, ColumnKind};

use super::{Row, Value, MAX_STRING_LEN};

/// Field size of an encoded string, terminator included
const STRING_FIELD_LEN: usize = MAX_STRING_LEN + 1;

/// Write `row`: presence mask, then each value in ascending column order
pub fn encode_row(writer: &mut BitWriter<'_>, row: &Row) -> Result<()> {
    writer.write_u64(row.mask())?;

    for (_, value) in row.values() {
        encode_value(writer, value)?;
    }
    Ok(())
}

/// Read a row written against `columns`
///
/// `columns` must be the schema the row was written with.
pub fn decode_row(columns: &[Column], reader: &mut BitReader<'_>) -> Result<Row> {
    let mask = reader.read_u64()?;

    if columns.len() < 64 && mask >> columns.len() != 0 {
        return Err(DeltaError::Corruption(format!(
            "presence mask {:#018x} names columns beyond the {} in the schema",
            mask,
            columns.len()
        )));
    }

    let mut row = Row::new();
    for (index, column) in columns.iter().enumerate() {
        if mask & (1u64 << index) == 0 {
            continue;
        }
        let value = decode_value(column, reader)?;
        row.set(index, value)?;
    }
    Ok(row)
}

fn encode_value(writer: &mut BitWriter<'_>, value: &Value) -> Result<()> {
    match value {
        Value::Int8(v) => writer.write(8, *v as u8 as u32),
        Value::UInt8(v) => writer.write(8, *v as u32),
        Value::Int16(v) => writer.write(16, *v as u16 as u32),
        Value::UInt16(v) => writer.write(16, *v as u32),
        Value::Int32(v) => writer.write(32, *v as u32),
        Value::UInt32(v) => writer.write(32, *v),
        Value::Int64(v) => writer.write_u64(*v as u64),
        Value::UInt64(v) => writer.write_u64(*v),
        Value::Bool(v) => writer.write(8, *v as u32),
        Value::Float32(v) => writer.write(32, v.to_bits()),
        Value::Float64(v) => writer.write_u64(v.to_bits()),
        Value::String(v) => writer.write_string(STRING_FIELD_LEN, v.as_bytes()),
        Value::Bytes(v) => {
            writer.write(16, v.len() as u32)?;
            writer.write_bytes(v)
        }
    }
}

fn decode_value(column: &Column, reader: &mut BitReader<'_>) -> Result<Value> {
    let unsigned = column.is_unsigned();

    Ok(match column.kind() {
        ColumnKind::Int8 => {
            let raw = reader.read(8)? as u8;
            if unsigned {
                Value::UInt8(raw)
            } else {
                Value::Int8(raw as i8)
            }
        }
        ColumnKind::Int16 => {
            let raw = reader.read(16)? as u16;
            if unsigned {
                Value::UInt16(raw)
            } else {
                Value::Int16(raw as i16)
            }
        }
        ColumnKind::Int32 => {
            let raw = reader.read(32)?;
            if unsigned {
                Value::UInt32(raw)
            } else {
                Value::Int32(raw as i32)
            }
        }
        ColumnKind::Int64 => {
            let raw = reader.read_u64()?;
            if unsigned {
                Value::UInt64(raw)
            } else {
                Value::Int64(raw as i64)
            }
        }
        ColumnKind::Bool => Value::Bool(reader.read(8)? != 0),
        ColumnKind::Float32 => Value::Float32(f32::from_bits(reader.read(32)?)),
        ColumnKind::Float64 => Value::Float64(f64::from_bits(reader.read_u64()?)),
        ColumnKind::String => {
            let raw = reader.read_string(STRING_FIELD_LEN)?;
            if raw.len() > MAX_STRING_LEN {
                return Err(DeltaError::Corruption(format!(
                    "unterminated string in column '{}'",
                    column.name()
                )));
            }
            let text = String::from_utf8(raw).map_err(|e| {
                DeltaError::Corruption(format!(
                    "string in column '{}' is not UTF-8: {}",
                    column.name(),
                    e
                ))
            })?;
            Value::String(text)
        }
        ColumnKind::Bytes => {
            let len = reader.read(16)? as usize;
            Value::Bytes(reader.read_bytes(len)?)
        }
    })
}
