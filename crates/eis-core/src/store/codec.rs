//! Binary encoding of a waveform dataset group.
//!
//! Layout (little endian): magic, `u32` column count, then per column a `u32`
//! name length, the UTF-8 name, a `u64` value count and the `f64` values.
//! Values are stored bit for bit.

use crate::domain::{EisError, EisResult};
use std::collections::BTreeMap;

pub(crate) const WAVEFORM_BINARY_MAGIC: &[u8; 8] = b"EISWAVE1";

pub(crate) fn encode_columns(columns: &BTreeMap<String, Vec<f64>>) -> Vec<u8> {
    let payload: usize = columns
        .iter()
        .map(|(name, values)| 4 + name.len() + 8 + values.len() * 8)
        .sum();
    let mut bytes = Vec::with_capacity(WAVEFORM_BINARY_MAGIC.len() + 4 + payload);

    bytes.extend_from_slice(WAVEFORM_BINARY_MAGIC);
    bytes.extend_from_slice(&(columns.len() as u32).to_le_bytes());
    for (name, values) in columns {
        bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&(values.len() as u64).to_le_bytes());
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    bytes
}

pub(crate) fn decode_columns(label: &str, bytes: &[u8]) -> EisResult<BTreeMap<String, Vec<f64>>> {
    if !bytes.starts_with(WAVEFORM_BINARY_MAGIC) {
        return Err(decode_error(label, "missing waveform magic header"));
    }
    let mut offset = WAVEFORM_BINARY_MAGIC.len();

    let column_count = take_u32(bytes, &mut offset)
        .ok_or_else(|| decode_error(label, "missing column count"))?;
    let mut columns = BTreeMap::new();
    for _ in 0..column_count {
        let name_len = take_u32(bytes, &mut offset)
            .ok_or_else(|| decode_error(label, "missing column name length"))?
            as usize;
        let name = take_bytes(bytes, &mut offset, name_len)
            .ok_or_else(|| decode_error(label, "truncated column name"))?;
        let name = String::from_utf8(name.to_vec())
            .map_err(|_| decode_error(label, "column name is not UTF-8"))?;

        let value_count = take_u64(bytes, &mut offset)
            .ok_or_else(|| decode_error(label, "missing value count"))?;
        let value_count = usize::try_from(value_count)
            .map_err(|_| decode_error(label, "value count does not fit in memory"))?;
        let mut values = Vec::with_capacity(value_count.min(bytes.len() / 8));
        for _ in 0..value_count {
            values.push(
                take_f64(bytes, &mut offset)
                    .ok_or_else(|| decode_error(label, "truncated column values"))?,
            );
        }
        columns.insert(name, values);
    }

    if offset != bytes.len() {
        return Err(decode_error(label, "trailing bytes after last column"));
    }
    Ok(columns)
}

fn decode_error(label: &str, message: &str) -> EisError {
    EisError::io_system(
        "IO.STORE_DECODE",
        format!("failed to decode waveform '{}': {}", label, message),
    )
}

fn take_bytes<'a>(bytes: &'a [u8], offset: &mut usize, len: usize) -> Option<&'a [u8]> {
    let end = offset.checked_add(len)?;
    let chunk = bytes.get(*offset..end)?;
    *offset = end;
    Some(chunk)
}

fn take_u32(bytes: &[u8], offset: &mut usize) -> Option<u32> {
    let mut buffer = [0_u8; 4];
    buffer.copy_from_slice(take_bytes(bytes, offset, 4)?);
    Some(u32::from_le_bytes(buffer))
}

fn take_u64(bytes: &[u8], offset: &mut usize) -> Option<u64> {
    let mut buffer = [0_u8; 8];
    buffer.copy_from_slice(take_bytes(bytes, offset, 8)?);
    Some(u64::from_le_bytes(buffer))
}

fn take_f64(bytes: &[u8], offset: &mut usize) -> Option<f64> {
    take_u64(bytes, offset).map(f64::from_bits)
}
