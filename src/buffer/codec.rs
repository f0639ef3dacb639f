//! Row frame encoding and decoding.
//!
//! ```text
//! frame   := len:u32 crc:u32 payload[len]
//! payload := key_len:u32 key[key_len] count:u32 offset:u32 * count cell*
//! cell    := tag:u8 value
//! ```
//!
//! Integers are little-endian. Cell offsets are relative to the first cell,
//! so any single cell decodes without touching its neighbours.

use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use tessera_predicate::{Cell, RowKey};

use crate::{error::TableError, layout::Row};

/// Bytes preceding every payload.
pub(crate) const FRAME_HEADER_SIZE: usize = 4 + 4;

const TAG_MISSING: u8 = 0;
const TAG_INT32: u8 = 1;
const TAG_INT64: u8 = 2;
const TAG_FLOAT64: u8 = 3;
const TAG_UTF8: u8 = 4;
const TAG_BOOLEAN: u8 = 5;

fn encode_cell(cell: &Cell, buf: &mut Vec<u8>) {
    match cell {
        Cell::Missing => buf.put_u8(TAG_MISSING),
        Cell::Int32(value) => {
            buf.put_u8(TAG_INT32);
            buf.put_i32_le(*value);
        }
        Cell::Int64(value) => {
            buf.put_u8(TAG_INT64);
            buf.put_i64_le(*value);
        }
        Cell::Float64(value) => {
            buf.put_u8(TAG_FLOAT64);
            buf.put_f64_le(*value);
        }
        Cell::Utf8(value) => {
            buf.put_u8(TAG_UTF8);
            buf.put_u32_le(value.len() as u32);
            buf.put_slice(value.as_bytes());
        }
        Cell::Boolean(value) => {
            buf.put_u8(TAG_BOOLEAN);
            buf.put_u8(u8::from(*value));
        }
    }
}

/// Appends the frame of `row` to `buf`.
pub(crate) fn encode_row(row: &Row, buf: &mut BytesMut) {
    let mut cells = Vec::new();
    let mut offsets = Vec::with_capacity(row.width());
    for cell in row.cells() {
        offsets.push(cells.len() as u32);
        encode_cell(cell, &mut cells);
    }

    let key = row.key().as_str().as_bytes();
    let mut payload = Vec::with_capacity(8 + key.len() + 4 * offsets.len() + cells.len());
    payload.put_u32_le(key.len() as u32);
    payload.put_slice(key);
    payload.put_u32_le(offsets.len() as u32);
    for offset in offsets {
        payload.put_u32_le(offset);
    }
    payload.put_slice(&cells);

    buf.reserve(FRAME_HEADER_SIZE + payload.len());
    buf.put_u32_le(payload.len() as u32);
    buf.put_u32_le(crc32fast::hash(&payload));
    buf.put_slice(&payload);
}

fn take<'a>(buf: &mut &'a [u8], len: usize, what: &'static str) -> Result<&'a [u8], TableError> {
    if buf.len() < len {
        return Err(TableError::Corrupt(what));
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    Ok(head)
}

fn read_u32(buf: &mut &[u8], what: &'static str) -> Result<u32, TableError> {
    if buf.remaining() < 4 {
        return Err(TableError::Corrupt(what));
    }
    Ok(buf.get_u32_le())
}

/// Decoded header of one frame; cells decode on demand.
#[derive(Debug)]
pub(crate) struct FrameView<'a> {
    key: RowKey,
    offsets: &'a [u8],
    cells: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Parses the frame at the start of `bytes`, checking its CRC when
    /// `verify` is set.
    pub(crate) fn decode(bytes: &'a [u8], verify: bool) -> Result<Self, TableError> {
        let mut buf = bytes;
        let len = read_u32(&mut buf, "frame header truncated")? as usize;
        let crc = read_u32(&mut buf, "frame header truncated")?;
        let payload = take(&mut buf, len, "frame payload truncated")?;
        if verify && crc32fast::hash(payload) != crc {
            return Err(TableError::Corrupt("frame checksum mismatch"));
        }

        let mut buf = payload;
        let key_len = read_u32(&mut buf, "row key truncated")? as usize;
        let key = take(&mut buf, key_len, "row key truncated")?;
        let key = std::str::from_utf8(key).map_err(|_| TableError::Corrupt("row key is not utf-8"))?;
        let count = read_u32(&mut buf, "cell count truncated")? as usize;
        let offsets = take(&mut buf, count.saturating_mul(4), "cell offsets truncated")?;
        Ok(Self {
            key: RowKey::new(key),
            offsets,
            cells: buf,
        })
    }

    pub(crate) fn key(&self) -> &RowKey {
        &self.key
    }

    pub(crate) fn width(&self) -> usize {
        self.offsets.len() / 4
    }

    /// Decodes the cell at `index`.
    pub(crate) fn cell(&self, index: usize) -> Result<Cell, TableError> {
        let mut slot = self
            .offsets
            .get(index * 4..index * 4 + 4)
            .ok_or(TableError::Corrupt("cell index past frame width"))?;
        let offset = slot.get_u32_le() as usize;
        let mut buf = self
            .cells
            .get(offset..)
            .ok_or(TableError::Corrupt("cell offset past frame end"))?;
        let tag = take(&mut buf, 1, "cell tag truncated")?[0];
        let cell = match tag {
            TAG_MISSING => Cell::Missing,
            TAG_INT32 => {
                let mut value = take(&mut buf, 4, "int32 cell truncated")?;
                Cell::Int32(value.get_i32_le())
            }
            TAG_INT64 => {
                let mut value = take(&mut buf, 8, "int64 cell truncated")?;
                Cell::Int64(value.get_i64_le())
            }
            TAG_FLOAT64 => {
                let mut value = take(&mut buf, 8, "float64 cell truncated")?;
                Cell::Float64(value.get_f64_le())
            }
            TAG_UTF8 => {
                let len = read_u32(&mut buf, "utf8 cell truncated")? as usize;
                let value = take(&mut buf, len, "utf8 cell truncated")?;
                let value = std::str::from_utf8(value)
                    .map_err(|_| TableError::Corrupt("utf8 cell is not utf-8"))?;
                Cell::Utf8(Arc::from(value))
            }
            TAG_BOOLEAN => match take(&mut buf, 1, "boolean cell truncated")?[0] {
                0 => Cell::Boolean(false),
                1 => Cell::Boolean(true),
                _ => return Err(TableError::Corrupt("boolean cell out of range")),
            },
            _ => return Err(TableError::Corrupt("unknown cell tag")),
        };
        Ok(cell)
    }
}
