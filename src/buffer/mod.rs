//! Contiguous row store with native filter pushdown.
//!
//! Rows are appended through a [`RowBufferWriter`] into framed, checksummed
//! records (see `codec`). The finished [`RowBuffer`] keeps an index of frame
//! offsets, so a row range seeks straight to its first frame, and readers
//! decode only the cells a filter requires.

mod codec;
mod reader;

use std::{collections::HashSet, fmt, sync::Arc};

use bytes::{Bytes, BytesMut};
use tessera_predicate::RowKey;

use crate::{
    error::TableError,
    filter::TableFilter,
    layout::{Row, TableLayout},
    observability::log_debug,
    option::BufferOption,
    stream::{BoxRowIterator, EmptySource, RowCursor},
    table::KnowsRowCountTable,
};

/// Immutable buffer of encoded rows.
///
/// Cloning shares the underlying bytes.
#[derive(Clone)]
pub struct RowBuffer {
    layout: TableLayout,
    data: Bytes,
    frames: Arc<[usize]>,
    option: BufferOption,
}

impl RowBuffer {
    /// Starts a writer for rows of `layout`.
    pub fn writer(layout: TableLayout, option: BufferOption) -> RowBufferWriter {
        RowBufferWriter::new(layout, option)
    }

    /// Encodes `rows` into a new buffer.
    ///
    /// # Errors
    ///
    /// See [`RowBufferWriter::push`].
    pub fn from_rows<I>(layout: TableLayout, rows: I, option: BufferOption) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut writer = Self::writer(layout, option);
        for row in rows {
            writer.push(&row)?;
        }
        Ok(writer.finish())
    }

    /// Encoded size in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    /// Options the buffer was written with.
    pub fn option(&self) -> &BufferOption {
        &self.option
    }
}

impl KnowsRowCountTable for RowBuffer {
    fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn row_count(&self) -> u64 {
        self.frames.len() as u64
    }

    fn iter(&self) -> Result<BoxRowIterator, TableError> {
        self.iter_with_filter(&TableFilter::all())
    }

    fn iter_with_filter(&self, filter: &TableFilter) -> Result<BoxRowIterator, TableError> {
        let width = self.layout.width();
        filter.check_width(width)?;
        let (first, last) = match filter.row_range() {
            None if self.frames.is_empty() => return Ok(RowCursor::boxed(EmptySource)),
            None => (0, self.frames.len() - 1),
            Some(range) => match range.local(0, self.row_count()) {
                Some(local) => (local.from() as usize, local.to() as usize),
                None => {
                    log_debug!(
                        component = "buffer",
                        event = "range_past_end",
                        rows = self.frames.len(),
                        range = %range,
                    );
                    return Ok(RowCursor::boxed(EmptySource));
                }
            },
        };
        let source = reader::BufferReader::new(
            self.data.clone(),
            Arc::clone(&self.frames),
            first..last + 1,
            filter.predicate().cloned(),
            filter.output_columns(width),
            width,
            self.option.verify_checksums,
        );
        Ok(RowCursor::boxed(source))
    }
}

impl fmt::Debug for RowBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowBuffer")
            .field("layout", &self.layout)
            .field("rows", &self.frames.len())
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Appends rows to a [`RowBuffer`] under construction.
pub struct RowBufferWriter {
    layout: TableLayout,
    option: BufferOption,
    data: BytesMut,
    frames: Vec<usize>,
    keys: HashSet<RowKey>,
}

impl RowBufferWriter {
    fn new(layout: TableLayout, option: BufferOption) -> Self {
        let expected = option.expected_rows;
        Self {
            layout,
            option,
            data: BytesMut::new(),
            frames: Vec::with_capacity(expected),
            keys: HashSet::with_capacity(expected),
        }
    }

    /// Appends `row`.
    ///
    /// # Errors
    ///
    /// [`TableError::SchemaMismatch`] when `row` does not fit the layout, and
    /// [`TableError::DuplicateRowKey`] when its key was written before.
    pub fn push(&mut self, row: &Row) -> Result<(), TableError> {
        self.layout.check_row(row)?;
        if !self.keys.insert(row.key().clone()) {
            return Err(TableError::DuplicateRowKey(row.key().clone()));
        }
        self.frames.push(self.data.len());
        codec::encode_row(row, &mut self.data);
        Ok(())
    }

    /// Rows written so far.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true when no row was written.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Freezes the written rows.
    pub fn finish(self) -> RowBuffer {
        RowBuffer {
            layout: self.layout,
            data: self.data.freeze(),
            frames: self.frames.into(),
            option: self.option,
        }
    }
}
