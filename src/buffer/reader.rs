use std::{ops::Range, sync::Arc};

use bytes::Bytes;
use tessera_predicate::{Cell, Predicate};

use crate::{
    buffer::codec::FrameView,
    error::TableError,
    layout::Row,
    observability::{log_trace, log_warn},
    stream::{projection::SparseRow, RowSource},
};

/// Reads the frames of a row range, decoding predicate cells first and the
/// remaining output cells only for rows that match.
pub(crate) struct BufferReader {
    data: Bytes,
    frames: Arc<[usize]>,
    rows: Range<usize>,
    predicate: Option<Predicate>,
    predicate_columns: Vec<usize>,
    output_columns: Vec<usize>,
    width: usize,
    verify_checksums: bool,
}

impl BufferReader {
    pub(crate) fn new(
        data: Bytes,
        frames: Arc<[usize]>,
        rows: Range<usize>,
        predicate: Option<Predicate>,
        output_columns: Vec<usize>,
        width: usize,
        verify_checksums: bool,
    ) -> Self {
        let predicate_columns = predicate
            .as_ref()
            .map(|predicate| predicate.columns().into_iter().collect())
            .unwrap_or_default();
        Self {
            data,
            frames,
            rows,
            predicate,
            predicate_columns,
            output_columns,
            width,
            verify_checksums,
        }
    }

    fn frame(&self, row: usize) -> Result<FrameView<'_>, TableError> {
        let offset = self
            .frames
            .get(row)
            .copied()
            .ok_or(TableError::Corrupt("frame index past buffer end"))?;
        let bytes = self
            .data
            .get(offset..)
            .ok_or(TableError::Corrupt("frame offset past buffer end"))?;
        FrameView::decode(bytes, self.verify_checksums)
            .and_then(|frame| {
                if frame.width() == self.width {
                    Ok(frame)
                } else {
                    Err(TableError::Corrupt("frame width differs from layout"))
                }
            })
            .inspect_err(|err| {
                log_warn!(
                    component = "buffer",
                    event = "corrupt_frame",
                    row = row,
                    error = %err,
                );
            })
    }

    /// Decodes one row; `None` when the predicate rejects it.
    fn read(&self, row: usize) -> Result<Option<Row>, TableError> {
        let frame = self.frame(row)?;
        let mut decoded: Vec<Cell> = Vec::new();
        if let Some(predicate) = &self.predicate {
            decoded = self
                .predicate_columns
                .iter()
                .map(|&column| frame.cell(column))
                .collect::<Result<_, _>>()?;
            let view = SparseRow {
                key: frame.key(),
                columns: &self.predicate_columns,
                cells: &decoded,
            };
            if !predicate.evaluate(&view)? {
                log_trace!(component = "buffer", event = "row_rejected", row = row);
                return Ok(None);
            }
        }
        let cells = self
            .output_columns
            .iter()
            .map(|&column| match self.predicate_columns.binary_search(&column) {
                Ok(slot) => Ok(decoded[slot].clone()),
                Err(_) => frame.cell(column),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Row::new(frame.key().clone(), cells)))
    }
}

impl RowSource for BufferReader {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        while let Some(row) = self.rows.next() {
            if let Some(row) = self.read(row)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}
