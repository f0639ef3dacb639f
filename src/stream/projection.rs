use std::sync::Arc;

use tessera_predicate::{Cell, CellSource, Predicate, RowKey};

use crate::{
    error::TableError,
    filter::RowRange,
    layout::Row,
    stream::{pull_from, BoxRowIterator, RowSource},
};

/// Row whose cells stand for the sorted layout positions `columns`.
pub(crate) struct SparseRow<'a> {
    pub(crate) key: &'a RowKey,
    pub(crate) columns: &'a [usize],
    pub(crate) cells: &'a [Cell],
}

impl CellSource for SparseRow<'_> {
    fn key(&self) -> &RowKey {
        self.key
    }

    fn cell(&self, index: usize) -> Option<&Cell> {
        self.columns
            .binary_search(&index)
            .ok()
            .and_then(|slot| self.cells.get(slot))
    }
}

/// Picks the output cells out of an input row.
#[derive(Clone, Debug)]
pub(crate) enum Projection {
    /// Input cells already are the output cells.
    Identity,
    /// Input slots to keep, in output order.
    Pick(Arc<[usize]>),
}

impl Projection {
    /// Projection from rows holding `input` positions to rows holding
    /// `output` positions. Both are sorted and `output ⊆ input`.
    pub(crate) fn between(input: &[usize], output: &[usize]) -> Result<Self, TableError> {
        if input == output {
            return Ok(Projection::Identity);
        }
        let slots = output
            .iter()
            .map(|column| {
                input.binary_search(column).map_err(|_| {
                    TableError::invalid_column(*column, "column was not read from the source")
                })
            })
            .collect::<Result<Arc<[usize]>, _>>()?;
        Ok(Projection::Pick(slots))
    }

    /// Projection keeping input slot `slots[i]` as output cell `i`, for
    /// input rows of `input_width` cells.
    pub(crate) fn reorder(slots: Vec<usize>, input_width: usize) -> Self {
        if slots.len() == input_width && slots.iter().enumerate().all(|(i, slot)| i == *slot) {
            return Projection::Identity;
        }
        Projection::Pick(slots.into())
    }

    pub(crate) fn apply(&self, row: Row) -> Row {
        match self {
            Projection::Identity => row,
            Projection::Pick(slots) => {
                let (key, mut cells) = row.into_parts();
                let picked = slots
                    .iter()
                    .map(|&slot| match cells.get_mut(slot) {
                        Some(cell) => std::mem::replace(cell, Cell::Missing),
                        None => Cell::Missing,
                    })
                    .collect();
                Row::new(key, picked)
            }
        }
    }
}

/// Applies a [`Projection`] to every row of another iterator.
pub(crate) struct ProjectSource {
    input: BoxRowIterator,
    projection: Projection,
}

impl ProjectSource {
    pub(crate) fn new(input: BoxRowIterator, projection: Projection) -> Self {
        Self { input, projection }
    }
}

impl RowSource for ProjectSource {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        Ok(pull_from(&mut self.input)?.map(|row| self.projection.apply(row)))
    }

    fn release(&mut self) {
        self.input.close();
    }
}

/// In-memory filtering over rows read from another iterator.
///
/// Input rows hold the cells at layout positions `columns`; the first input
/// row is row `first_row` of the filtered table.
pub(crate) struct FilterSource {
    input: BoxRowIterator,
    columns: Arc<[usize]>,
    range: Option<RowRange>,
    position: u64,
    predicate: Option<Predicate>,
    projection: Projection,
    done: bool,
}

impl FilterSource {
    pub(crate) fn new(
        input: BoxRowIterator,
        columns: Vec<usize>,
        first_row: u64,
        range: Option<RowRange>,
        predicate: Option<Predicate>,
        output: &[usize],
    ) -> Result<Self, TableError> {
        let projection = Projection::between(&columns, output)?;
        Ok(Self {
            input,
            columns: columns.into(),
            range,
            position: first_row,
            predicate,
            projection,
            done: false,
        })
    }

    fn matches(&self, row: &Row) -> Result<bool, TableError> {
        if row.width() != self.columns.len() {
            return Err(TableError::SchemaMismatch {
                key: row.key().clone(),
                reason: format!(
                    "{} cells read for {} columns",
                    row.width(),
                    self.columns.len()
                ),
            });
        }
        let Some(predicate) = &self.predicate else {
            return Ok(true);
        };
        let view = SparseRow {
            key: row.key(),
            columns: &self.columns,
            cells: row.cells(),
        };
        Ok(predicate.evaluate(&view)?)
    }
}

impl RowSource for FilterSource {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        while !self.done {
            let Some(row) = pull_from(&mut self.input)? else {
                self.done = true;
                break;
            };
            let position = self.position;
            self.position += 1;
            if let Some(range) = self.range {
                if position < range.from() {
                    continue;
                }
                if position > range.to() {
                    self.done = true;
                    self.input.close();
                    break;
                }
            }
            if self.matches(&row)? {
                if self.range.is_some_and(|range| position == range.to()) {
                    self.done = true;
                    self.input.close();
                }
                return Ok(Some(self.projection.apply(row)));
            }
        }
        Ok(None)
    }

    fn release(&mut self) {
        self.input.close();
    }
}
