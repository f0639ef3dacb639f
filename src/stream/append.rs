use std::sync::Arc;

use tessera_predicate::Cell;

use crate::{
    error::TableError,
    layout::Row,
    stream::{pull_from, BoxRowIterator, RowSource},
    table::{CellFactory, ViewColumn},
};

/// Builds full view rows from full delegate rows, computing appended cells.
pub(crate) struct AppendSource {
    input: BoxRowIterator,
    columns: Arc<[ViewColumn]>,
    factory: Option<Arc<dyn CellFactory>>,
}

impl AppendSource {
    pub(crate) fn new(
        input: BoxRowIterator,
        columns: Arc<[ViewColumn]>,
        factory: Option<Arc<dyn CellFactory>>,
    ) -> Self {
        Self {
            input,
            columns,
            factory,
        }
    }

    fn computed(&self, row: &Row) -> Result<Vec<Cell>, TableError> {
        let Some(factory) = &self.factory else {
            return Ok(Vec::new());
        };
        let cells = factory.cells(row)?;
        if cells.len() != factory.columns().len() {
            return Err(TableError::SchemaMismatch {
                key: row.key().clone(),
                reason: format!(
                    "factory returned {} cells for {} columns",
                    cells.len(),
                    factory.columns().len()
                ),
            });
        }
        Ok(cells)
    }
}

impl RowSource for AppendSource {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        let Some(row) = pull_from(&mut self.input)? else {
            return Ok(None);
        };
        let mut computed = self.computed(&row)?;
        let mut cells = Vec::with_capacity(self.columns.len());
        for column in self.columns.iter() {
            let cell = match *column {
                ViewColumn::Delegate(index) => row.cell(index).cloned(),
                ViewColumn::Appended(index) => computed
                    .get_mut(index)
                    .map(|cell| std::mem::replace(cell, Cell::Missing)),
            };
            cells.push(cell.ok_or_else(|| TableError::SchemaMismatch {
                key: row.key().clone(),
                reason: format!("no cell for {column:?}"),
            })?);
        }
        let (key, _) = row.into_parts();
        Ok(Some(Row::new(key, cells)))
    }

    fn release(&mut self) {
        self.input.close();
    }
}
