use std::collections::VecDeque;

use crate::{
    error::TableError,
    filter::TableFilter,
    layout::Row,
    observability::log_trace,
    stream::{pull_from, BoxRowIterator, RowSource},
    table::TableRef,
};

/// Chains the filtered iterators of several tables in order.
///
/// A delegate's iterator is opened only once the previous one is exhausted,
/// and closed as soon as it runs out.
pub(crate) struct ChainSource {
    pending: VecDeque<(TableRef, TableFilter)>,
    current: Option<BoxRowIterator>,
}

impl ChainSource {
    pub(crate) fn new(pending: impl IntoIterator<Item = (TableRef, TableFilter)>) -> Self {
        Self {
            pending: pending.into_iter().collect(),
            current: None,
        }
    }
}

impl RowSource for ChainSource {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(row) = pull_from(current)? {
                    return Ok(Some(row));
                }
                current.close();
                self.current = None;
            }
            let Some((table, filter)) = self.pending.pop_front() else {
                return Ok(None);
            };
            log_trace!(
                component = "concatenated",
                event = "delegate_opened",
                remaining = self.pending.len(),
                filter = %filter,
            );
            self.current = Some(table.iter_with_filter(&filter)?);
        }
    }

    fn release(&mut self) {
        if let Some(mut current) = self.current.take() {
            current.close();
        }
        self.pending.clear();
    }
}
