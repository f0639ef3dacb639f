//! Pull-based row iterators.
//!
//! Every iterator handed out by a table is a [`RowCursor`] over some
//! [`RowSource`]. Sources only produce rows; the cursor owns the peek slot
//! and the open / exhausted / closed state machine, and releases the source
//! on exhaustion, on error, on `close` and on drop.

pub(crate) mod append;
pub(crate) mod chain;
pub(crate) mod merge;
pub(crate) mod projection;

use std::fmt;

use crate::{error::TableError, layout::Row};

/// Synchronous, closeable row iterator.
pub trait RowIterator: Send {
    /// Returns true when [`next`](Self::next) will yield a row.
    ///
    /// # Errors
    ///
    /// Any error raised while reading ahead. The iterator is closed before
    /// the error is returned.
    fn has_next(&mut self) -> Result<bool, TableError>;

    /// Yields the next row.
    ///
    /// # Errors
    ///
    /// [`TableError::Exhausted`] when no row remains, or any read error.
    fn next(&mut self) -> Result<Row, TableError>;

    /// Releases the underlying resources. Calling it again is a no-op.
    fn close(&mut self);

    /// Adapts this iterator into a [`std::iter::Iterator`].
    fn rows(self) -> Rows<Self>
    where
        Self: Sized,
    {
        Rows { inner: self }
    }
}

/// Boxed iterator returned by every table.
pub type BoxRowIterator = Box<dyn RowIterator>;

impl<I> RowIterator for Box<I>
where
    I: RowIterator + ?Sized,
{
    fn has_next(&mut self) -> Result<bool, TableError> {
        (**self).has_next()
    }

    fn next(&mut self) -> Result<Row, TableError> {
        (**self).next()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// [`Iterator`] over the rows of a [`RowIterator`].
///
/// Stops after the first error. The wrapped iterator closes when the
/// adapter is dropped.
pub struct Rows<I: RowIterator> {
    inner: I,
}

impl<I: RowIterator> Rows<I> {
    /// Returns the wrapped iterator.
    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: RowIterator> Iterator for Rows<I> {
    type Item = Result<Row, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.has_next() {
            Ok(true) => Some(self.inner.next()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Producer behind a [`RowCursor`].
pub(crate) trait RowSource: Send {
    /// Next row, or `None` once the source has nothing left.
    fn pull(&mut self) -> Result<Option<Row>, TableError>;

    /// Releases whatever the source holds open. Called at most once.
    fn release(&mut self) {}
}

impl RowSource for Box<dyn RowSource> {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        (**self).pull()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Source that yields nothing.
pub(crate) struct EmptySource;

impl RowSource for EmptySource {
    fn pull(&mut self) -> Result<Option<Row>, TableError> {
        Ok(None)
    }
}

/// Pulls one row from `iter`, mapping exhaustion to `None`.
pub(crate) fn pull_from(iter: &mut BoxRowIterator) -> Result<Option<Row>, TableError> {
    if iter.has_next()? {
        iter.next().map(Some)
    } else {
        Ok(None)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CursorState {
    Open,
    Exhausted,
    Closed,
}

/// [`RowIterator`] over a [`RowSource`].
pub(crate) struct RowCursor<S: RowSource> {
    source: S,
    peeked: Option<Row>,
    state: CursorState,
}

impl<S: RowSource> RowCursor<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            peeked: None,
            state: CursorState::Open,
        }
    }
}

impl<S: RowSource + 'static> RowCursor<S> {
    pub(crate) fn boxed(source: S) -> BoxRowIterator {
        Box::new(Self::new(source))
    }
}

impl<S: RowSource> RowIterator for RowCursor<S> {
    fn has_next(&mut self) -> Result<bool, TableError> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        if self.state != CursorState::Open {
            return Ok(false);
        }
        match self.source.pull() {
            Ok(Some(row)) => {
                self.peeked = Some(row);
                Ok(true)
            }
            Ok(None) => {
                self.source.release();
                self.state = CursorState::Exhausted;
                Ok(false)
            }
            Err(err) => {
                self.close();
                Err(err)
            }
        }
    }

    fn next(&mut self) -> Result<Row, TableError> {
        if !self.has_next()? {
            return Err(TableError::Exhausted);
        }
        self.peeked.take().ok_or(TableError::Exhausted)
    }

    fn close(&mut self) {
        self.peeked = None;
        if self.state == CursorState::Open {
            self.source.release();
        }
        self.state = CursorState::Closed;
    }
}

impl<S: RowSource> Drop for RowCursor<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: RowSource> fmt::Debug for RowCursor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCursor")
            .field("state", &self.state)
            .field("peeked", &self.peeked.as_ref().map(Row::key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use tessera_predicate::Cell;

    use super::*;

    struct Counting {
        remaining: u32,
        fail_at: Option<u32>,
        releases: Arc<AtomicUsize>,
    }

    impl RowSource for Counting {
        fn pull(&mut self) -> Result<Option<Row>, TableError> {
            if Some(self.remaining) == self.fail_at {
                return Err(TableError::Corrupt("test failure"));
            }
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(Row::new(
                self.remaining.to_string(),
                vec![Cell::Int32(self.remaining as i32)],
            )))
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn open(remaining: u32, fail_at: Option<u32>) -> (RowCursor<Counting>, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let source = Counting {
            remaining,
            fail_at,
            releases: Arc::clone(&releases),
        };
        (RowCursor::new(source), releases)
    }

    #[test]
    fn next_after_end_is_exhausted() {
        let (mut cursor, releases) = open(2, None);
        assert!(cursor.has_next().unwrap());
        assert!(cursor.has_next().unwrap());
        assert_eq!(cursor.next().unwrap().key().as_str(), "1");
        assert_eq!(cursor.next().unwrap().key().as_str(), "0");
        assert!(!cursor.has_next().unwrap());
        assert_eq!(cursor.next(), Err(TableError::Exhausted));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_is_idempotent_and_stops_reads() {
        let (mut cursor, releases) = open(5, None);
        assert!(cursor.has_next().unwrap());
        cursor.close();
        cursor.close();
        assert!(!cursor.has_next().unwrap());
        assert_eq!(cursor.next(), Err(TableError::Exhausted));
        drop(cursor);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn read_error_closes_cursor() {
        let (mut cursor, releases) = open(5, Some(3));
        assert!(cursor.next().is_ok());
        assert!(cursor.next().is_ok());
        assert_eq!(cursor.next(), Err(TableError::Corrupt("test failure")));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(!cursor.has_next().unwrap());
    }

    #[test]
    fn rows_adapter_closes_on_drop() {
        let (cursor, releases) = open(4, None);
        let mut rows = cursor.rows();
        assert!(rows.next().is_some());
        drop(rows);
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let (cursor, _) = open(3, None);
        let keys: Vec<String> = cursor
            .rows()
            .map(|row| row.map(|row| row.key().to_string()))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(keys, ["2", "1", "0"]);
    }
}
