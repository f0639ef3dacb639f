/// Options controlling how a [`RowBuffer`](crate::buffer::RowBuffer) is
/// written and read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferOption {
    pub(crate) verify_checksums: bool,
    pub(crate) expected_rows: usize,
}

impl Default for BufferOption {
    fn default() -> Self {
        BufferOption {
            verify_checksums: true,
            expected_rows: 0,
        }
    }
}

impl BufferOption {
    /// Verify the CRC32 of every row frame a reader touches.
    pub fn verify_checksums(self, verify_checksums: bool) -> Self {
        BufferOption {
            verify_checksums,
            ..self
        }
    }

    /// Pre-size the writer for `expected_rows` rows.
    pub fn expected_rows(self, expected_rows: usize) -> Self {
        BufferOption {
            expected_rows,
            ..self
        }
    }
}
