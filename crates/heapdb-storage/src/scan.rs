//! Sequential scans and the table-source traits the statistics layer scans
//! through.

use std::sync::Arc;

use heapdb_catalog::{TableId, TableSchema};

use crate::{
    buffer::BufferPool, heap_file::HeapFile, identity::PageId, page::HeapPage, StorageError,
    Tuple,
};

/// A cursor over every tuple of one table, in page then slot order.
///
/// A scan can be drained and rewound to the start any number of times.
pub trait SequentialScan {
    /// Whether another tuple is available.
    fn has_next(&mut self) -> Result<bool, StorageError>;

    /// The next tuple. Fails with [`StorageError::ScanExhausted`] when none is left.
    fn next(&mut self) -> Result<Tuple, StorageError>;

    /// Restart from the first tuple.
    fn rewind(&mut self) -> Result<(), StorageError>;

    /// Release the scan. Any further call fails with [`StorageError::ScanClosed`].
    fn close(&mut self);
}

/// Schema and size information about the tables a source holds.
pub trait SchemaProvider {
    fn schema_of(&self, table_id: TableId) -> Result<Arc<TableSchema>, StorageError>;

    fn page_count(&self, table_id: TableId) -> Result<usize, StorageError>;

    fn database_file_of(&self, table_id: TableId) -> Result<Arc<HeapFile>, StorageError>;

    fn table_name(&self, table_id: TableId) -> Result<String, StorageError>;

    /// Every known table, in a stable order.
    fn table_ids(&self) -> Vec<TableId>;
}

/// Opens sequential scans over tables.
pub trait ScanProvider {
    fn open_scan(&self, table_id: TableId) -> Result<Box<dyn SequentialScan + '_>, StorageError>;
}

/// Sequential scan over a heap file, reading pages through a buffer pool.
pub struct HeapScan {
    table_id: TableId,
    schema: Arc<TableSchema>,
    file: Arc<HeapFile>,
    buffer_pool: Arc<BufferPool>,
    page_count: usize,
    next_page: u32,
    current: Option<Arc<HeapPage>>,
    next_slot: usize,
    lookahead: Option<Tuple>,
    closed: bool,
}

impl HeapScan {
    pub fn open(
        table_id: TableId,
        schema: Arc<TableSchema>,
        file: Arc<HeapFile>,
        buffer_pool: Arc<BufferPool>,
    ) -> Result<Self, StorageError> {
        let page_count = file.num_pages()?;
        Ok(HeapScan {
            table_id,
            schema,
            file,
            buffer_pool,
            page_count,
            next_page: 0,
            current: None,
            next_slot: 0,
            lookahead: None,
            closed: false,
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    // Advance to the next occupied slot, loading pages as needed.
    fn fetch_next(&mut self) -> Result<Option<Tuple>, StorageError> {
        loop {
            if let Some(page) = &self.current {
                while self.next_slot < page.slot_count() {
                    let slot = self.next_slot;
                    self.next_slot += 1;
                    if let Some(tuple) = page.tuple(slot) {
                        return Ok(Some(tuple.clone()));
                    }
                }
                self.current = None;
            }

            if self.next_page as usize >= self.page_count {
                return Ok(None);
            }
            let page_id = PageId::new(self.table_id, self.next_page);
            self.current = Some(self.buffer_pool.get_page(page_id, &self.file, &self.schema)?);
            self.next_page += 1;
            self.next_slot = 0;
        }
    }

    fn check_open(&self) -> Result<(), StorageError> {
        if self.closed {
            Err(StorageError::ScanClosed)
        } else {
            Ok(())
        }
    }
}

impl SequentialScan for HeapScan {
    fn has_next(&mut self) -> Result<bool, StorageError> {
        self.check_open()?;
        if self.lookahead.is_none() {
            self.lookahead = self.fetch_next()?;
        }
        Ok(self.lookahead.is_some())
    }

    fn next(&mut self) -> Result<Tuple, StorageError> {
        if !self.has_next()? {
            return Err(StorageError::ScanExhausted);
        }
        self.lookahead.take().ok_or(StorageError::ScanExhausted)
    }

    fn rewind(&mut self) -> Result<(), StorageError> {
        self.check_open()?;
        self.page_count = self.file.num_pages()?;
        self.next_page = 0;
        self.current = None;
        self.next_slot = 0;
        self.lookahead = None;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        self.current = None;
        self.lookahead = None;
    }
}
