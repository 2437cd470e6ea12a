//! Heap files: a table stored as consecutive `PAGE_SIZE` pages.
//!
//! Page `n` lives at byte offset `n * PAGE_SIZE`. The file carries no header;
//! its page count is its length divided by the page size.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use heapdb_catalog::{TableId, TableSchema};
use parking_lot::Mutex;

use crate::{
    identity::PageId,
    page::{HeapPage, PAGE_SIZE},
    StorageError, Tuple,
};

/// File handle for one table's pages.
#[derive(Debug)]
pub struct HeapFile {
    path: PathBuf,
    file: Mutex<File>,
    /// Bumped after every page write.
    generation: AtomicU64,
}

impl HeapFile {
    /// Create (or truncate) a heap file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        Ok(HeapFile::from_parts(path.as_ref(), file))
    }

    /// Open an existing heap file, creating an empty one if it is missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let file = OpenOptions::new().read(true).write(true).create(true).open(path.as_ref())?;
        let heap_file = HeapFile::from_parts(path.as_ref(), file);

        let len = heap_file.byte_len()?;
        if len % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::Io(format!(
                "{} is {} bytes, not a multiple of the {} byte page size",
                heap_file.path.display(),
                len,
                PAGE_SIZE
            )));
        }
        Ok(heap_file)
    }

    fn from_parts(path: &Path, file: File) -> Self {
        HeapFile { path: path.to_path_buf(), file: Mutex::new(file), generation: AtomicU64::new(0) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write counter for this file. Pages decoded before a change in
    /// generation may no longer match the bytes on disk.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Number of pages in the file.
    pub fn num_pages(&self) -> Result<usize, StorageError> {
        Ok((self.byte_len()? / PAGE_SIZE as u64) as usize)
    }

    /// Read the raw bytes of page `page_number`.
    pub fn read_page(&self, page_number: u32) -> Result<Vec<u8>, StorageError> {
        let mut file = self.file.lock();
        let page_count = (file.metadata()?.len() / PAGE_SIZE as u64) as usize;
        if page_number as usize >= page_count {
            return Err(StorageError::InvalidPageNumber { page_number, page_count });
        }

        file.seek(SeekFrom::Start(page_number as u64 * PAGE_SIZE as u64))?;
        let mut data = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Write page `page_number`. Writing one past the last page extends the file.
    pub fn write_page(&self, page_number: u32, data: &[u8]) -> Result<(), StorageError> {
        if data.len() != PAGE_SIZE {
            return Err(StorageError::InvalidPageSize { expected: PAGE_SIZE, actual: data.len() });
        }

        let mut file = self.file.lock();
        let page_count = (file.metadata()?.len() / PAGE_SIZE as u64) as usize;
        if page_number as usize > page_count {
            return Err(StorageError::InvalidPageNumber { page_number, page_count });
        }

        file.seek(SeekFrom::Start(page_number as u64 * PAGE_SIZE as u64))?;
        file.write_all(data)?;
        file.sync_data()?;
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Append a page, returning its page number.
    pub fn append_page(&self, data: &[u8]) -> Result<u32, StorageError> {
        let page_number = self.num_pages()? as u32;
        self.write_page(page_number, data)?;
        Ok(page_number)
    }

    /// Pack `tuples` densely into new pages at the end of the file.
    ///
    /// Returns the number of pages written.
    pub fn append_tuples<I>(
        &self,
        table_id: TableId,
        schema: &Arc<TableSchema>,
        tuples: I,
    ) -> Result<usize, StorageError>
    where
        I: IntoIterator<Item = Tuple>,
    {
        let mut next_page = self.num_pages()? as u32;
        let mut written = 0;
        let mut page = HeapPage::empty(PageId::new(table_id, next_page), Arc::clone(schema));

        for tuple in tuples {
            if page.free_slot_count() == 0 {
                self.write_page(next_page, &page.encode())?;
                written += 1;
                next_page += 1;
                page = HeapPage::empty(PageId::new(table_id, next_page), Arc::clone(schema));
            }
            page.insert_tuple(tuple)?;
        }

        if page.occupied_slot_count() > 0 {
            self.write_page(next_page, &page.encode())?;
            written += 1;
        }
        Ok(written)
    }

    fn byte_len(&self) -> Result<u64, StorageError> {
        Ok(self.file.lock().metadata()?.len())
    }
}
