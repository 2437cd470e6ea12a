//! Identity types for pages, records and transactions.
//!
//! These are plain values: they name a storage location but own nothing.
//! Two identities are equal iff all of their components are equal.

use std::fmt;

use heapdb_catalog::TableId;

/// A page within a table: (table id, zero-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,
    pub page_number: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_number: u32) -> Self {
        PageId { table_id, page_number }
    }

    /// Fixed-width encoding used by on-disk structures and recovery logs.
    pub fn to_parts(&self) -> [u32; 2] {
        [self.table_id.0, self.page_number]
    }

    /// Inverse of [`PageId::to_parts`].
    pub fn from_parts(parts: [u32; 2]) -> Self {
        PageId { table_id: TableId(parts[0]), page_number: parts[1] }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_number)
    }
}

/// A tuple's storage location: (page, zero-based slot).
///
/// A record id goes stale when its tuple is deleted or the page is compacted;
/// detecting that is up to whoever owns the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: usize) -> Self {
        RecordId { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page_id, self.slot)
    }
}

/// Marker for the transaction that last dirtied a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);
