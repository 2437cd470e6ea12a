//! Heap pages: fixed-size blocks of slotted rows.
//!
//! Pages are `PAGE_SIZE` bytes on disk. A page starts with an occupancy bitmap
//! (one bit per slot), followed by the slots themselves, each wide enough for
//! one row of the table's schema, followed by zero padding. Decoding the bytes
//! produced by [`HeapPage::encode`] yields an identical page.

mod codec;
mod layout;

use std::sync::Arc;

use heapdb_catalog::TableSchema;

pub use layout::PageLayout;

use crate::{
    identity::{PageId, RecordId, TransactionId},
    StorageError, Tuple,
};

/// Page size in bytes (4KB standard)
pub const PAGE_SIZE: usize = 4096;

/// Bytes of a page with no occupied slots.
pub fn empty_page_bytes() -> Vec<u8> {
    vec![0; PAGE_SIZE]
}

/// A decoded heap page.
///
/// The bitmap is authoritative for occupancy; `slots[i]` holds a tuple exactly
/// when bit `i` is set.
#[derive(Debug, Clone)]
pub struct HeapPage {
    id: PageId,
    schema: Arc<TableSchema>,
    layout: PageLayout,
    header: Vec<u8>,
    slots: Vec<Option<Tuple>>,
    before_image: Vec<u8>,
    dirty: bool,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// Decode a page read from storage.
    ///
    /// The before-image is captured from `bytes`.
    pub fn decode(id: PageId, bytes: &[u8], schema: Arc<TableSchema>) -> Result<Self, StorageError> {
        if bytes.len() != PAGE_SIZE {
            return Err(StorageError::MalformedPage {
                page_id: id,
                reason: format!("expected {} bytes, got {}", PAGE_SIZE, bytes.len()),
            });
        }

        let layout = PageLayout::new(schema.row_width(), PAGE_SIZE);
        let header = bytes[..layout.header_len()].to_vec();

        let mut slots = Vec::with_capacity(layout.slot_count());
        for slot in 0..layout.slot_count() {
            if !layout::is_bit_set(&header, slot) {
                slots.push(None);
                continue;
            }
            let offset = layout.slot_offset(slot);
            let values = codec::read_row(&bytes[offset..offset + layout.row_width()], &schema)
                .map_err(|reason| StorageError::MalformedPage {
                    page_id: id,
                    reason: format!("slot {}: {}", slot, reason),
                })?;
            let mut tuple = Tuple::new(values);
            tuple.set_record_id(Some(RecordId::new(id, slot)));
            slots.push(Some(tuple));
        }

        Ok(HeapPage {
            id,
            schema,
            layout,
            header,
            slots,
            before_image: bytes.to_vec(),
            dirty: false,
            dirtied_by: None,
        })
    }

    /// A page with every slot free.
    pub fn empty(id: PageId, schema: Arc<TableSchema>) -> Self {
        let layout = PageLayout::new(schema.row_width(), PAGE_SIZE);
        HeapPage {
            id,
            schema,
            layout,
            header: vec![0; layout.header_len()],
            slots: vec![None; layout.slot_count()],
            before_image: empty_page_bytes(),
            dirty: false,
            dirtied_by: None,
        }
    }

    /// Serialize the page. Free slots and padding are written as zeros.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = empty_page_bytes();
        data[..self.layout.header_len()].copy_from_slice(&self.header);

        for (slot, tuple) in self.slots.iter().enumerate() {
            if let Some(tuple) = tuple {
                let offset = self.layout.slot_offset(slot);
                codec::write_row(
                    &mut data[offset..offset + self.layout.row_width()],
                    &self.schema,
                    &tuple.values,
                );
            }
        }

        data
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn slot_count(&self) -> usize {
        self.layout.slot_count()
    }

    /// The raw occupancy bitmap.
    pub fn bitmap(&self) -> &[u8] {
        &self.header
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.slot_count() && layout::is_bit_set(&self.header, slot)
    }

    pub fn occupied_slot_count(&self) -> usize {
        (0..self.slot_count()).filter(|&slot| layout::is_bit_set(&self.header, slot)).count()
    }

    pub fn free_slot_count(&self) -> usize {
        self.slot_count() - self.occupied_slot_count()
    }

    /// The tuple stored in `slot`, if the slot is occupied.
    pub fn tuple(&self, slot: usize) -> Option<&Tuple> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Occupied tuples in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().flatten()
    }

    /// Store `tuple` in `slot`, overwriting whatever was there.
    pub fn write_slot(&mut self, slot: usize, mut tuple: Tuple) -> Result<RecordId, StorageError> {
        self.check_slot(slot)?;
        self.check_tuple(&tuple)?;

        let record_id = RecordId::new(self.id, slot);
        tuple.set_record_id(Some(record_id));
        self.slots[slot] = Some(tuple);
        layout::set_bit(&mut self.header, slot, true);
        Ok(record_id)
    }

    /// Free `slot`, returning the tuple it held.
    pub fn clear_slot(&mut self, slot: usize) -> Result<Option<Tuple>, StorageError> {
        self.check_slot(slot)?;
        layout::set_bit(&mut self.header, slot, false);
        let mut tuple = self.slots[slot].take();
        if let Some(tuple) = tuple.as_mut() {
            tuple.set_record_id(None);
        }
        Ok(tuple)
    }

    /// Place `tuple` in the first free slot.
    pub fn insert_tuple(&mut self, tuple: Tuple) -> Result<RecordId, StorageError> {
        self.check_tuple(&tuple)?;
        let slot = (0..self.slot_count())
            .find(|&slot| !layout::is_bit_set(&self.header, slot))
            .ok_or(StorageError::PageFull(self.id))?;
        self.write_slot(slot, tuple)
    }

    /// Remove the tuple stored at `record_id`.
    pub fn delete_tuple(&mut self, record_id: &RecordId) -> Result<Tuple, StorageError> {
        if record_id.page_id != self.id {
            return Err(StorageError::RecordNotOnPage { record_id: *record_id, page_id: self.id });
        }
        self.clear_slot(record_id.slot)?
            .ok_or(StorageError::SlotEmpty { page_id: self.id, slot: record_id.slot })
    }

    /// Rebuild the bitmap from the slot contents.
    pub fn recompute_bitmap(&mut self) {
        self.header.fill(0);
        for (slot, tuple) in self.slots.iter().enumerate() {
            layout::set_bit(&mut self.header, slot, tuple.is_some());
        }
    }

    // ------------------------------------------------------------------
    // Recovery hooks
    // ------------------------------------------------------------------

    /// Bytes of the page as of decode time or the last [`HeapPage::set_before_image`].
    pub fn before_image_bytes(&self) -> &[u8] {
        &self.before_image
    }

    /// The page as it was when the before-image was taken.
    pub fn before_image(&self) -> Result<HeapPage, StorageError> {
        HeapPage::decode(self.id, &self.before_image, Arc::clone(&self.schema))
    }

    /// Snapshot the current contents as the new before-image.
    pub fn set_before_image(&mut self) {
        self.before_image = self.encode();
    }

    /// Mark the page dirty or clean. `tid` is recorded only when dirty and
    /// may be `None` for changes made outside a transaction.
    pub fn mark_dirty(&mut self, dirty: bool, tid: Option<TransactionId>) {
        self.dirty = dirty;
        self.dirtied_by = if dirty { tid } else { None };
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The transaction that last dirtied this page, if it is dirty.
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    fn check_slot(&self, slot: usize) -> Result<(), StorageError> {
        if slot >= self.slot_count() {
            return Err(StorageError::SlotOutOfRange { slot, slot_count: self.slot_count() });
        }
        Ok(())
    }

    fn check_tuple(&self, tuple: &Tuple) -> Result<(), StorageError> {
        if tuple.len() != self.schema.column_count() {
            return Err(StorageError::SchemaMismatch {
                expected: self.schema.column_count(),
                actual: tuple.len(),
            });
        }
        for (idx, (column, value)) in self.schema.columns.iter().zip(&tuple.values).enumerate() {
            if !value.fits(&column.data_type) {
                return Err(StorageError::TypeMismatch {
                    column: idx,
                    expected: column.data_type.to_string(),
                    actual: value.type_name().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl PartialEq for HeapPage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.header == other.header && self.slots == other.slots
    }
}

#[cfg(test)]
mod tests {
    use heapdb_catalog::{ColumnSchema, TableId};
    use heapdb_types::{DataType, SqlValue};

    use super::*;

    fn schema() -> Arc<TableSchema> {
        Arc::new(TableSchema::new(
            "people",
            vec![
                ColumnSchema::new("id", DataType::Integer),
                ColumnSchema::new("name", DataType::Varchar { max_length: 12 }),
            ],
        ))
    }

    fn pid() -> PageId {
        PageId::new(TableId(1), 0)
    }

    fn person(id: i32, name: &str) -> Tuple {
        Tuple::new(vec![SqlValue::Integer(id), SqlValue::from(name)])
    }

    #[test]
    fn test_empty_page() {
        let page = HeapPage::decode(pid(), &empty_page_bytes(), schema()).unwrap();
        // row width 4 + 16 = 20 bytes
        assert_eq!(page.slot_count(), 203);
        assert_eq!(page.occupied_slot_count(), 0);
        assert_eq!(page.free_slot_count(), 203);
        assert_eq!(page, HeapPage::empty(pid(), schema()));
        assert_eq!(page.encode(), empty_page_bytes());
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = HeapPage::decode(pid(), &[0u8; 100], schema()).unwrap_err();
        match err {
            StorageError::MalformedPage { page_id, reason } => {
                assert_eq!(page_id, pid());
                assert!(reason.contains("100"), "reason: {}", reason);
            }
            other => panic!("expected MalformedPage, got {:?}", other),
        }
        assert!(HeapPage::decode(pid(), &vec![0u8; PAGE_SIZE + 1], schema()).is_err());
    }

    #[test]
    fn test_insert_encode_decode() {
        let mut page = HeapPage::empty(pid(), schema());
        let a = page.insert_tuple(person(1, "ada")).unwrap();
        let b = page.insert_tuple(person(2, "brian")).unwrap();
        assert_eq!(a.slot, 0);
        assert_eq!(b.slot, 1);

        let bytes = page.encode();
        assert_eq!(bytes.len(), PAGE_SIZE);
        assert_eq!(bytes[0], 0b0000_0011);

        let decoded = HeapPage::decode(pid(), &bytes, schema()).unwrap();
        assert_eq!(decoded, page);
        assert_eq!(decoded.tuple(1), Some(&person(2, "brian")));
        assert_eq!(decoded.tuple(1).and_then(Tuple::record_id), Some(b));
    }

    #[test]
    fn test_delete_frees_slot_and_zeroes_bytes() {
        let mut page = HeapPage::empty(pid(), schema());
        let rid = page.insert_tuple(person(9, "x")).unwrap();
        let removed = page.delete_tuple(&rid).unwrap();
        assert_eq!(removed, person(9, "x"));
        assert_eq!(removed.record_id(), None);
        assert_eq!(page.encode(), empty_page_bytes());

        assert_eq!(
            page.delete_tuple(&rid).unwrap_err(),
            StorageError::SlotEmpty { page_id: pid(), slot: 0 }
        );
    }

    #[test]
    fn test_delete_from_other_page() {
        let mut page = HeapPage::empty(pid(), schema());
        let foreign = RecordId::new(PageId::new(TableId(1), 5), 0);
        assert!(matches!(page.delete_tuple(&foreign), Err(StorageError::RecordNotOnPage { .. })));
    }

    #[test]
    fn test_insert_validates_tuple() {
        let mut page = HeapPage::empty(pid(), schema());
        assert!(matches!(
            page.insert_tuple(Tuple::new(vec![SqlValue::Integer(1)])),
            Err(StorageError::SchemaMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            page.insert_tuple(person(1, "a name that is far too long")),
            Err(StorageError::TypeMismatch { column: 1, .. })
        ));
        assert!(matches!(
            page.insert_tuple(Tuple::new(vec![SqlValue::from("1"), SqlValue::from("a")])),
            Err(StorageError::TypeMismatch { column: 0, .. })
        ));
        assert_eq!(page.occupied_slot_count(), 0);
    }

    #[test]
    fn test_full_page() {
        let mut page = HeapPage::empty(pid(), schema());
        for i in 0..page.slot_count() {
            page.insert_tuple(person(i as i32, "f")).unwrap();
        }
        assert_eq!(page.free_slot_count(), 0);
        assert_eq!(page.insert_tuple(person(0, "f")).unwrap_err(), StorageError::PageFull(pid()));
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut page = HeapPage::empty(pid(), schema());
        assert_eq!(
            page.write_slot(203, person(1, "a")).unwrap_err(),
            StorageError::SlotOutOfRange { slot: 203, slot_count: 203 }
        );
        assert!(!page.is_slot_used(10_000));
    }

    #[test]
    fn test_malformed_string_length() {
        let mut page = HeapPage::empty(pid(), schema());
        page.write_slot(3, person(3, "ok")).unwrap();
        let mut bytes = page.encode();

        // slot 3 starts after the bitmap; its string prefix follows the int
        let offset = page.layout().slot_offset(3) + 4;
        bytes[offset..offset + 4].copy_from_slice(&13u32.to_be_bytes());

        let err = HeapPage::decode(pid(), &bytes, schema()).unwrap_err();
        assert!(matches!(err, StorageError::MalformedPage { page_id, .. } if page_id == pid()));
    }

    #[test]
    fn test_free_slot_garbage_is_ignored() {
        let mut bytes = empty_page_bytes();
        let offset = PageLayout::new(20, PAGE_SIZE).slot_offset(0);
        bytes[offset..offset + 8].copy_from_slice(&[0xFF; 8]);

        let page = HeapPage::decode(pid(), &bytes, schema()).unwrap();
        assert_eq!(page.occupied_slot_count(), 0);
    }

    #[test]
    fn test_before_image_is_explicit() {
        let mut page = HeapPage::empty(pid(), schema());
        page.insert_tuple(person(1, "a")).unwrap();
        assert_eq!(page.before_image().unwrap().occupied_slot_count(), 0);

        page.set_before_image();
        page.insert_tuple(person(2, "b")).unwrap();

        let before = page.before_image().unwrap();
        assert_eq!(before.occupied_slot_count(), 1);
        assert_eq!(before.tuple(0), Some(&person(1, "a")));
        assert_eq!(page.occupied_slot_count(), 2);
    }

    #[test]
    fn test_dirty_marker() {
        let mut page = HeapPage::empty(pid(), schema());
        assert!(!page.is_dirty());
        assert_eq!(page.dirtied_by(), None);
        page.mark_dirty(true, Some(TransactionId(7)));
        assert!(page.is_dirty());
        assert_eq!(page.dirtied_by(), Some(TransactionId(7)));
        page.mark_dirty(false, Some(TransactionId(7)));
        assert!(!page.is_dirty());
        assert_eq!(page.dirtied_by(), None);
    }

    #[test]
    fn test_dirty_without_a_transaction() {
        let mut page = HeapPage::empty(pid(), schema());
        page.mark_dirty(true, None);
        assert!(page.is_dirty());
        assert_eq!(page.dirtied_by(), None);
        page.mark_dirty(false, None);
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_recompute_bitmap_matches_slots() {
        let mut page = HeapPage::empty(pid(), schema());
        page.write_slot(0, person(1, "a")).unwrap();
        page.write_slot(8, person(2, "b")).unwrap();
        let before = page.bitmap().to_vec();

        page.recompute_bitmap();
        assert_eq!(page.bitmap(), before.as_slice());
        assert_eq!(&page.bitmap()[..2], &[0b0000_0001, 0b0000_0001]);
    }
}
