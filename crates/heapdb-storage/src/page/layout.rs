//! Slot geometry of a heap page.
//!
//! A page is laid out as `[occupancy bitmap][slot 0][slot 1]...[padding]`.
//! Nothing but the page size and the row width decides where a slot starts,
//! so the layout is never written to disk.

/// Derived geometry for pages holding rows of one width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    page_size: usize,
    row_width: usize,
    slot_count: usize,
    header_len: usize,
}

impl PageLayout {
    /// Compute the layout for `row_width`-byte rows on `page_size`-byte pages.
    ///
    /// Every slot costs `row_width * 8` bits of payload plus one bitmap bit:
    /// `slot_count = floor(page_size * 8 / (row_width * 8 + 1))` and the
    /// bitmap takes `ceil(slot_count / 8)` bytes.
    pub fn new(row_width: usize, page_size: usize) -> Self {
        let slot_count = (page_size * 8) / (row_width * 8 + 1);
        let header_len = slot_count.div_ceil(8);
        PageLayout { page_size, row_width, slot_count, header_len }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Bytes taken by the occupancy bitmap.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Byte offset of slot `slot` from the start of the page.
    pub fn slot_offset(&self, slot: usize) -> usize {
        self.header_len + slot * self.row_width
    }

    /// Zero bytes trailing the last slot.
    pub fn padding_len(&self) -> usize {
        self.page_size - self.header_len - self.slot_count * self.row_width
    }
}

// Slot `i` is bit `i % 8` of byte `i / 8`, counting from the least
// significant bit.
#[inline]
pub(crate) fn bit_position(slot: usize) -> (usize, u8) {
    (slot / 8, 1u8 << (slot % 8))
}

pub(crate) fn is_bit_set(bitmap: &[u8], slot: usize) -> bool {
    let (byte, mask) = bit_position(slot);
    bitmap[byte] & mask != 0
}

pub(crate) fn set_bit(bitmap: &mut [u8], slot: usize, used: bool) {
    let (byte, mask) = bit_position(slot);
    if used {
        bitmap[byte] |= mask;
    } else {
        bitmap[byte] &= !mask;
    }
}
