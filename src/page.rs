use crate::error::Error;
use crate::file::FidFile;
use crate::varint;

/// The canonical, production page size. Tests exercise smaller sizes (down
/// to 32 bytes) by instantiating [`Page`] with a different const parameter.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// A single resident page: a fixed-size buffer mapped to one page-aligned
/// file offset, with the dirty/clean and loaded/unloaded bookkeeping needed
/// to keep writes coalesced and reads lazy.
///
/// Writes only ever touch `data[..size]` on disk — bytes past `size` are
/// whatever was last decoded into the buffer and are never flushed. Once a
/// later page is written past this one, the gap reads back as zero courtesy
/// of ordinary sparse-file semantics, which is why [`Page::read`] need only
/// zero-fill its own in-memory tail rather than the file itself.
pub(crate) struct Page<const PAGE_SIZE: usize> {
    data: [u8; PAGE_SIZE],
    offset: u64,
    size: usize,
    need_read: bool,
    need_write: bool,
}

impl<const PAGE_SIZE: usize> Page<PAGE_SIZE> {
    pub(crate) fn new() -> Self {
        Self { data: [0; PAGE_SIZE], offset: 0, size: 0, need_read: true, need_write: false }
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// A copy of the page buffer, cheap enough for scanning loops that also
    /// need to mutate sibling fields (a different resident page, or the
    /// file) without fighting the borrow checker over a live reference.
    pub(crate) fn bytes(&self) -> [u8; PAGE_SIZE] {
        self.data
    }

    pub(crate) fn byte_at(&self, i: usize) -> u8 {
        self.data[i]
    }

    pub(crate) fn ensure_loaded<F: FidFile>(&mut self, file: &mut F) -> Result<(), Error> {
        if !self.need_read {
            return Ok(());
        }
        let n = file.read_at(&mut self.data, self.offset)?;
        self.size = n;
        for b in &mut self.data[n..] {
            *b = 0;
        }
        self.need_read = false;
        Ok(())
    }

    pub(crate) fn flush<F: FidFile>(&mut self, file: &mut F) -> Result<(), Error> {
        if !self.need_write {
            return Ok(());
        }
        file.write_all_at(&self.data[..self.size], self.offset)?;
        self.need_write = false;
        Ok(())
    }

    pub(crate) fn seek<F: FidFile>(&mut self, file: &mut F, new_offset: u64) -> Result<(), Error> {
        if new_offset == self.offset {
            return Ok(());
        }
        self.flush(file)?;
        self.offset = new_offset;
        self.size = 0;
        self.need_read = true;
        self.need_write = false;
        Ok(())
    }

    /// Extend the logical occupied length of the buffer up to `new_end` and
    /// mark the page dirty. A no-op if the page already reaches that far.
    pub(crate) fn grow(&mut self, new_end: usize) {
        if new_end > self.size {
            self.size = new_end;
        }
        self.need_write = true;
    }

    pub(crate) fn write_fwd_varint(&mut self, pos: usize, value: u64) -> usize {
        varint::write_fwd(value, &mut self.data, pos)
    }

    pub(crate) fn write_rev_varint(&mut self, pos: usize, value: u64) -> usize {
        varint::write_rev(value, &mut self.data, pos)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::file::MemFile;

    #[test]
    fn fresh_page_reads_as_all_zero() {
        let mut file = MemFile::new();
        let mut page: Page<32> = Page::new();
        page.ensure_loaded(&mut file).unwrap();
        assert_eq!(page.size(), 0);
        for i in 0..32 {
            assert_eq!(page.byte_at(i), 0);
        }
    }

    #[test]
    fn write_then_read_back_round_trips() {
        let mut file = MemFile::new();
        let mut page: Page<32> = Page::new();
        let len = page.write_fwd_varint(0, 12345);
        page.grow(len);
        page.flush(&mut file).unwrap();

        let mut page2: Page<32> = Page::new();
        page2.ensure_loaded(&mut file).unwrap();
        assert_eq!(page2.size(), len);
        match varint::read_fwd(&page2.bytes(), 0, 32) {
            varint::Decode::Value { value, .. } => assert_eq!(value, 12345),
            other => panic!("expected Value, got {:?}", other),
        }
    }

    #[test]
    fn seek_flushes_dirty_page_before_moving() {
        let mut file = MemFile::new();
        let mut page: Page<32> = Page::new();
        let len = page.write_fwd_varint(0, 7);
        page.grow(len);
        page.seek(&mut file, 32).unwrap();
        assert_eq!(&file.contents()[..1], &[0x80 | 7]);
        assert_eq!(page.offset(), 32);
        assert_eq!(page.size(), 0);
    }
}
