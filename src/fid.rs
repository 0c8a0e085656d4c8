use crate::cursor::{ListCursor, ListDelta};
use crate::error::{CorruptIndexError, Error};
use crate::file::FidFile;
use crate::page::Page;
use crate::varint::{self, Decode};

/// Seek key large enough to reach end-of-file for any real 56-bit sample
/// stream; used internally to position the cursor for appends.
pub(crate) const SEEK_INFINITY: i64 = i64::MAX;

/// Worst-case bytes an L1 entry plus a following reverse header could need:
/// 1 separator + up to 8 bytes each for the two time deltas + up to 5 bytes
/// each for the two L0-sample counts + up to 2 bytes for the L1-sample
/// count. See the "Open question" in the crate's design notes for why this
/// constant is conservative rather than tight.
const L1_RESERVATION: usize = 29;

/// The composite seek/append state: one file handle, three list cursors
/// (L2/L1/L0), the two resident pages, and the bookkeeping needed to
/// resynchronize cursors across reverse seeks and page completion.
///
/// This is the only type that touches page buffers directly.
pub(crate) struct FidCursor<'f, F: FidFile, const PAGE_SIZE: usize> {
    file: &'f mut F,

    l2_cursor: ListCursor,
    l1_cursor: ListCursor,
    l0_cursor: ListCursor,

    l1_page: Page<PAGE_SIZE>,
    l0_page: Page<PAGE_SIZE>,

    l1_pos: usize,
    l0_pos: usize,

    l0_eof: bool,
    /// Cached highest key seen by `seek_l0`; `None` forces a reset on the
    /// next call, which is how a freshly constructed cursor behaves on its
    /// first seek regardless of key.
    l0_watermark: Option<i64>,
    /// Set whenever an upstream level (L2) jumps forward, forcing `seek_l1`
    /// to resynchronize even though `key` itself might not look like a
    /// reverse seek.
    l1_needs_reset: bool,
}

impl<'f, F: FidFile, const PAGE_SIZE: usize> FidCursor<'f, F, PAGE_SIZE> {
    pub(crate) fn new(file: &'f mut F) -> Self {
        Self {
            file,
            l2_cursor: ListCursor::new(),
            l1_cursor: ListCursor::new(),
            l0_cursor: ListCursor::new(),
            l1_page: Page::new(),
            l0_page: Page::new(),
            l1_pos: 0,
            l0_pos: 0,
            l0_eof: false,
            l0_watermark: None,
            l1_needs_reset: true,
        }
    }

    pub(crate) fn l0_cursor_ordinal(&self) -> i64 {
        self.l0_cursor.ordinal
    }

    pub(crate) fn l0_eof(&self) -> bool {
        self.l0_eof
    }

    pub(crate) fn flush(&mut self) -> Result<(), Error> {
        self.l0_page.flush(self.file)?;
        self.l1_page.flush(self.file)?;
        Ok(())
    }

    pub(crate) fn seek(&mut self, key: i64) -> Result<(), Error> {
        let key = key.max(0);
        self.seek_l2(key)?;
        self.seek_l1(key)?;
        self.seek_l0(key)?;
        Ok(())
    }

    fn seek_l2(&mut self, key: i64) -> Result<(), Error> {
        if key < self.l2_cursor.sample as i64 {
            self.l2_cursor = ListCursor::new();
            self.l1_page.seek(self.file, 0)?;
            self.l1_needs_reset = true;
        }

        loop {
            self.l1_page.ensure_loaded(self.file)?;
            if self.l1_page.byte_at(PAGE_SIZE - 1) == 0x00 {
                break;
            }

            let page = self.l1_page.bytes();
            let mut pos = PAGE_SIZE - 1;
            let t2 = Self::decode_rev_header_field(&page, &mut pos)?;
            let n2 = Self::decode_rev_header_field(&page, &mut pos)?;
            let n_pages = Self::decode_rev_header_field(&page, &mut pos)?;

            if (self.l2_cursor.sample + t2) as i64 < key {
                self.l2_cursor.advance(&ListDelta { time_delta: t2, n_samples: n2 as i64 });
                let new_offset = self.l1_page.offset() + (1 + n_pages) * PAGE_SIZE as u64;
                self.l1_page.seek(self.file, new_offset)?;
                self.l1_needs_reset = true;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn decode_rev_header_field(page: &[u8; PAGE_SIZE], pos: &mut usize) -> Result<u64, Error> {
        match varint::read_rev(page, *pos, 0) {
            Decode::Value { value, new_pos } => {
                *pos = new_pos;
                Ok(value)
            }
            Decode::EndMarker | Decode::HitFence => Err(Error::ShortRead),
        }
    }

    fn seek_l1(&mut self, key: i64) -> Result<(), Error> {
        self.l1_page.ensure_loaded(self.file)?;

        if self.l1_needs_reset || key < self.l1_cursor.sample as i64 {
            self.l1_cursor = self.l2_cursor;
            self.l1_pos = 0;
            self.l0_page.seek(self.file, self.l1_page.offset() + PAGE_SIZE as u64)?;
            self.l0_watermark = None;
            self.l1_needs_reset = false;
        }

        let page = self.l1_page.bytes();
        loop {
            match varint::read_fwd(&page, self.l1_pos, PAGE_SIZE) {
                Decode::EndMarker => break,
                Decode::HitFence => return Err(CorruptIndexError::TruncatedEntry.into()),
                Decode::Value { value: t, new_pos } => {
                    let n = match varint::read_fwd(&page, new_pos, PAGE_SIZE) {
                        Decode::Value { value: n, new_pos: pos_after } => {
                            self.l1_pos = pos_after;
                            n
                        }
                        Decode::EndMarker | Decode::HitFence => {
                            return Err(CorruptIndexError::MissingCount.into());
                        }
                    };

                    if (self.l1_cursor.sample + t) as i64 < key {
                        self.l1_cursor.advance(&ListDelta { time_delta: t, n_samples: n as i64 });
                        self.l0_page.seek(self.file, self.l0_page.offset() + PAGE_SIZE as u64)?;
                        self.l0_watermark = None;
                    } else {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn seek_l0(&mut self, key: i64) -> Result<(), Error> {
        if self.l0_watermark.map_or(true, |w| key < w) {
            self.l0_cursor = self.l1_cursor;
            self.l0_pos = 0;
            self.l0_eof = false;
        }
        self.l0_watermark = Some(key);

        self.l0_page.ensure_loaded(self.file)?;
        let fence = self.l0_page.size();
        let page = self.l0_page.bytes();

        loop {
            if self.l0_cursor.sample as i64 >= key && self.l0_cursor.ordinal >= 0 {
                break;
            }
            match varint::read_fwd(&page, self.l0_pos, fence) {
                Decode::Value { value, new_pos } => {
                    self.l0_cursor.advance(&ListDelta { time_delta: value, n_samples: 1 });
                    self.l0_pos = new_pos;
                }
                Decode::EndMarker | Decode::HitFence => {
                    self.l0_eof = true;
                    break;
                }
            }
        }
        Ok(())
    }

    /// Append one sample. Precondition: the cursor was just positioned with
    /// `seek(SEEK_INFINITY)`.
    pub(crate) fn append(&mut self, sample: u64) -> Result<(), Error> {
        if sample > varint::SAMPLE_MAX {
            return Err(Error::BadValue(sample));
        }
        let l0_delta_time =
            sample.checked_sub(self.l0_cursor.sample).ok_or(Error::Monotonicity)?;

        if self.l0_pos + varint::length(l0_delta_time) > PAGE_SIZE {
            self.finalize_l0_page()?;
        }

        let len = self.l0_page.write_fwd_varint(self.l0_pos, l0_delta_time);
        self.l0_pos += len;
        self.l0_cursor.advance(&ListDelta { time_delta: l0_delta_time, n_samples: 1 });
        self.l0_page.grow(self.l0_pos);

        Ok(())
    }

    fn finalize_l0_page(&mut self) -> Result<(), Error> {
        let l1_delta = ListDelta {
            time_delta: self.l0_cursor.sample - self.l1_cursor.sample,
            n_samples: self.l0_cursor.ordinal - self.l1_cursor.ordinal,
        };

        let len = self.l1_page.write_fwd_varint(self.l1_pos, l1_delta.time_delta);
        self.l1_pos += len;
        let len = self.l1_page.write_fwd_varint(self.l1_pos, l1_delta.n_samples as u64);
        self.l1_pos += len;

        self.l1_cursor.advance(&l1_delta);
        self.l1_page.grow(self.l1_pos);

        if self.l1_pos + L1_RESERVATION > PAGE_SIZE {
            self.finalize_l1_page()?;
        } else {
            self.l0_page.seek(self.file, self.l0_page.offset() + PAGE_SIZE as u64)?;
            self.l0_pos = 0;
        }

        Ok(())
    }

    fn finalize_l1_page(&mut self) -> Result<(), Error> {
        let l2_delta = ListDelta {
            time_delta: self.l0_cursor.sample - self.l2_cursor.sample,
            n_samples: self.l0_cursor.ordinal - self.l2_cursor.ordinal,
        };
        let n_pages = (self.l0_page.offset() - self.l1_page.offset()) / PAGE_SIZE as u64;

        let mut pos = PAGE_SIZE - 1;
        let len = self.l1_page.write_rev_varint(pos, l2_delta.time_delta);
        pos -= len;
        let len = self.l1_page.write_rev_varint(pos, l2_delta.n_samples as u64);
        pos -= len;
        self.l1_page.write_rev_varint(pos, n_pages);

        self.l1_page.grow(PAGE_SIZE);
        self.l2_cursor.advance(&l2_delta);

        self.l1_page.seek(self.file, self.l0_page.offset() + PAGE_SIZE as u64)?;
        self.l1_pos = 0;

        self.l0_page.seek(self.file, self.l1_page.offset() + PAGE_SIZE as u64)?;
        self.l0_pos = 0;

        Ok(())
    }
}
