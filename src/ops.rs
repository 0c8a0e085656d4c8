use crate::error::Error;
use crate::fid::{FidCursor, SEEK_INFINITY};
use crate::file::FidFile;
use crate::page::DEFAULT_PAGE_SIZE;

/// Append `samples` (an ordered, non-decreasing sequence of 56-bit values)
/// to the file. On success both resident pages are flushed. On failure the
/// engine still attempts a best-effort flush so the file contains a prefix
/// of the accepted samples satisfying every on-disk invariant, then
/// surfaces the original error.
pub fn append_samples<F: FidFile>(
    file: &mut F,
    samples: impl IntoIterator<Item = u64>,
) -> Result<(), Error> {
    append_samples_sized::<F, DEFAULT_PAGE_SIZE>(file, samples)
}

/// Resolve the ordinal index of the first sample `>= key` for each key in
/// `keys`, in input order. A key past the end of the stream yields
/// `len(samples)`. On error, results accumulated so far are discarded.
pub fn query_samples<F: FidFile>(
    file: &mut F,
    keys: impl IntoIterator<Item = i64>,
) -> Result<Vec<u64>, Error> {
    query_samples_sized::<F, DEFAULT_PAGE_SIZE>(file, keys)
}

/// Same as [`append_samples`] but with an explicit page size. Primarily
/// useful for testing the engine at page sizes too small to use in
/// production (the external contract fixes `PAGE_SIZE` at a build-time
/// constant; see the crate's external-interfaces notes).
pub fn append_samples_sized<F: FidFile, const PAGE_SIZE: usize>(
    file: &mut F,
    samples: impl IntoIterator<Item = u64>,
) -> Result<(), Error> {
    let mut cursor = FidCursor::<F, PAGE_SIZE>::new(file);
    cursor.seek(SEEK_INFINITY)?;

    match samples.into_iter().try_for_each(|s| cursor.append(s)) {
        Ok(()) => {
            cursor.flush()?;
            Ok(())
        }
        Err(e) => {
            let _ = cursor.flush();
            Err(e)
        }
    }
}

/// Same as [`query_samples`] but with an explicit page size.
pub fn query_samples_sized<F: FidFile, const PAGE_SIZE: usize>(
    file: &mut F,
    keys: impl IntoIterator<Item = i64>,
) -> Result<Vec<u64>, Error> {
    let mut cursor = FidCursor::<F, PAGE_SIZE>::new(file);
    let mut results = Vec::new();
    for key in keys {
        cursor.seek(key)?;
        let ordinal = cursor.l0_cursor_ordinal() + if cursor.l0_eof() { 1 } else { 0 };
        results.push(ordinal as u64);
    }
    Ok(results)
}
