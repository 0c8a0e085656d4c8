//! An append-only, disk-resident database of monotonically non-decreasing
//! integer timestamps ("samples"), built around a three-level skip-list
//! (`L0` leaf pages, `L1` index pages whose tail carries a reverse-encoded
//! `L2` record). Optimized for two workloads: appending samples at the
//! tail, and finding the ordinal of the first sample `>= key` (a "seek").
//!
//! The file format has no header, magic number, or trailer — an empty file
//! is a valid, zero-sample database. See [`append_samples`] and
//! [`query_samples`] for the two operations this crate exposes; everything
//! else here is the machinery they're built on.

mod cursor;
mod error;
mod fid;
mod file;
mod ops;
mod page;
mod varint;

pub use error::{CorruptIndexError, Error};
pub use file::FidFile;
pub use ops::{append_samples, append_samples_sized, query_samples, query_samples_sized};
pub use page::DEFAULT_PAGE_SIZE;
pub use varint::SAMPLE_MAX;
