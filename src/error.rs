use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::io;

/// Detail carried by [`Error::CorruptIndex`].
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[non_exhaustive]
pub enum CorruptIndexError {
    /// The forward region of an L1 page hit the page fence while decoding a
    /// `t_delta`, instead of reading a clean `END_MARKER`.
    TruncatedEntry,
    /// An L1 entry's `t_delta` decoded fine but the matching `n_delta` did not.
    MissingCount,
}

impl Display for CorruptIndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "corrupt index: {:?}", self)
    }
}

impl StdError for CorruptIndexError {}

/// Every way a core operation (`append_samples`/`query_samples`) can fail.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An underlying read/write/seek failure. Wraps the OS error as-is.
    Io(io::Error),
    /// An append sample was smaller than the previously-appended sample.
    Monotonicity,
    /// A sample value fell outside `[0, 2^56)`.
    BadValue(u64),
    /// The on-disk L1 index is structurally inconsistent.
    CorruptIndex(CorruptIndexError),
    /// A record was truncated in a way that can't be a legitimate tail page.
    ShortRead,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Monotonicity => write!(f, "sample value is less than the previous sample"),
            Error::BadValue(v) => write!(f, "sample value {} is outside [0, 2^56)", v),
            Error::CorruptIndex(e) => write!(f, "{}", e),
            Error::ShortRead => write!(f, "short read: record truncated mid-way"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::CorruptIndex(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<CorruptIndexError> for Error {
    fn from(e: CorruptIndexError) -> Self {
        Error::CorruptIndex(e)
    }
}
