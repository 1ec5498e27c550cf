//! Error type for the bounded-capacity bookkeeping.

use core::fmt;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Every hole record of the slot is in use.
    HoleListFull,
    /// The slot still tracks holes and cannot be released.
    HolesOutstanding,
    /// The slot is not acquired by any connection.
    SlotNotOwned,
}

/// Error returned by the hole allocator and the buffer pool.
///
/// None of these reach the caller of
/// [`ReassemblyEngine::receive_segment`](crate::engine::ReassemblyEngine::receive_segment):
/// the engine degrades instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind.
    pub const fn new(kind: ErrorKind) -> Self {
        Error { kind }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::HoleListFull => write!(f, "Hole list is full"),
            ErrorKind::HolesOutstanding => write!(f, "Slot still has holes"),
            ErrorKind::SlotNotOwned => write!(f, "Slot is not owned"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
