use thiserror::Error;

/// Errors reported by [`crate::Heap`] operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// `allocate(0)` was requested.
    #[error("cannot allocate a block of size 0")]
    InvalidSize,

    /// The OS refused to map a new arena, or the request cannot be represented
    /// in the address space at all.
    #[error("out of memory while requesting {requested} bytes")]
    OutOfMemory {
        /// Size passed to `allocate`, before alignment.
        requested: usize,
    },

    /// The pointer was not returned by this heap's `allocate`.
    #[error("pointer {0:#x} was not allocated by this heap")]
    InvalidPointer(usize),

    /// The pointer refers to a block that is already free.
    #[error("pointer {0:#x} was already released")]
    DoubleRelease(usize),
}

/// Errors reported while validating a [`crate::HeapConfig`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("alignment {0} is not a power of two")]
    Alignment(usize),

    #[error("page size {0} is not a power of two")]
    PageSize(usize),

    #[error("alignment {alignment} is larger than the page size {page_size}")]
    AlignmentExceedsPage { alignment: usize, page_size: usize },

    #[error("minimum block size must be greater than zero")]
    MinBlockSize,
}
