use crate::{block::META_SIZE, error::ConfigError, kernel, utils::align};

/// Default alignment of every block size. Narrower than a pointer, kept
/// configurable through [`HeapConfig::with_alignment`].
pub const DEFAULT_ALIGNMENT: usize = 4;

/// Default arena granularity. Arenas are always a multiple of this value.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Smallest residual a split is allowed to leave behind.
pub const MIN_BLOCK_SIZE: usize = 32;

/// Tunables of a [`crate::Heap`].
///
/// ```
/// use firstfit::{HeapConfig, META_SIZE};
///
/// let config = HeapConfig::default().with_alignment(8).with_min_block_size(64);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.header_size(), META_SIZE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Every block size is rounded up to a multiple of this value.
    pub alignment: usize,
    /// Arena sizes are rounded up to a multiple of this value.
    pub page_size: usize,
    /// A block is only split when the leftover payload is at least this big.
    pub min_block_size: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            page_size: DEFAULT_PAGE_SIZE,
            min_block_size: MIN_BLOCK_SIZE,
        }
    }
}

impl HeapConfig {
    /// Default configuration using the page size reported by the OS.
    pub fn system() -> Self {
        Self::default().with_page_size(kernel::system_page_size())
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_min_block_size(mut self, min_block_size: usize) -> Self {
        self.min_block_size = min_block_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alignment.is_power_of_two() {
            return Err(ConfigError::Alignment(self.alignment));
        }

        if !self.page_size.is_power_of_two() {
            return Err(ConfigError::PageSize(self.page_size));
        }

        // Arenas start page aligned, so payloads can never be aligned beyond that.
        if self.alignment > self.page_size {
            return Err(ConfigError::AlignmentExceedsPage {
                alignment: self.alignment,
                page_size: self.page_size,
            });
        }

        if self.min_block_size == 0 {
            return Err(ConfigError::MinBlockSize);
        }

        Ok(())
    }

    /// Width of the in-band header. This is [`META_SIZE`] unless the alignment is
    /// wider than the header itself, in which case payloads would end up misaligned.
    #[inline]
    pub fn header_size(&self) -> usize {
        align(META_SIZE, self.alignment).unwrap_or(META_SIZE)
    }
}
