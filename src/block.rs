use std::mem;


/// Index of a [`Block`] inside the [`crate::table::BlockTable`].
pub(crate) type BlockId = usize;

/// Index of an [`crate::arena::Arena`] inside the heap.
pub(crate) type ArenaId = usize;

/// Size in bytes of the in-band [`Header`] that precedes every payload.
pub const META_SIZE: usize = mem::size_of::<Header>();

/// Value stored in every live header. Anything else at `payload - META_SIZE`
/// means the pointer was never handed out by us, or its block was merged away.
pub(crate) const HEADER_MAGIC: usize = 0xB10C_F1F7;

/// This is the in-band header written right before the content of a block.
/// It only has to get us back from a user pointer to the block's metadata,
/// which lives in the block table.
///
/// ```text
/// +---------------------+ <------+
/// |        slot         |        |
/// +---------------------+        | -> Header (META_SIZE bytes)
/// |        magic        |        |
/// +---------------------+ <------+ <- pointer returned to the user
/// |       Content       |        |
/// |         ...         |        | -> Addressable content (`Block::size` bytes)
/// |         ...         |        |
/// +---------------------+ <------+
/// ```
///
/// Headers can land on any multiple of the heap alignment, which may be narrower
/// than a pointer, so they are always read and written unaligned.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    /// Slot of the block in the block table.
    pub slot: BlockId,
    /// Always [`HEADER_MAGIC`] for a live block.
    pub magic: usize,
}

impl Header {
    #[inline]
    pub fn new(slot: BlockId) -> Self {
        Self { slot, magic: HEADER_MAGIC }
    }

    /// Header left behind when a block is merged into a neighbour.
    #[inline]
    pub fn retired() -> Self {
        Self { slot: usize::MAX, magic: 0 }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.magic == HEADER_MAGIC
    }
}

/// Metadata of a block. The fields of the block are its metadata,
/// content is placed after the in-band header at `offset` inside its arena.
///
/// Blocks are chained in allocation order through `prev` / `next`, which are
/// slots of the block table rather than raw addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block {
    /// Usable payload bytes, excluding the header.
    pub size: usize,
    /// Flag to tell whether the block is free or not.
    pub is_free: bool,
    /// Arena which the block belongs to.
    pub arena: ArenaId,
    /// Offset of the block's header from the start of its arena.
    pub offset: usize,
    /// Previous block in the chain.
    pub prev: Option<BlockId>,
    /// Next block in the chain.
    pub next: Option<BlockId>,
}

impl Block {
    pub fn new(arena: ArenaId, offset: usize, size: usize, is_free: bool) -> Self {
        Self {
            size,
            is_free,
            arena,
            offset,
            prev: None,
            next: None,
        }
    }

    /// Offset right past the end of this block's content.
    #[inline]
    pub fn end(&self, header_size: usize) -> usize {
        self.offset + header_size + self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fits_in_meta_size() {
        assert_eq!(META_SIZE, 2 * mem::size_of::<usize>());
    }

    #[test]
    fn retired_header_is_not_live() {
        assert!(Header::new(3).is_live());
        assert!(!Header::retired().is_live());
    }

    #[test]
    fn block_end_covers_header_and_content() {
        let block = Block::new(0, 64, 100, false);

        assert_eq!(block.end(META_SIZE), 64 + META_SIZE + 100);
    }
}
