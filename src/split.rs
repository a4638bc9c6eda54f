use log::debug;

use crate::{
    block::{Block, BlockId},
    table::BlockTable,
};


impl BlockTable {
    /// Shrinks block `id` to exactly `size` bytes and turns the rest of its
    /// content into a new free block placed right after it.
    ///
    /// ```text
    /// before:  | Header |               Content (block.size)                |
    /// after:   | Header | Content (size) | Header | Content (residual, free) |
    /// ```
    ///
    /// The split only happens if the residual content would be at least
    /// `min_block_size` bytes; otherwise the whole block is handed out as is.
    /// Returns the slot of the new block, whose in-band header still has to be
    /// written by the caller.
    pub(crate) fn split(
        &mut self,
        id: BlockId,
        size: usize,
        header_size: usize,
        min_block_size: usize,
    ) -> Option<BlockId> {
        let block = self[id];

        debug_assert!(block.size >= size, "splitting a block smaller than the request");

        // A threshold past usize::MAX can never be met.
        let threshold = size
            .checked_add(header_size)
            .and_then(|needed| needed.checked_add(min_block_size));

        if threshold.is_none_or(|threshold| block.size < threshold) {
            debug!("block {id} ({} bytes) too small to split for {size}", block.size);
            return None;
        }

        self[id].size = size;

        let residual = Block::new(
            block.arena,
            self[id].end(header_size),
            block.size - size - header_size,
            true,
        );
        let residual_id = self.insert_after(id, residual);

        debug!(
            "split block {id}: {size} bytes kept, {} bytes in new free block {residual_id}",
            residual.size
        );

        Some(residual_id)
    }
}
