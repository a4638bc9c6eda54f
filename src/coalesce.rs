use log::debug;

use crate::{
    block::{Block, BlockId},
    table::BlockTable,
};


/// Outcome of [`BlockTable::coalesce`].
#[derive(Debug)]
pub(crate) struct Coalesced {
    /// The free block that now covers the merged span.
    pub survivor: BlockId,
    /// Blocks that were absorbed. Their in-band headers are stale.
    pub retired: [Option<Block>; 2],
}

impl BlockTable {
    /// Merges the freshly freed block `id` with its free neighbours.
    ///
    /// First the next block is absorbed into `id` if it is free, then `id` is
    /// absorbed into the previous block if that one is free. Each direction is
    /// tried exactly once, so a longer run of free blocks is only merged one hop
    /// each way.
    ///
    /// ```text
    /// +------+------+------+      +--------------------+
    /// | Free | Freed| Free |  =>  |        Free        |
    /// +------+------+------+      +--------------------+
    /// ```
    ///
    /// Blocks from different arenas are never merged: the chain links arenas
    /// one after the other, but their memory is not contiguous.
    pub(crate) fn coalesce(&mut self, id: BlockId, header_size: usize) -> Coalesced {
        let mut coalesced = Coalesced { survivor: id, retired: [None, None] };

        if let Some(next) = self[id].next {
            if self.mergeable(id, next) {
                let absorbed = self.remove(next);
                self[id].size += header_size + absorbed.size;

                debug!("block {id} absorbed next block {next} ({} bytes)", absorbed.size);
                coalesced.retired[0] = Some(absorbed);
            }
        }

        if let Some(prev) = self[id].prev {
            if self.mergeable(prev, id) {
                let absorbed = self.remove(id);
                self[prev].size += header_size + absorbed.size;

                debug!("previous block {prev} absorbed block {id} ({} bytes)", absorbed.size);
                coalesced.retired[1] = Some(absorbed);
                coalesced.survivor = prev;
            }
        }

        coalesced
    }

    /// `second` can be folded into `first` if both are free and share an arena.
    #[inline]
    fn mergeable(&self, first: BlockId, second: BlockId) -> bool {
        let (first, second) = (&self[first], &self[second]);

        first.is_free && second.is_free && first.arena == second.arena
    }
}
