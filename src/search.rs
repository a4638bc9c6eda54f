use log::trace;

use crate::{block::BlockId, table::BlockTable};


impl BlockTable {
    /// Returns the slot of a free block that can hold `size` bytes.
    ///
    /// This uses the first-fit algorithm: it walks the chain from the head and
    /// returns the first free block that is big enough, even if a tighter one
    /// exists further down. O(n) in the number of blocks.
    pub(crate) fn find_free(&self, size: usize) -> Option<BlockId> {
        let found = self
            .iter()
            .find(|(_, block)| block.is_free && block.size >= size)
            .map(|(id, _)| id);

        trace!("first fit for {size} bytes: {found:?}");

        found
    }
}

#[cfg(test)]
mod tests {
    use crate::block::Block;
    use crate::table::BlockTable;

    fn table(blocks: &[(usize, bool)]) -> BlockTable {
        let mut table = BlockTable::new();
        let mut offset = 0;

        for &(size, is_free) in blocks {
            table.append(Block::new(0, offset, size, is_free));
            offset += 16 + size;
        }

        table
    }

    #[test]
    fn empty_table_has_no_fit() {
        assert_eq!(BlockTable::new().find_free(4), None);
    }

    #[test]
    fn first_fit_beats_best_fit() {
        let table = table(&[(64, false), (500, true), (100, true)]);

        assert_eq!(table.find_free(100), Some(1));
    }

    #[test]
    fn used_and_small_blocks_are_skipped() {
        let table = table(&[(500, false), (40, true), (120, true)]);

        assert_eq!(table.find_free(100), Some(2));
        assert_eq!(table.find_free(120), Some(2));
        assert_eq!(table.find_free(124), None);
    }
}
