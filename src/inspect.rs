use std::fmt;

use crate::{heap::Heap, kernel::ArenaProvider};


/// Line printed after the last block of a [`HeapDump`].
pub const DUMP_SENTINEL: &str = "-..----..-";

/// Read-only view of one block, as reported by [`Heap::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Position of the block in chain order.
    pub index: usize,
    /// Address of the block's header.
    pub address: usize,
    /// Address handed out to the user for this block.
    pub payload: usize,
    /// Usable payload bytes.
    pub size: usize,
    pub is_free: bool,
    /// Which arena acquisition the block lives in, counting from 0.
    pub arena: usize,
}

/// Aggregated numbers about a [`Heap`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub arenas: usize,
    /// Total bytes obtained from the provider.
    pub mapped_bytes: usize,
    pub blocks: usize,
    pub free_blocks: usize,
    /// Payload bytes of free blocks.
    pub free_bytes: usize,
    /// Payload bytes of blocks in use.
    pub used_bytes: usize,
}

/// [`fmt::Display`] adapter printing one line per block followed by [`DUMP_SENTINEL`].
///
/// ```text
/// Block 0: addr=0x7f3a1c000000, size=52, free=false
/// Block 1: addr=0x7f3a1c000044, size=4012, free=true
/// -..----..-
/// ```
pub struct HeapDump<'a, P: ArenaProvider> {
    heap: &'a Heap<P>,
}

impl<P: ArenaProvider> Heap<P> {
    /// Walks the chain in order without touching it.
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        let header_size = self.header_size;

        self.blocks.iter().enumerate().map(move |(index, (_, block))| {
            let address = self.arenas[block.arena].base().as_ptr() as usize + block.offset;

            BlockInfo {
                index,
                address,
                payload: address + header_size,
                size: block.size,
                is_free: block.is_free,
                arena: block.arena,
            }
        })
    }

    pub fn dump(&self) -> HeapDump<'_, P> {
        HeapDump { heap: self }
    }

    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            arenas: self.arenas.len(),
            mapped_bytes: self.arenas.iter().map(|arena| arena.len()).sum(),
            blocks: self.blocks.len(),
            ..HeapStats::default()
        };

        for (_, block) in &self.blocks {
            if block.is_free {
                stats.free_blocks += 1;
                stats.free_bytes += block.size;
            } else {
                stats.used_bytes += block.size;
            }
        }

        stats
    }
}

impl<P: ArenaProvider> fmt::Display for HeapDump<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in self.heap.blocks() {
            writeln!(
                f,
                "Block {}: addr={:#x}, size={}, free={}",
                block.index, block.address, block.size, block.is_free
            )?;
        }

        writeln!(f, "{DUMP_SENTINEL}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block::META_SIZE, kernel::testing::CountingMemory};

    #[test]
    fn empty_heap_dumps_only_the_sentinel() {
        let heap = Heap::new();

        assert_eq!(heap.dump().to_string(), format!("{DUMP_SENTINEL}\n"));
        assert_eq!(heap.stats(), HeapStats::default());
    }

    #[test]
    fn dump_lists_blocks_in_chain_order() {
        let mut heap = Heap::new();
        let a = heap.allocate(100).unwrap();
        heap.allocate(200).unwrap();
        heap.release(a.as_ptr());

        let dump = heap.dump().to_string();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Block 0: addr=0x"));
        assert!(lines[0].ends_with("size=100, free=true"));
        assert!(lines[1].ends_with("size=200, free=false"));
        assert!(lines[2].starts_with("Block 2: "));
        assert_eq!(lines[3], DUMP_SENTINEL);
    }

    #[test]
    fn block_info_points_at_header_and_payload() {
        let mut heap = Heap::new();
        let a = heap.allocate(24).unwrap();

        let info = heap.blocks().next().unwrap();

        assert_eq!(info.index, 0);
        assert_eq!(info.payload, a.as_ptr() as usize);
        assert_eq!(info.address + META_SIZE, info.payload);
        assert_eq!(info.size, 24);
        assert!(!info.is_free);
        assert_eq!(info.arena, 0);
    }

    #[test]
    fn stats_account_for_every_byte() {
        let mut memory = CountingMemory::default();
        let mut heap = Heap::with_provider(&mut memory);
        heap.allocate(100).unwrap();
        heap.allocate(5000).unwrap();

        let stats = heap.stats();

        assert_eq!(stats.arenas, 2);
        assert_eq!(stats.mapped_bytes, heap.provider().mapped);
        assert_eq!(stats.used_bytes, 100 + 5000);
        assert_eq!(
            stats.used_bytes + stats.free_bytes + stats.blocks * META_SIZE,
            stats.mapped_bytes
        );
    }

    #[test]
    fn inspecting_does_not_change_the_heap() {
        let mut heap = Heap::new();
        let a = heap.allocate(64).unwrap();
        heap.allocate(64).unwrap();
        heap.release(a.as_ptr());

        let before: Vec<BlockInfo> = heap.blocks().collect();
        let _ = heap.dump().to_string();
        let _ = heap.stats();

        assert_eq!(before, heap.blocks().collect::<Vec<_>>());
    }
}
