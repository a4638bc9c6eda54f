use std::ops::{Index, IndexMut};

use crate::block::{Block, BlockId};


/// Growable table of [`Block`] metadata, chained in heap order through indices.
///
/// Blocks never move inside the table, so a [`BlockId`] stays valid until the
/// block is removed. Removed slots are recycled by later insertions.
///
/// ```text
///   slots:  [0: A]  [1: C]  [2: vacant]  [3: B]
///   chain:  A (0) -> B (3) -> C (1)
/// ```
#[derive(Debug, Default)]
pub(crate) struct BlockTable {
    slots: Vec<Option<Block>>,
    vacant: Vec<BlockId>,
    head: Option<BlockId>,
    tail: Option<BlockId>,
    len: usize,
}

pub(crate) struct Iter<'a> {
    table: &'a BlockTable,
    current: Option<BlockId>,
    remaining: usize,
}

impl BlockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks currently in the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.slots.get(id)?.as_ref()
    }

    /// Stores `block` in a free slot without linking it into the chain.
    fn insert(&mut self, block: Block) -> BlockId {
        self.len += 1;

        match self.vacant.pop() {
            Some(id) => {
                self.slots[id] = Some(block);
                id
            }
            None => {
                self.slots.push(Some(block));
                self.slots.len() - 1
            }
        }
    }

    /// Appends `block` to the tail of the chain.
    pub fn append(&mut self, mut block: Block) -> BlockId {
        block.prev = self.tail;
        block.next = None;

        let id = self.insert(block);

        match self.tail {
            Some(tail) => self[tail].next = Some(id),
            None => self.head = Some(id),
        }

        self.tail = Some(id);

        id
    }

    /// Links `block` into the chain right after `at`.
    pub fn insert_after(&mut self, at: BlockId, mut block: Block) -> BlockId {
        let next = self[at].next;

        block.prev = Some(at);
        block.next = next;

        let id = self.insert(block);

        self[at].next = Some(id);

        match next {
            Some(next) => self[next].prev = Some(id),
            None => self.tail = Some(id),
        }

        id
    }

    /// Unlinks `id` from the chain and releases its slot.
    pub fn remove(&mut self, id: BlockId) -> Block {
        let block = self.slots[id].take().expect("removing a vacant block slot");

        match block.prev {
            Some(prev) => self[prev].next = block.next,
            None => self.head = block.next,
        }

        match block.next {
            Some(next) => self[next].prev = block.prev,
            None => self.tail = block.prev,
        }

        self.vacant.push(id);
        self.len -= 1;

        block
    }

    /// Blocks in chain order together with their slots.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self,
            current: self.head,
            remaining: self.len,
        }
    }
}

impl Index<BlockId> for BlockTable {
    type Output = Block;

    #[inline]
    fn index(&self, id: BlockId) -> &Block {
        self.slots[id].as_ref().expect("vacant block slot")
    }
}

impl IndexMut<BlockId> for BlockTable {
    #[inline]
    fn index_mut(&mut self, id: BlockId) -> &mut Block {
        self.slots[id].as_mut().expect("vacant block slot")
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (BlockId, &'a Block);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let block = &self.table[id];

        self.current = block.next;
        self.remaining -= 1;

        Some((id, block))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> IntoIterator for &'a BlockTable {
    type Item = (BlockId, &'a Block);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
