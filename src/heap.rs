use std::ptr::NonNull;

use log::{debug, error, info, trace, warn};

use crate::{
    arena::Arena,
    block::{Block, BlockId, Header},
    config::HeapConfig,
    error::{AllocError, ConfigError},
    kernel::{ArenaProvider, SystemMemory},
    table::BlockTable,
    utils::align,
};


/// A first-fit heap built directly on top of OS page mappings.
///
/// The heap keeps every block it ever carved in one chain. New arenas are
/// appended to the end of the chain, so blocks of the same arena are always
/// consecutive and ordered by address.
///
/// ```text
///   Arena 0                                    Arena 1
/// +--------------------------------------+   +--------------------------+
/// | +-------+    +------+    +-------+   |   | +-------+    +-------+   |
/// | | Block | -> | Free | -> | Block | --|---|>| Block | -> | Free  |   |
/// | +-------+    +------+    +-------+   |   | +-------+    +-------+   |
/// +--------------------------------------+   +--------------------------+
/// ```
///
/// Arenas are only given back to the provider when the heap is dropped; freeing
/// every block of an arena does not unmap it.
///
/// A `Heap` is meant for a single thread and is neither `Send` nor `Sync`.
pub struct Heap<P: ArenaProvider = SystemMemory> {
    config: HeapConfig,
    pub(crate) header_size: usize,
    provider: P,
    /// Every arena acquired so far, indexed by each block's `arena` field.
    pub(crate) arenas: Vec<Arena>,
    pub(crate) blocks: BlockTable,
}

impl Heap<SystemMemory> {
    /// Heap with the default configuration on top of [`SystemMemory`].
    pub fn new() -> Self {
        Self::with_provider(SystemMemory::new())
    }
}

impl Default for Heap<SystemMemory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ArenaProvider> Heap<P> {
    /// Heap with the default configuration on top of `provider`.
    pub fn with_provider(provider: P) -> Self {
        Self::from_parts(HeapConfig::default(), provider)
    }

    pub fn with_config(config: HeapConfig, provider: P) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self::from_parts(config, provider))
    }

    fn from_parts(config: HeapConfig, provider: P) -> Self {
        Self {
            header_size: config.header_size(),
            config,
            provider,
            arenas: Vec::new(),
            blocks: BlockTable::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    #[inline]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns a pointer to at least `size` bytes of memory.
    ///
    /// The size is first rounded up to the configured alignment. The chain is
    /// searched first-fit for a free block; if none is big enough a new arena
    /// is requested. Either way the chosen block is split when what is left
    /// over is worth keeping as a separate free block.
    ///
    /// The returned pointer is aligned to [`HeapConfig::alignment`] and stays
    /// valid until it is given to [`Heap::release`] or the heap is dropped.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        if size == 0 {
            return Err(AllocError::InvalidSize);
        }

        let requested = size;
        let size = align(size, self.config.alignment)
            .ok_or(AllocError::OutOfMemory { requested })?;

        let id = match self.blocks.find_free(size) {
            Some(id) => id,
            None => self.grow(size, requested)?,
        };

        let ptr = self.claim(id, size);
        trace!("allocate({requested}) -> {ptr:?} (block {id}, {size} bytes)");

        Ok(ptr)
    }

    /// Gives the block behind `ptr` back to the heap. Null pointers are ignored.
    ///
    /// `ptr` must come from [`Heap::allocate`] on this heap and must not have
    /// been released already. Pointers that fail validation never touch the
    /// chain: they are reported through `log::error!`, panic in debug builds,
    /// and are otherwise ignored. Use [`Heap::try_release`] to get the error.
    pub fn release(&mut self, ptr: *mut u8) {
        if let Err(err) = self.try_release(ptr) {
            error!("release({ptr:?}) ignored: {err}");

            if cfg!(debug_assertions) {
                panic!("release({ptr:?}): {err}");
            }
        }
    }

    /// Same as [`Heap::release`] but reports invalid pointers instead of
    /// ignoring them.
    pub fn try_release(&mut self, ptr: *mut u8) -> Result<(), AllocError> {
        if ptr.is_null() {
            return Ok(());
        }

        let id = self.locate(ptr)?;
        self.blocks[id].is_free = true;
        trace!("release({ptr:?}) -> block {id} ({} bytes)", self.blocks[id].size);

        let coalesced = self.blocks.coalesce(id, self.header_size);

        // Merged blocks keep their old header in memory, make sure it can never
        // be mistaken for a live one.
        for block in coalesced.retired.into_iter().flatten() {
            self.arenas[block.arena].write_header(block.offset, Header::retired());
        }

        Ok(())
    }

    /// Maps a new arena big enough for `size` bytes plus one header and appends
    /// it to the chain as a single block. `requested` is the caller's size,
    /// reported back on failure.
    fn grow(&mut self, size: usize, requested: usize) -> Result<BlockId, AllocError> {
        let out_of_memory = AllocError::OutOfMemory { requested };

        let len = size
            .checked_add(self.header_size)
            .and_then(|total| align(total, self.config.page_size))
            .filter(|&len| len <= isize::MAX as usize)
            .ok_or(out_of_memory)?;

        let Some(base) = self.provider.request_arena(len) else {
            warn!("provider refused an arena of {len} bytes for a {size} byte request");
            return Err(out_of_memory);
        };

        let arena = self.arenas.len();
        self.arenas.push(Arena::new(base, len));

        let id = self.blocks.append(Block::new(arena, 0, len - self.header_size, false));
        self.write_header(id);

        info!("mapped arena {arena} at {base:?} ({len} bytes)");

        Ok(id)
    }

    /// Marks block `id` as used, splits off what it does not need and returns
    /// its payload.
    fn claim(&mut self, id: BlockId, size: usize) -> NonNull<u8> {
        self.blocks[id].is_free = false;

        let residual = self.blocks.split(id, size, self.header_size, self.config.min_block_size);

        if let Some(residual) = residual {
            self.write_header(residual);
        }

        let block = &self.blocks[id];

        self.arenas[block.arena]
            .payload(block.offset, self.header_size)
            .expect("block lies inside its arena")
    }

    fn write_header(&mut self, id: BlockId) {
        let block = &self.blocks[id];
        let written = self.arenas[block.arena].write_header(block.offset, Header::new(id));

        debug_assert!(written.is_some(), "header of block {id} outside its arena");
    }

    /// Steps back from `ptr` to its header and checks it describes a block in use.
    fn locate(&self, ptr: *mut u8) -> Result<BlockId, AllocError> {
        let addr = ptr as usize;
        let invalid = AllocError::InvalidPointer(addr);

        let (arena_id, offset) = self
            .arenas
            .iter()
            .enumerate()
            .find_map(|(id, arena)| Some((id, arena.offset_of(addr)?)))
            .ok_or(invalid)?;

        let header_offset = offset.checked_sub(self.header_size).ok_or(invalid)?;

        let header = self.arenas[arena_id]
            .read_header(header_offset)
            .filter(Header::is_live)
            .ok_or(invalid)?;

        let block = self
            .blocks
            .get(header.slot)
            .filter(|block| block.arena == arena_id && block.offset == header_offset)
            .ok_or(invalid)?;

        if block.is_free {
            debug!("block {} at {ptr:?} is already free", header.slot);
            return Err(AllocError::DoubleRelease(addr));
        }

        Ok(header.slot)
    }
}

impl<P: ArenaProvider> Drop for Heap<P> {
    fn drop(&mut self) {
        for arena in self.arenas.drain(..) {
            // SAFETY: every arena came from this provider and the heap, which
            // owns all the blocks inside it, is going away.
            unsafe { self.provider.return_arena(arena.base(), arena.len()) };
        }
    }
}
