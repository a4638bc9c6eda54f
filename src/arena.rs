use std::ptr::NonNull;

use crate::block::{Header, META_SIZE};


/// A contiguous memory region obtained with one [`crate::ArenaProvider::request_arena`]
/// call, later subdivided into blocks.
///
/// The OS gives us arenas aligned to the page size, but we cannot assume two
/// arenas are adjacent. Every block therefore remembers which arena it lives in,
/// and all the offset <-> address arithmetic of the heap goes through here.
///
/// ```text
///  base                                                     base + len
///   |                                                            |
///   v                                                            v
///   +--------+---------+--------+---------+--------+-------------+
///   | Header | Content | Header | Content | Header |   Content   |
///   +--------+---------+--------+---------+--------+-------------+
///   ^                  ^                  ^
///   offset 0           offset a           offset b
/// ```
#[derive(Debug)]
pub(crate) struct Arena {
    base: NonNull<u8>,
    len: usize,
}

impl Arena {
    pub fn new(base: NonNull<u8>, len: usize) -> Self {
        Self { base, len }
    }

    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Offset of `addr` from the start of this arena, if it points inside it.
    #[inline]
    pub fn offset_of(&self, addr: usize) -> Option<usize> {
        let base = self.base.as_ptr() as usize;

        (base..base + self.len).contains(&addr).then(|| addr - base)
    }

    /// Address of `width` bytes starting at `offset`. This is the only place where
    /// an offset becomes a pointer, and it refuses anything that would run past
    /// the end of the arena.
    #[inline]
    fn at(&self, offset: usize, width: usize) -> Option<NonNull<u8>> {
        if offset.checked_add(width)? > self.len {
            return None;
        }

        // SAFETY: `offset + width <= len` so the result stays inside the mapping.
        Some(unsafe { self.base.add(offset) })
    }

    /// User pointer of the block whose header lives at `offset`.
    #[inline]
    pub fn payload(&self, offset: usize, header_size: usize) -> Option<NonNull<u8>> {
        self.at(offset.checked_add(header_size)?, 0)
    }

    pub fn read_header(&self, offset: usize) -> Option<Header> {
        let ptr = self.at(offset, META_SIZE)?;

        // SAFETY: `at` checked the whole header is inside the arena. Headers
        // are only 4-byte aligned in general, hence the unaligned access.
        Some(unsafe { ptr.cast::<Header>().as_ptr().read_unaligned() })
    }

    pub fn write_header(&mut self, offset: usize, header: Header) -> Option<()> {
        let ptr = self.at(offset, META_SIZE)?;

        // SAFETY: same as `read_header`.
        unsafe { ptr.cast::<Header>().as_ptr().write_unaligned(header) };

        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{ArenaProvider, SystemMemory};

    fn with_arena(len: usize, test: impl FnOnce(&mut Arena)) {
        let mut memory = SystemMemory::new();
        let base = memory.request_arena(len).expect("mmap should succeed");
        let mut arena = Arena::new(base, len);

        test(&mut arena);

        unsafe { memory.return_arena(base, len) };
    }

    #[test]
    fn header_round_trips_at_unaligned_offsets() {
        with_arena(4096, |arena| {
            arena.write_header(4, Header::new(7)).unwrap();
            arena.write_header(4096 - META_SIZE, Header::new(9)).unwrap();

            assert_eq!(arena.read_header(4), Some(Header::new(7)));
            assert_eq!(arena.read_header(4096 - META_SIZE), Some(Header::new(9)));
        });
    }

    #[test]
    fn out_of_bounds_access_is_refused() {
        with_arena(4096, |arena| {
            assert!(arena.read_header(4096 - META_SIZE + 1).is_none());
            assert!(arena.write_header(4096, Header::new(0)).is_none());
            assert!(arena.payload(4096, 1).is_none());
            assert!(arena.read_header(usize::MAX).is_none());
        });
    }

    #[test]
    fn offsets_are_relative_to_the_base() {
        with_arena(4096, |arena| {
            let base = arena.base().as_ptr() as usize;

            assert_eq!(arena.offset_of(base), Some(0));
            assert_eq!(arena.offset_of(base + 4095), Some(4095));
            assert_eq!(arena.offset_of(base + 4096), None);
            assert_eq!(arena.offset_of(base - 1), None);

            let payload = arena.payload(0, META_SIZE).unwrap();
            assert_eq!(payload.as_ptr() as usize, base + META_SIZE);
        });
    }
}
