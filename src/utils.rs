//! This file contains all the helper functions for the allocator.
//! This are functions that don't particularly belong to any concrete module of the program.


/// It aligns `to_be_aligned` up to the next multiple of `alignment`, which must be
/// a power of two. Returns `None` if the result does not fit in a `usize`.
///
/// This method is used to align arena sizes to be a multiple of the page size
/// and block sizes to be a multiple of the heap's alignment.
#[inline]
pub fn align(to_be_aligned: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());

    Some(to_be_aligned.checked_add(alignment - 1)? & !(alignment - 1))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_to_four_bytes() {
        let alignments = vec![(1..=4, 4), (5..=8, 8), (97..=100, 100), (197..=200, 200)];

        for (sizes, expected) in alignments {
            for size in sizes {
                assert_eq!(Some(expected), align(size, 4));
            }
        }
    }

    #[test]
    fn align_page_size() {
        // For testing purposes we are assuming the page size is 4096
        let alignments = vec![(1..=4096, 4096), (4097..=8192, 8192)];

        for (sizes, expected) in alignments {
            for size in sizes {
                assert_eq!(Some(expected), align(size, 4096))
            }
        }
    }

    #[test]
    fn aligned_values_are_unchanged() {
        assert_eq!(Some(0), align(0, 4));
        assert_eq!(Some(4096), align(4096, 4096));
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(None, align(usize::MAX, 4));
        assert_eq!(None, align(usize::MAX - 100, 4096));
    }
}
