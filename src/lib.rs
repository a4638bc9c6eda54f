//! # firstfit - a first-fit heap on top of OS page mappings
//!
//! [`Heap`] hands out memory carved from arenas it maps straight from the
//! operating system (`mmap` on Unix, `VirtualAlloc` on Windows), without going
//! through any other allocator.
//!
//! ```text
//!   allocate(size)                          release(ptr)
//!        |                                       |
//!        v                                       v
//!   first-fit search --- miss ---> map arena   locate header
//!        |                            |          |
//!       hit                   append to chain  mark free
//!        |                            |          |
//!        +----------> split <---------+        coalesce
//!                       |
//!                 payload pointer
//! ```
//!
//! Every block starts with a [`META_SIZE`] header, immediately followed by the
//! memory handed to the user. Block metadata (size, state, neighbours) lives in
//! an index-linked table owned by the heap.
//!
//! ## Quick Start
//!
//! ```rust
//! use firstfit::Heap;
//!
//! let mut heap = Heap::new();
//!
//! let a = heap.allocate(100).unwrap();
//! unsafe { a.as_ptr().write_bytes(0xAB, 100) };
//! heap.release(a.as_ptr());
//!
//! // The freed space is reused, no new arena is mapped.
//! let b = heap.allocate(50).unwrap();
//! assert_eq!(a, b);
//! assert_eq!(heap.stats().arenas, 1);
//!
//! print!("{}", heap.dump());
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization, `Heap` is neither `Send` nor `Sync`.
//! - **No shrinking**: arenas are unmapped only when the heap is dropped.
//! - **One-hop coalescing**: a release merges with its direct neighbours only.
//! - **No realloc**.

mod arena;
mod block;
mod coalesce;
mod config;
mod error;
mod heap;
mod inspect;
mod kernel;
mod search;
mod split;
mod table;
pub mod utils;

pub use block::META_SIZE;
pub use config::{DEFAULT_ALIGNMENT, DEFAULT_PAGE_SIZE, HeapConfig, MIN_BLOCK_SIZE};
pub use error::{AllocError, ConfigError};
pub use heap::Heap;
pub use inspect::{BlockInfo, DUMP_SENTINEL, HeapDump, HeapStats};
pub use kernel::{ArenaProvider, SystemMemory, system_page_size};
