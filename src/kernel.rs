use std::ptr::NonNull;

use log::warn;

use crate::config::DEFAULT_PAGE_SIZE;

/// This trait provides an abstraction to handle low level memory operations
/// and syscalls. The heap, our top level view of this, has nothing to do with
/// the concrete implementations / APIs offered by each kernel, so it only talks
/// to an `ArenaProvider`.
///
/// Implementors must hand out zero-initialized, read-write, process-private
/// memory that stays valid until it is given back with [`ArenaProvider::return_arena`].
pub trait ArenaProvider {
    /// Request a memory region of size `len`. It returns a pointer to the
    /// region or `None` if the underlying syscall fails. No retry is attempted.
    fn request_arena(&mut self, len: usize) -> Option<NonNull<u8>>;

    /// Returns the memory of size `len` starting from `addr` back to the kernel.
    ///
    /// # Safety
    ///
    /// `addr` and `len` must describe exactly one region previously returned by
    /// [`ArenaProvider::request_arena`] on this provider, and nothing may access
    /// that region afterwards.
    unsafe fn return_arena(&mut self, addr: NonNull<u8>, len: usize);

    /// Returns the virtual memory page size of the computer in bytes.
    fn page_size(&self) -> usize;
}

impl<P: ArenaProvider + ?Sized> ArenaProvider for &mut P {
    #[inline]
    fn request_arena(&mut self, len: usize) -> Option<NonNull<u8>> {
        (**self).request_arena(len)
    }

    #[inline]
    unsafe fn return_arena(&mut self, addr: NonNull<u8>, len: usize) {
        unsafe { (**self).return_arena(addr, len) }
    }

    #[inline]
    fn page_size(&self) -> usize {
        (**self).page_size()
    }
}

/// [`ArenaProvider`] backed by the operating system's page mapping facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemory;

impl SystemMemory {
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

/// Virtual memory page size reported by the OS. This is usually 4096.
#[inline]
pub fn system_page_size() -> usize {
    SystemMemory.page_size()
}

/// Turns a page size reported by the OS into a usable one. Anything that is not
/// a positive power of two (`sysconf` returns -1 on error) falls back to
/// [`DEFAULT_PAGE_SIZE`].
fn page_size_or_default(reported: i64) -> usize {
    match usize::try_from(reported) {
        Ok(size) if size.is_power_of_two() => size,
        _ => {
            warn!("OS reported page size {reported}, using {DEFAULT_PAGE_SIZE}");
            DEFAULT_PAGE_SIZE
        }
    }
}

#[cfg(unix)]
mod unix {
    use super::{page_size_or_default, ArenaProvider, SystemMemory};

    use libc::{mmap, munmap, off_t, size_t};
    use log::warn;

    use std::{os::raw::{c_int, c_void}, ptr::NonNull};

    impl ArenaProvider for SystemMemory {
        fn request_arena(&mut self, len: usize) -> Option<NonNull<u8>> {
            // mmap parameters.
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            // Read-Write only memory.
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            // Anonymous mappings are zero filled by the kernel.
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            if len == 0 {
                return None;
            }

            let addr = unsafe { mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET) };

            match addr {
                libc::MAP_FAILED => None,
                addr => NonNull::new(addr.cast::<u8>()),
            }
        }

        unsafe fn return_arena(&mut self, addr: NonNull<u8>, len: usize) {
            let result = unsafe { munmap(addr.as_ptr().cast::<c_void>(), len as size_t) };

            if result != 0 {
                warn!(
                    "munmap of {len} bytes at {addr:?} failed: {}",
                    std::io::Error::last_os_error()
                );
            }
        }

        fn page_size(&self) -> usize {
            page_size_or_default(unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) } as i64)
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::{mem::MaybeUninit, os::raw::c_void, ptr::NonNull};

    use super::{page_size_or_default, ArenaProvider, SystemMemory};

    use log::warn;
    use windows::Win32::System::{Memory, SystemInformation};

    impl ArenaProvider for SystemMemory {
        fn request_arena(&mut self, len: usize) -> Option<NonNull<u8>> {
            // Read-Write only. Committed pages are zero filled.
            let protection = Memory::PAGE_READWRITE;

            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            if len == 0 {
                return None;
            }

            unsafe {
                let addr = Memory::VirtualAlloc(None, len, flags, protection);

                NonNull::new(addr.cast())
            }
        }

        unsafe fn return_arena(&mut self, addr: NonNull<u8>, len: usize) {
            let result =
                unsafe { Memory::VirtualFree(addr.as_ptr().cast::<c_void>(), 0, Memory::MEM_RELEASE) };

            if let Err(err) = result {
                warn!("VirtualFree of {len} bytes at {addr:?} failed: {err}");
            }
        }

        fn page_size(&self) -> usize {
            unsafe {
                let mut system_info = MaybeUninit::uninit();
                SystemInformation::GetSystemInfo(system_info.as_mut_ptr());

                page_size_or_default(system_info.assume_init().dwPageSize as i64)
            }
        }
    }
}

/// Provider doubles used by the unit tests of the crate.
#[cfg(test)]
pub(crate) mod testing {
    use std::ptr::NonNull;

    use super::{ArenaProvider, SystemMemory};

    /// Forwards to [`SystemMemory`] while keeping track of every request, and
    /// refuses requests once `limit` arenas are live.
    #[derive(Debug, Default)]
    pub(crate) struct CountingMemory {
        pub requests: usize,
        pub returns: usize,
        pub live: usize,
        pub mapped: usize,
        pub limit: Option<usize>,
    }

    impl CountingMemory {
        pub(crate) fn failing() -> Self {
            Self { limit: Some(0), ..Self::default() }
        }

        pub(crate) fn with_limit(limit: usize) -> Self {
            Self { limit: Some(limit), ..Self::default() }
        }
    }

    impl ArenaProvider for CountingMemory {
        fn request_arena(&mut self, len: usize) -> Option<NonNull<u8>> {
            self.requests += 1;

            if self.limit.is_some_and(|limit| self.live >= limit) {
                return None;
            }

            let addr = SystemMemory.request_arena(len)?;
            self.live += 1;
            self.mapped += len;

            Some(addr)
        }

        unsafe fn return_arena(&mut self, addr: NonNull<u8>, len: usize) {
            self.returns += 1;
            self.live -= 1;
            self.mapped -= len;

            unsafe { SystemMemory.return_arena(addr, len) }
        }

        fn page_size(&self) -> usize {
            SystemMemory.page_size()
        }
    }
}
