use std::ffi::c_void;
use std::fmt;

use crate::handle::IoHandle;

/// Transfer direction, in the engine's encoding.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoDir {
    Read = 0,
    Write = 1,
}

impl IoDir {
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for IoDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// I/O request allocated against a composite volume.
///
/// The request belongs to the caller once returned. Submission, completion
/// and release go through the engine's I/O interface; dropping an `Io` does
/// not free the native object.
#[derive(Debug)]
pub struct Io {
    handle: IoHandle,
    addr: u64,
    len: u32,
    dir: IoDir,
    io_class: u32,
    flags: u64,
}

impl Io {
    pub(crate) fn new(
        handle: IoHandle,
        addr: u64,
        len: u32,
        dir: IoDir,
        io_class: u32,
        flags: u64,
    ) -> Self {
        Self {
            handle,
            addr,
            len,
            dir,
            io_class,
            flags,
        }
    }

    pub fn handle(&self) -> IoHandle {
        self.handle
    }

    pub fn addr(&self) -> u64 {
        self.addr
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dir(&self) -> IoDir {
        self.dir
    }

    pub fn io_class(&self) -> u32 {
        self.io_class
    }

    pub fn flags(&self) -> u64 {
        self.flags
    }

    /// Hand the native pointer over to the caller's I/O layer.
    pub fn into_raw(self) -> *mut c_void {
        self.handle.as_ptr()
    }
}
