//! Opaque engine handles.
//!
//! Each handle wraps a non-null pointer owned by the engine. The wrappers only
//! carry the pointer across the binding boundary; none of them dereference it.
//! Handles are `!Send` and `!Sync`; they belong to the thread that received
//! them from the engine.

use std::ffi::c_void;
use std::ptr::NonNull;

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonNull<c_void>);

        impl $name {
            /// Wrap a raw engine pointer. Null yields `None`.
            pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
                NonNull::new(ptr).map(Self)
            }

            pub fn as_ptr(self) -> *mut c_void {
                self.0.as_ptr()
            }

            /// Pointer value, for logging and bookkeeping.
            pub fn addr(self) -> usize {
                self.0.as_ptr() as usize
            }
        }
    };
}

opaque_handle!(
    /// Caching engine runtime context.
    ContextHandle
);
opaque_handle!(
    /// Engine-side aggregate volume.
    CvolumeHandle
);
opaque_handle!(
    /// Engine volume type, as registered with the context.
    VolumeTypeHandle
);
opaque_handle!(
    /// I/O submission queue.
    QueueHandle
);
opaque_handle!(
    /// In-flight I/O request.
    IoHandle
);
