//! C surface of the engine's composite volume API.

use std::ffi::{c_int, c_void};

use cvol_core::Uuid;

/// `struct ocf_volume_uuid`
#[repr(C)]
#[derive(Debug)]
pub struct OcfVolumeUuid {
    pub size: usize,
    pub data: *mut c_void,
}

impl OcfVolumeUuid {
    /// Borrow `uuid` as a native descriptor. The descriptor must not outlive
    /// `uuid`.
    pub fn borrow(uuid: &Uuid) -> Self {
        Self {
            size: uuid.size(),
            data: uuid.as_c_str().as_ptr() as *mut c_void,
        }
    }
}

pub(crate) type CompositeVolumeCreateFn =
    unsafe extern "C" fn(cvolume: *mut *mut c_void, ctx: *mut c_void) -> c_int;

pub(crate) type CompositeVolumeDestroyFn = unsafe extern "C" fn(cvolume: *mut c_void);

pub(crate) type CompositeVolumeAddFn = unsafe extern "C" fn(
    cvolume: *mut c_void,
    volume_type: *mut c_void,
    uuid: *mut OcfVolumeUuid,
    volume_params: *mut c_void,
) -> c_int;

pub(crate) type VolumeNewIoFn = unsafe extern "C" fn(
    volume: *mut c_void,
    queue: *mut c_void,
    addr: u64,
    bytes: u32,
    dir: u32,
    io_class: u32,
    flags: u64,
) -> *mut c_void;

pub(crate) type VolumeOpenFn =
    unsafe extern "C" fn(volume: *mut c_void, volume_params: *mut c_void) -> c_int;

pub(crate) type VolumeCloseFn = unsafe extern "C" fn(volume: *mut c_void);

pub(crate) const SYM_COMPOSITE_VOLUME_CREATE: &str = "ocf_composite_volume_create";
pub(crate) const SYM_COMPOSITE_VOLUME_DESTROY: &str = "ocf_composite_volume_destroy";
pub(crate) const SYM_COMPOSITE_VOLUME_ADD: &str = "ocf_composite_volume_add";
pub(crate) const SYM_VOLUME_NEW_IO: &str = "ocf_volume_new_io";
pub(crate) const SYM_VOLUME_OPEN: &str = "ocf_volume_open";
pub(crate) const SYM_VOLUME_CLOSE: &str = "ocf_volume_close";

// Layout must match `struct ocf_volume_uuid { size_t size; void *data; }`.
const _: [(); 2 * core::mem::size_of::<usize>()] = [(); core::mem::size_of::<OcfVolumeUuid>()];
const _: [(); core::mem::align_of::<usize>()] = [(); core::mem::align_of::<OcfVolumeUuid>()];
