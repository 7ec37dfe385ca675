use std::ffi::c_void;
use std::path::{Path, PathBuf};

use cvol_core::{
    CompositeVolumeEngine, Context, ContextHandle, CvolumeHandle, IoDir, IoHandle, QueueHandle,
    Status, Uuid, VolumeTypeHandle, VolumeTypeRegistry,
};
use libloading::Library;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::config::NativeConfig;
use crate::error::{NativeError, NativeResult};
use crate::ffi::{self, OcfVolumeUuid};

static INSTANCE: OnceCell<OcfLib> = OnceCell::new();

struct Symbols {
    composite_volume_create: ffi::CompositeVolumeCreateFn,
    composite_volume_destroy: ffi::CompositeVolumeDestroyFn,
    composite_volume_add: ffi::CompositeVolumeAddFn,
    volume_new_io: ffi::VolumeNewIoFn,
    volume_open: ffi::VolumeOpenFn,
    volume_close: ffi::VolumeCloseFn,
}

/// Loaded engine library with its composite volume symbols resolved.
pub struct OcfLib {
    path: PathBuf,
    symbols: Symbols,
    // Keeps the function pointers in `symbols` valid.
    _library: Library,
}

impl std::fmt::Debug for OcfLib {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcfLib").field("path", &self.path).finish()
    }
}

fn resolve<T: Copy>(library: &Library, name: &'static str) -> NativeResult<T> {
    // SAFETY: every `T` used with this helper is the `extern "C"` signature
    // the engine headers declare for `name`.
    let symbol = unsafe { library.get::<T>(name.as_bytes()) }
        .map_err(|source| NativeError::Symbol { name, source })?;
    debug!(symbol = name, "resolved engine symbol");
    Ok(*symbol)
}

impl OcfLib {
    /// Open the library named by `config` and resolve the composite volume
    /// symbols.
    pub fn load(config: &NativeConfig) -> NativeResult<Self> {
        config.validate()?;
        Self::load_path(&config.library_path)
    }

    pub fn load_path(path: impl AsRef<Path>) -> NativeResult<Self> {
        let path = path.as_ref().to_path_buf();

        // SAFETY: loading runs the library's initializers; the engine library
        // has no initialization-order requirements on the host.
        let library = unsafe { Library::new(&path) }.map_err(|source| NativeError::Load {
            path: path.clone(),
            source,
        })?;

        let symbols = Symbols {
            composite_volume_create: resolve(&library, ffi::SYM_COMPOSITE_VOLUME_CREATE)?,
            composite_volume_destroy: resolve(&library, ffi::SYM_COMPOSITE_VOLUME_DESTROY)?,
            composite_volume_add: resolve(&library, ffi::SYM_COMPOSITE_VOLUME_ADD)?,
            volume_new_io: resolve(&library, ffi::SYM_VOLUME_NEW_IO)?,
            volume_open: resolve(&library, ffi::SYM_VOLUME_OPEN)?,
            volume_close: resolve(&library, ffi::SYM_VOLUME_CLOSE)?,
        };

        info!(path = %path.display(), "engine library loaded");
        Ok(Self {
            path,
            symbols,
            _library: library,
        })
    }

    /// Process-wide instance, loaded on first use from
    /// [`NativeConfig::from_env`].
    pub fn global() -> NativeResult<&'static OcfLib> {
        INSTANCE.get_or_try_init(|| Self::load(&NativeConfig::from_env()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bind an engine context created elsewhere to this library.
    pub fn context(
        &self,
        handle: ContextHandle,
        volume_types: VolumeTypeRegistry,
    ) -> Context<&Self> {
        Context::new(self, handle, volume_types)
    }
}

impl CompositeVolumeEngine for OcfLib {
    fn composite_volume_create(
        &self,
        out: &mut Option<CvolumeHandle>,
        ctx: ContextHandle,
    ) -> Status {
        let mut raw: *mut c_void = std::ptr::null_mut();
        // SAFETY: `raw` is a valid output slot and `ctx` is a live engine
        // context owned by the caller.
        let status = unsafe { (self.symbols.composite_volume_create)(&mut raw, ctx.as_ptr()) };
        *out = if status == 0 {
            CvolumeHandle::from_raw(raw)
        } else {
            None
        };
        status
    }

    fn composite_volume_destroy(&self, cvol: CvolumeHandle) {
        // SAFETY: `cvol` came from a successful create and is destroyed once.
        unsafe { (self.symbols.composite_volume_destroy)(cvol.as_ptr()) }
    }

    fn composite_volume_add(
        &self,
        cvol: CvolumeHandle,
        volume_type: VolumeTypeHandle,
        uuid: &Uuid,
    ) -> Status {
        let mut desc = OcfVolumeUuid::borrow(uuid);
        // SAFETY: `desc` borrows `uuid`, which outlives the call; the engine
        // copies the identifier before returning.
        unsafe {
            (self.symbols.composite_volume_add)(
                cvol.as_ptr(),
                volume_type.as_ptr(),
                &mut desc,
                std::ptr::null_mut(),
            )
        }
    }

    fn volume_open(&self, cvol: CvolumeHandle) -> Status {
        // SAFETY: `cvol` is a live composite volume; composite volumes take
        // no open parameters.
        unsafe { (self.symbols.volume_open)(cvol.as_ptr(), std::ptr::null_mut()) }
    }

    fn volume_close(&self, cvol: CvolumeHandle) {
        // SAFETY: `cvol` is a live, opened composite volume.
        unsafe { (self.symbols.volume_close)(cvol.as_ptr()) }
    }

    fn volume_new_io(
        &self,
        cvol: CvolumeHandle,
        queue: Option<QueueHandle>,
        addr: u64,
        len: u32,
        dir: IoDir,
        io_class: u32,
        flags: u64,
    ) -> Option<IoHandle> {
        let queue = queue.map_or(std::ptr::null_mut(), QueueHandle::as_ptr);
        // SAFETY: `cvol` is a live composite volume and `queue` is either null
        // or a live queue.
        let io = unsafe {
            (self.symbols.volume_new_io)(
                cvol.as_ptr(),
                queue,
                addr,
                len,
                dir.as_raw(),
                io_class,
                flags,
            )
        };
        IoHandle::from_raw(io)
    }
}
