//! Native composite-volume engine calls.
//!
//! [`CompositeVolumeEngine`] mirrors the engine's C surface one method per
//! symbol, keeping raw status codes. Translating those codes into
//! [`CvolError`](crate::CvolError) is the job of
//! [`CompositeVolume`](crate::CompositeVolume), not of implementors.
//!
//! The binding is single-threaded: engine handles are raw pointers and are
//! neither `Send` nor `Sync`, so a [`Context`](crate::Context) and every
//! volume built from it stay on the thread that created them. Engines can be
//! borrowed or boxed into a context.

use crate::handle::{ContextHandle, CvolumeHandle, IoHandle, QueueHandle, VolumeTypeHandle};
use crate::io::IoDir;
use crate::uuid::Uuid;

/// Native status code. Zero is success.
pub type Status = i32;

#[cfg_attr(test, mockall::automock)]
pub trait CompositeVolumeEngine {
    /// `ocf_composite_volume_create`: stores the new aggregate in `out`.
    fn composite_volume_create(&self, out: &mut Option<CvolumeHandle>, ctx: ContextHandle)
        -> Status;

    /// `ocf_composite_volume_destroy`
    fn composite_volume_destroy(&self, cvol: CvolumeHandle);

    /// `ocf_composite_volume_add`. The descriptor is only valid for the
    /// duration of the call.
    fn composite_volume_add(
        &self,
        cvol: CvolumeHandle,
        volume_type: VolumeTypeHandle,
        uuid: &Uuid,
    ) -> Status;

    /// `ocf_volume_open`
    fn volume_open(&self, cvol: CvolumeHandle) -> Status;

    /// `ocf_volume_close`
    fn volume_close(&self, cvol: CvolumeHandle);

    /// `ocf_volume_new_io`. A `None` queue is passed to the engine as null.
    #[allow(clippy::too_many_arguments)]
    fn volume_new_io(
        &self,
        cvol: CvolumeHandle,
        queue: Option<QueueHandle>,
        addr: u64,
        len: u32,
        dir: IoDir,
        io_class: u32,
        flags: u64,
    ) -> Option<IoHandle>;
}

macro_rules! forward_engine {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<E: CompositeVolumeEngine + ?Sized> CompositeVolumeEngine for $ty {
                fn composite_volume_create(
                    &self,
                    out: &mut Option<CvolumeHandle>,
                    ctx: ContextHandle,
                ) -> Status {
                    (**self).composite_volume_create(out, ctx)
                }

                fn composite_volume_destroy(&self, cvol: CvolumeHandle) {
                    (**self).composite_volume_destroy(cvol)
                }

                fn composite_volume_add(
                    &self,
                    cvol: CvolumeHandle,
                    volume_type: VolumeTypeHandle,
                    uuid: &Uuid,
                ) -> Status {
                    (**self).composite_volume_add(cvol, volume_type, uuid)
                }

                fn volume_open(&self, cvol: CvolumeHandle) -> Status {
                    (**self).volume_open(cvol)
                }

                fn volume_close(&self, cvol: CvolumeHandle) {
                    (**self).volume_close(cvol)
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
                    (**self).volume_new_io(cvol, queue, addr, len, dir, io_class, flags)
                }
            }
        )*
    };
}

forward_engine!(&E, Box<E>);
