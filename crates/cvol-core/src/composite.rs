//! Composite volume lifecycle and I/O dispatch.
//!
//! Lifecycle order on one volume is create, add*, open, new_io*, close,
//! destroy. Create happens in [`CompositeVolume::create`] and destroy in
//! `Drop`, so a handle that failed to create is never destroyed and a
//! created one is destroyed exactly once on every exit path.

use tracing::{debug, warn};

use crate::context::Context;
use crate::engine::CompositeVolumeEngine;
use crate::error::{CvolError, CvolResult};
use crate::handle::{CvolumeHandle, QueueHandle};
use crate::io::{Io, IoDir};
use crate::uuid::Uuid;
use crate::volume_type::Member;

/// Whether the aggregate is ready for I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeState {
    Unopened,
    Opened,
}

/// Engine-side aggregate volume, exclusively owned.
pub struct CompositeVolume<'ctx, E: CompositeVolumeEngine> {
    ctx: &'ctx Context<E>,
    handle: CvolumeHandle,
    state: VolumeState,
}

impl<'ctx, E: CompositeVolumeEngine> CompositeVolume<'ctx, E> {
    /// Allocate an aggregate volume bound to `ctx`.
    pub fn create(ctx: &'ctx Context<E>) -> CvolResult<Self> {
        let mut out = None;
        let status = ctx
            .engine()
            .composite_volume_create(&mut out, ctx.handle());

        if status != 0 {
            warn!(status, "composite volume creation failed");
            return Err(CvolError::Creation { status });
        }

        let Some(handle) = out else {
            warn!("engine reported success but returned no composite volume");
            return Err(CvolError::Creation { status });
        };

        debug!(cvol = handle.addr(), "composite volume created");
        Ok(Self {
            ctx,
            handle,
            state: VolumeState::Unopened,
        })
    }

    pub fn handle(&self) -> CvolumeHandle {
        self.handle
    }

    pub fn context(&self) -> &'ctx Context<E> {
        self.ctx
    }

    pub fn state(&self) -> VolumeState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == VolumeState::Opened
    }

    /// Register `member` into the aggregate.
    ///
    /// Members added before a failure stay registered. Duplicate identifiers
    /// are passed through; the engine decides what they mean.
    pub fn add<M: Member + ?Sized>(&mut self, member: &M) -> CvolResult<()> {
        let kind = member.kind();
        let volume_type = self.ctx.volume_types().resolve(kind)?;
        let uuid = Uuid::new(member.uuid())?;

        let status = self
            .ctx
            .engine()
            .composite_volume_add(self.handle, volume_type, &uuid);

        if status != 0 {
            warn!(
                cvol = self.handle.addr(),
                uuid = uuid.identifier(),
                %kind,
                status,
                "failed to add volume to a composite volume"
            );
            return Err(CvolError::Membership {
                uuid: member.uuid().to_string(),
                status,
            });
        }

        debug!(
            cvol = self.handle.addr(),
            uuid = uuid.identifier(),
            %kind,
            "volume added to composite volume"
        );
        Ok(())
    }

    /// Prepare the aggregate and its members for I/O.
    pub fn open(&mut self) -> CvolResult<()> {
        if self.state == VolumeState::Opened {
            return Err(CvolError::InvalidState {
                op: "open",
                state: self.state,
            });
        }

        let status = self.ctx.engine().volume_open(self.handle);
        if status != 0 {
            warn!(cvol = self.handle.addr(), status, "composite volume open failed");
            return Err(CvolError::Open { status });
        }

        self.state = VolumeState::Opened;
        debug!(cvol = self.handle.addr(), "composite volume opened");
        Ok(())
    }

    pub fn close(&mut self) -> CvolResult<()> {
        if self.state != VolumeState::Opened {
            return Err(CvolError::InvalidState {
                op: "close",
                state: self.state,
            });
        }

        self.ctx.engine().volume_close(self.handle);
        self.state = VolumeState::Unopened;
        debug!(cvol = self.handle.addr(), "composite volume closed");
        Ok(())
    }

    /// Allocate an I/O request against the aggregate.
    ///
    /// Bounds of `addr` and `len` are checked by the engine. `queue` of
    /// `None` selects the engine's default dispatch path.
    pub fn new_io(
        &self,
        queue: Option<QueueHandle>,
        addr: u64,
        len: u32,
        dir: IoDir,
        io_class: u32,
        flags: u64,
    ) -> CvolResult<Io> {
        if self.state != VolumeState::Opened {
            return Err(CvolError::InvalidState {
                op: "allocate io on",
                state: self.state,
            });
        }

        let handle = self
            .ctx
            .engine()
            .volume_new_io(self.handle, queue, addr, len, dir, io_class, flags);

        let Some(handle) = handle else {
            warn!(
                cvol = self.handle.addr(),
                addr,
                len,
                %dir,
                io_class,
                "engine returned no io"
            );
            return Err(CvolError::IoCreation { addr, len, dir });
        };

        debug!(cvol = self.handle.addr(), addr, len, %dir, io_class, flags, "io allocated");
        Ok(Io::new(handle, addr, len, dir, io_class, flags))
    }

    /// Close if still opened, then release the aggregate.
    pub fn destroy(self) {
        drop(self);
    }
}

impl<E: CompositeVolumeEngine> Drop for CompositeVolume<'_, E> {
    fn drop(&mut self) {
        if self.state == VolumeState::Opened {
            self.ctx.engine().volume_close(self.handle);
            self.state = VolumeState::Unopened;
            debug!(cvol = self.handle.addr(), "composite volume closed on release");
        }

        self.ctx.engine().composite_volume_destroy(self.handle);
        debug!(cvol = self.handle.addr(), "composite volume destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockCompositeVolumeEngine;
    use crate::handle::{ContextHandle, IoHandle, VolumeTypeHandle};
    use crate::volume_type::{SubVolume, VolumeKind, VolumeTypeRegistry};
    use mockall::Sequence;
    use std::ffi::c_void;

    fn cvol_handle() -> CvolumeHandle {
        CvolumeHandle::from_raw(0x1000 as *mut c_void).unwrap()
    }

    fn ctx_handle() -> ContextHandle {
        ContextHandle::from_raw(0x2000 as *mut c_void).unwrap()
    }

    fn ram_type() -> VolumeTypeHandle {
        VolumeTypeHandle::from_raw(0x3000 as *mut c_void).unwrap()
    }

    fn file_type() -> VolumeTypeHandle {
        VolumeTypeHandle::from_raw(0x3100 as *mut c_void).unwrap()
    }

    fn io_handle() -> IoHandle {
        IoHandle::from_raw(0x4000 as *mut c_void).unwrap()
    }

    fn queue_handle() -> QueueHandle {
        QueueHandle::from_raw(0x5000 as *mut c_void).unwrap()
    }

    fn context(engine: MockCompositeVolumeEngine) -> Context<MockCompositeVolumeEngine> {
        let types = VolumeTypeRegistry::new()
            .with(VolumeKind::Ram, ram_type())
            .with(VolumeKind::File, file_type());
        Context::new(engine, ctx_handle(), types)
    }

    fn expect_create(engine: &mut MockCompositeVolumeEngine) {
        engine
            .expect_composite_volume_create()
            .times(1)
            .returning(|out, ctx| {
                assert_eq!(ctx, ctx_handle());
                *out = Some(cvol_handle());
                0
            });
    }

    fn expect_destroy(engine: &mut MockCompositeVolumeEngine) {
        engine
            .expect_composite_volume_destroy()
            .withf(|cvol| *cvol == cvol_handle())
            .times(1)
            .return_const(());
    }

    fn expect_open(engine: &mut MockCompositeVolumeEngine) {
        engine
            .expect_volume_open()
            .withf(|cvol| *cvol == cvol_handle())
            .times(1)
            .return_const(0);
    }

    #[test]
    fn test_create_then_drop_destroys_once() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        expect_destroy(&mut engine);
        engine.expect_volume_close().times(0);

        let ctx = context(engine);
        let cvol = CompositeVolume::create(&ctx).unwrap();
        assert_eq!(cvol.handle(), cvol_handle());
        assert_eq!(cvol.state(), VolumeState::Unopened);
    }

    #[test]
    fn test_create_failure_never_destroys() {
        let mut engine = MockCompositeVolumeEngine::new();
        engine
            .expect_composite_volume_create()
            .times(1)
            .returning(|_, _| -22);
        engine.expect_composite_volume_destroy().times(0);

        let ctx = context(engine);
        let err = CompositeVolume::create(&ctx).err().unwrap();
        assert!(matches!(err, CvolError::Creation { status: -22 }));
        assert_eq!(err.status(), Some(-22));
    }

    #[test]
    fn test_create_success_without_handle_is_error() {
        let mut engine = MockCompositeVolumeEngine::new();
        engine
            .expect_composite_volume_create()
            .times(1)
            .returning(|_, _| 0);
        engine.expect_composite_volume_destroy().times(0);

        let ctx = context(engine);
        let err = CompositeVolume::create(&ctx).err().unwrap();
        assert!(matches!(err, CvolError::Creation { status: 0 }));
    }

    #[test]
    fn test_add_passes_nul_terminated_descriptor() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        engine
            .expect_composite_volume_add()
            .times(1)
            .returning(|cvol, volume_type, uuid| {
                assert_eq!(cvol, cvol_handle());
                assert_eq!(volume_type, ram_type());
                assert_eq!(uuid.size(), 5);
                assert_eq!(uuid.as_bytes_with_nul(), b"dev0\0");
                0
            });
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.add(&SubVolume::new(VolumeKind::Ram, "dev0")).unwrap();
    }

    #[test]
    fn test_add_empty_identifier() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        engine
            .expect_composite_volume_add()
            .times(1)
            .returning(|_, volume_type, uuid| {
                assert_eq!(volume_type, file_type());
                assert_eq!(uuid.size(), 1);
                assert_eq!(uuid.as_bytes_with_nul(), b"\0");
                0
            });
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.add(&SubVolume::new(VolumeKind::File, "")).unwrap();
    }

    #[test]
    fn test_add_unknown_kind_skips_native_call() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        engine.expect_composite_volume_add().times(0);
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        let err = cvol
            .add(&SubVolume::new(VolumeKind::Trace, "trace0"))
            .unwrap_err();
        assert!(matches!(
            err,
            CvolError::UnknownVolumeType {
                kind: VolumeKind::Trace
            }
        ));
    }

    #[test]
    fn test_add_invalid_identifier_skips_native_call() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        engine.expect_composite_volume_add().times(0);
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        let err = cvol
            .add(&SubVolume::new(VolumeKind::Ram, "dev\u{e9}"))
            .unwrap_err();
        assert!(matches!(err, CvolError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_add_failure_keeps_earlier_members() {
        let mut engine = MockCompositeVolumeEngine::new();
        let mut seq = Sequence::new();
        expect_create(&mut engine);
        engine
            .expect_composite_volume_add()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| 0);
        engine
            .expect_composite_volume_add()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, uuid| {
                assert_eq!(uuid.identifier(), "dev1");
                -1000013
            });
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.add(&SubVolume::new(VolumeKind::Ram, "dev0")).unwrap();
        let err = cvol
            .add(&SubVolume::new(VolumeKind::Ram, "dev1"))
            .unwrap_err();

        match err {
            CvolError::Membership { uuid, status } => {
                assert_eq!(uuid, "dev1");
                assert_eq!(status, -1000013);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_identifier_is_delegated() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        engine
            .expect_composite_volume_add()
            .times(2)
            .returning(|_, _, uuid| {
                assert_eq!(uuid.identifier(), "dev0");
                0
            });
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        let member = SubVolume::new(VolumeKind::Ram, "dev0");
        cvol.add(&member).unwrap();
        cvol.add(&member).unwrap();
    }

    #[test]
    fn test_open_failure_maps_status() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        engine.expect_volume_open().times(1).return_const(-5);
        engine.expect_volume_close().times(0);
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        let err = cvol.open().unwrap_err();
        assert!(matches!(err, CvolError::Open { status: -5 }));
        assert!(!cvol.is_open());
    }

    #[test]
    fn test_open_twice_is_rejected() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        expect_open(&mut engine);
        engine.expect_volume_close().times(1).return_const(());
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.open().unwrap();
        let err = cvol.open().unwrap_err();
        assert!(matches!(
            err,
            CvolError::InvalidState {
                op: "open",
                state: VolumeState::Opened
            }
        ));
    }

    #[test]
    fn test_close_without_open_is_rejected() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        engine.expect_volume_close().times(0);
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        let err = cvol.close().unwrap_err();
        assert!(matches!(err, CvolError::InvalidState { op: "close", .. }));
    }

    #[test]
    fn test_new_io_requires_open() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        engine.expect_volume_new_io().times(0);
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let cvol = CompositeVolume::create(&ctx).unwrap();
        let err = cvol.new_io(None, 0, 4096, IoDir::Read, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            CvolError::InvalidState {
                state: VolumeState::Unopened,
                ..
            }
        ));
    }

    #[test]
    fn test_new_io_forwards_parameters() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        expect_open(&mut engine);
        engine
            .expect_volume_new_io()
            .withf(|cvol, queue, addr, len, dir, io_class, flags| {
                *cvol == cvol_handle()
                    && *queue == Some(queue_handle())
                    && *addr == 8192
                    && *len == 512
                    && *dir == IoDir::Write
                    && *io_class == 3
                    && *flags == 0x10
            })
            .times(1)
            .returning(|_, _, _, _, _, _, _| Some(io_handle()));
        engine.expect_volume_close().times(1).return_const(());
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.open().unwrap();
        let io = cvol
            .new_io(Some(queue_handle()), 8192, 512, IoDir::Write, 3, 0x10)
            .unwrap();
        assert_eq!(io.handle(), io_handle());
        assert_eq!(io.addr(), 8192);
        assert_eq!(io.len(), 512);
        assert_eq!(io.dir(), IoDir::Write);
        assert_eq!(io.io_class(), 3);
        assert_eq!(io.flags(), 0x10);
        cvol.close().unwrap();
    }

    #[test]
    fn test_new_io_without_queue_passes_none() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        expect_open(&mut engine);
        engine
            .expect_volume_new_io()
            .withf(|_, queue, _, _, _, _, _| queue.is_none())
            .times(1)
            .returning(|_, _, _, _, _, _, _| Some(io_handle()));
        engine.expect_volume_close().times(1).return_const(());
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.open().unwrap();
        cvol.new_io(None, 0, 4096, IoDir::Read, 0, 0).unwrap();
    }

    #[test]
    fn test_new_io_null_handle_is_error() {
        let mut engine = MockCompositeVolumeEngine::new();
        expect_create(&mut engine);
        expect_open(&mut engine);
        engine
            .expect_volume_new_io()
            .times(1)
            .returning(|_, _, _, _, _, _, _| None);
        engine.expect_volume_close().times(1).return_const(());
        expect_destroy(&mut engine);

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.open().unwrap();
        let err = cvol.new_io(None, 0, 0, IoDir::Read, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            CvolError::IoCreation {
                addr: 0,
                len: 0,
                dir: IoDir::Read
            }
        ));
    }

    #[test]
    fn test_drop_closes_open_volume_before_destroy() {
        let mut engine = MockCompositeVolumeEngine::new();
        let mut seq = Sequence::new();
        expect_create(&mut engine);
        engine
            .expect_volume_open()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(0);
        engine
            .expect_volume_close()
            .withf(|cvol| *cvol == cvol_handle())
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_composite_volume_destroy()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.open().unwrap();
        cvol.destroy();
    }

    #[test]
    fn test_round_trip_call_order() {
        let mut engine = MockCompositeVolumeEngine::new();
        let mut seq = Sequence::new();
        engine
            .expect_composite_volume_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|out, _| {
                *out = Some(cvol_handle());
                0
            });
        engine
            .expect_composite_volume_add()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, volume_type, uuid| {
                assert_eq!(volume_type, ram_type());
                assert_eq!(uuid.identifier(), "A");
                0
            });
        engine
            .expect_composite_volume_add()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, volume_type, uuid| {
                assert_eq!(volume_type, file_type());
                assert_eq!(uuid.identifier(), "B");
                0
            });
        engine
            .expect_volume_open()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(0);
        engine
            .expect_volume_new_io()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _, _, _, _| Some(io_handle()));
        engine
            .expect_volume_close()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_composite_volume_destroy()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let ctx = context(engine);
        let mut cvol = CompositeVolume::create(&ctx).unwrap();
        cvol.add(&SubVolume::new(VolumeKind::Ram, "A")).unwrap();
        cvol.add(&SubVolume::new(VolumeKind::File, "B")).unwrap();
        cvol.open().unwrap();
        let io = cvol.new_io(None, 0, 4096, IoDir::Read, 0, 0).unwrap();
        assert_eq!(io.into_raw(), io_handle().as_ptr());
        cvol.close().unwrap();
        cvol.destroy();
    }
}
