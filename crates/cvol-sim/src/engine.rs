use std::collections::{HashMap, HashSet};
use std::ffi::c_void;

use cvol_core::{
    CompositeVolumeEngine, Context, ContextHandle, CvolumeHandle, IoDir, IoHandle, QueueHandle,
    Status, Uuid, VolumeKind, VolumeTypeHandle, VolumeTypeRegistry,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::call::{SimCall, SimFault, SimMember};
use crate::config::SimConfig;
use crate::status;

// Minted handle addresses start here and never wrap back to null.
const FIRST_ADDR: usize = 0x1000;
const ADDR_STEP: usize = 0x40;

/// Simulated caching engine.
#[derive(Debug, Default)]
pub struct SimEngine {
    config: SimConfig,
    state: Mutex<SimState>,
}

#[derive(Debug, Default)]
struct SimState {
    next_addr: usize,
    contexts: HashSet<usize>,
    volume_types: HashMap<usize, String>,
    volumes: HashMap<usize, SimVolume>,
    ios: usize,
    calls: Vec<SimCall>,
    faults: Vec<SimFault>,
}

#[derive(Debug, Default)]
struct SimVolume {
    members: Vec<SimMember>,
    opened: bool,
}

impl SimState {
    fn mint(&mut self) -> *mut c_void {
        if self.next_addr < FIRST_ADDR {
            self.next_addr = FIRST_ADDR;
        }
        let addr = self.next_addr;
        self.next_addr += ADDR_STEP;
        addr as *mut c_void
    }
}

fn minted<H>(handle: Option<H>) -> H {
    match handle {
        Some(handle) => handle,
        None => unreachable!("minted addresses are never null"),
    }
}

/// Parse a descriptor the way the engine does: `size` bytes ending in NUL,
/// with no NUL before that.
fn parse_uuid(bytes: &[u8], size: usize) -> Option<String> {
    if size == 0 || bytes.len() != size {
        return None;
    }
    let (text, terminator) = bytes.split_at(size - 1);
    if terminator != [0] || text.contains(&0) {
        return None;
    }
    std::str::from_utf8(text).ok().map(str::to_string)
}

impl SimEngine {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SimState::default()),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Mint a live engine context.
    pub fn new_context(&self) -> ContextHandle {
        let mut state = self.state.lock();
        let handle = minted(ContextHandle::from_raw(state.mint()));
        state.contexts.insert(handle.addr());
        handle
    }

    /// Invalidate a context; creating volumes against it fails afterwards.
    pub fn retire_context(&self, ctx: ContextHandle) -> bool {
        self.state.lock().contexts.remove(&ctx.addr())
    }

    pub fn register_volume_type(&self, name: &str) -> VolumeTypeHandle {
        let mut state = self.state.lock();
        let handle = minted(VolumeTypeHandle::from_raw(state.mint()));
        state.volume_types.insert(handle.addr(), name.to_string());
        handle
    }

    /// Registry with a simulated volume type for every [`VolumeKind`].
    pub fn volume_type_registry(&self) -> VolumeTypeRegistry {
        VolumeKind::ALL
            .into_iter()
            .fold(VolumeTypeRegistry::new(), |registry, kind| {
                registry.with(kind, self.register_volume_type(kind.name()))
            })
    }

    /// Fresh context with every volume kind registered.
    pub fn context(&self) -> Context<&Self> {
        Context::new(self, self.new_context(), self.volume_type_registry())
    }

    pub fn calls(&self) -> Vec<SimCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.state.lock().calls.iter().map(SimCall::name).collect()
    }

    pub fn faults(&self) -> Vec<SimFault> {
        self.state.lock().faults.clone()
    }

    /// Composite volumes created and not yet destroyed.
    pub fn live_volumes(&self) -> usize {
        self.state.lock().volumes.len()
    }

    pub fn members(&self, cvol: CvolumeHandle) -> Option<Vec<SimMember>> {
        self.state
            .lock()
            .volumes
            .get(&cvol.addr())
            .map(|volume| volume.members.clone())
    }

    pub fn is_open(&self, cvol: CvolumeHandle) -> bool {
        self.state
            .lock()
            .volumes
            .get(&cvol.addr())
            .is_some_and(|volume| volume.opened)
    }

    /// Addressable size of the aggregate: the sum of its members. `None` for
    /// an unknown volume or when the sum does not fit in `u64`.
    pub fn capacity(&self, cvol: CvolumeHandle) -> Option<u64> {
        self.state
            .lock()
            .volumes
            .get(&cvol.addr())
            .and_then(|volume| self.volume_capacity(volume))
    }

    fn volume_capacity(&self, volume: &SimVolume) -> Option<u64> {
        (volume.members.len() as u64).checked_mul(self.config.member_size)
    }

    /// I/O requests allocated so far.
    pub fn io_count(&self) -> usize {
        self.state.lock().ios
    }

    fn add_status(
        &self,
        state: &SimState,
        cvol: usize,
        volume_type: usize,
        uuid: &Uuid,
    ) -> Status {
        let Some(volume) = state.volumes.get(&cvol) else {
            return status::EINVAL;
        };
        if !state.volume_types.contains_key(&volume_type) {
            return status::EINVAL;
        }
        let Some(text) = parse_uuid(uuid.as_bytes_with_nul(), uuid.size()) else {
            return status::EINVAL;
        };
        if volume.opened {
            return status::EBUSY;
        }
        if volume.members.len() >= self.config.max_members {
            return status::ENOSPC;
        }
        if volume.members.iter().any(|member| member.uuid == text) {
            return status::EEXIST;
        }
        status::OK
    }
}

impl CompositeVolumeEngine for SimEngine {
    fn composite_volume_create(
        &self,
        out: &mut Option<CvolumeHandle>,
        ctx: ContextHandle,
    ) -> Status {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let status = if state.contexts.contains(&ctx.addr()) {
            let handle = minted(CvolumeHandle::from_raw(state.mint()));
            state.volumes.insert(handle.addr(), SimVolume::default());
            *out = Some(handle);
            status::OK
        } else {
            warn!(ctx = ctx.addr(), "create against unknown context");
            status::EINVAL
        };

        state.calls.push(SimCall::Create {
            ctx: ctx.addr(),
            status,
        });
        status
    }

    fn composite_volume_destroy(&self, cvol: CvolumeHandle) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let cvol = cvol.addr();

        match state.volumes.remove(&cvol) {
            None => state.faults.push(SimFault::DestroyUnknown { cvol }),
            Some(volume) if volume.opened => state.faults.push(SimFault::DestroyOpened { cvol }),
            Some(_) => debug!(cvol, "simulated volume destroyed"),
        }
        state.calls.push(SimCall::Destroy { cvol });
    }

    fn composite_volume_add(
        &self,
        cvol: CvolumeHandle,
        volume_type: VolumeTypeHandle,
        uuid: &Uuid,
    ) -> Status {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let (cvol, volume_type) = (cvol.addr(), volume_type.addr());

        let status = self.add_status(state, cvol, volume_type, uuid);
        if status == status::OK {
            let type_name = state
                .volume_types
                .get(&volume_type)
                .cloned()
                .unwrap_or_default();
            if let Some(volume) = state.volumes.get_mut(&cvol) {
                volume.members.push(SimMember {
                    volume_type: type_name,
                    uuid: uuid.identifier().to_string(),
                });
            }
        }

        state.calls.push(SimCall::Add {
            cvol,
            volume_type,
            uuid: uuid.as_bytes_with_nul().to_vec(),
            size: uuid.size(),
            status,
        });
        status
    }

    fn volume_open(&self, cvol: CvolumeHandle) -> Status {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let cvol = cvol.addr();

        let status = match state.volumes.get_mut(&cvol) {
            None => status::EINVAL,
            Some(volume) if volume.opened => status::EBUSY,
            Some(volume) if volume.members.is_empty() => status::ENODEV,
            Some(volume) => {
                volume.opened = true;
                status::OK
            }
        };

        state.calls.push(SimCall::Open { cvol, status });
        status
    }

    fn volume_close(&self, cvol: CvolumeHandle) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let cvol = cvol.addr();

        match state.volumes.get_mut(&cvol) {
            None => state.faults.push(SimFault::CloseUnknown { cvol }),
            Some(volume) if !volume.opened => state.faults.push(SimFault::CloseUnopened { cvol }),
            Some(volume) => volume.opened = false,
        }
        state.calls.push(SimCall::Close { cvol });
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
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let cvol = cvol.addr();

        let in_range = state.volumes.get(&cvol).is_some_and(|volume| {
            // An aggregate too large to address gets no requests.
            let Some(capacity) = self.volume_capacity(volume) else {
                return false;
            };
            volume.opened
                && len > 0
                && addr
                    .checked_add(u64::from(len))
                    .is_some_and(|end| end <= capacity)
        });

        let io = if in_range {
            state.ios += 1;
            Some(minted(IoHandle::from_raw(state.mint())))
        } else {
            None
        };

        state.calls.push(SimCall::NewIo {
            cvol,
            queue: queue.map(QueueHandle::addr),
            addr,
            len,
            dir,
            io_class,
            flags,
            io: io.map(IoHandle::addr),
        });
        io
    }
}
