use crate::engine::CompositeVolumeEngine;
use crate::handle::ContextHandle;
use crate::volume_type::VolumeTypeRegistry;

/// Caching engine runtime as seen by composite volumes.
///
/// Bundles the engine calls, the native context handle and the volume types
/// registered with that context. The context is supplied by the caller and
/// must outlive every [`CompositeVolume`](crate::CompositeVolume) built from
/// it, which the borrow in `CompositeVolume<'ctx, _>` enforces.
/// A context is not `Send`; it stays on the thread that created it.
pub struct Context<E> {
    engine: E,
    handle: ContextHandle,
    volume_types: VolumeTypeRegistry,
}

impl<E: CompositeVolumeEngine> Context<E> {
    pub fn new(engine: E, handle: ContextHandle, volume_types: VolumeTypeRegistry) -> Self {
        Self {
            engine,
            handle,
            volume_types,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn handle(&self) -> ContextHandle {
        self.handle
    }

    pub fn volume_types(&self) -> &VolumeTypeRegistry {
        &self.volume_types
    }

    pub fn volume_types_mut(&mut self) -> &mut VolumeTypeRegistry {
        &mut self.volume_types
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}
