//! Sub-volume variants and their native volume types.

use std::fmt;

use crate::error::{CvolError, CvolResult};
use crate::handle::VolumeTypeHandle;

/// Backing store variants a composite volume can aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    /// Memory-backed volume.
    Ram,
    /// File-backed volume.
    File,
    /// Volume that injects I/O errors on configured addresses.
    Error,
    /// Volume that records the I/O passing through it.
    Trace,
}

impl VolumeKind {
    pub const ALL: [VolumeKind; 4] = [Self::Ram, Self::File, Self::Error, Self::Trace];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ram => "ram",
            Self::File => "file",
            Self::Error => "error",
            Self::Trace => "trace",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Ram => 0,
            Self::File => 1,
            Self::Error => 2,
            Self::Trace => 3,
        }
    }
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A volume that can be registered into a composite volume.
pub trait Member {
    /// Unique identifier, e.g. a device path or a symbolic name.
    fn uuid(&self) -> &str;

    fn kind(&self) -> VolumeKind;
}

/// Plain member description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubVolume {
    kind: VolumeKind,
    uuid: String,
}

impl SubVolume {
    pub fn new(kind: VolumeKind, uuid: impl Into<String>) -> Self {
        Self {
            kind,
            uuid: uuid.into(),
        }
    }
}

impl Member for SubVolume {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn kind(&self) -> VolumeKind {
        self.kind
    }
}

impl<M: Member + ?Sized> Member for &M {
    fn uuid(&self) -> &str {
        (**self).uuid()
    }

    fn kind(&self) -> VolumeKind {
        (**self).kind()
    }
}

/// Maps each [`VolumeKind`] to the type handle the engine registered for it.
#[derive(Debug, Clone, Default)]
pub struct VolumeTypeRegistry {
    slots: [Option<VolumeTypeHandle>; VolumeKind::ALL.len()],
}

impl VolumeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the type handle for `kind`, returning the one it replaces.
    pub fn register(
        &mut self,
        kind: VolumeKind,
        handle: VolumeTypeHandle,
    ) -> Option<VolumeTypeHandle> {
        self.slots[kind.slot()].replace(handle)
    }

    pub fn with(mut self, kind: VolumeKind, handle: VolumeTypeHandle) -> Self {
        self.register(kind, handle);
        self
    }

    pub fn unregister(&mut self, kind: VolumeKind) -> Option<VolumeTypeHandle> {
        self.slots[kind.slot()].take()
    }

    pub fn resolve(&self, kind: VolumeKind) -> CvolResult<VolumeTypeHandle> {
        self.slots[kind.slot()].ok_or(CvolError::UnknownVolumeType { kind })
    }

    pub fn contains(&self, kind: VolumeKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    /// Registered kinds with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (VolumeKind, VolumeTypeHandle)> + '_ {
        VolumeKind::ALL
            .into_iter()
            .filter_map(|kind| self.slots[kind.slot()].map(|handle| (kind, handle)))
    }
}
