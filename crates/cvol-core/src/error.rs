//! Error types for composite volume operations.

use crate::composite::VolumeState;
use crate::io::IoDir;
use crate::volume_type::VolumeKind;

/// Composite volume errors.
#[derive(Debug, thiserror::Error)]
pub enum CvolError {
    /// The engine refused to allocate the aggregate volume.
    ///
    /// A status of 0 means the engine reported success without producing a
    /// handle.
    #[error("composite volume creation failed (status {status})")]
    Creation { status: i32 },

    /// The engine refused to add a member volume.
    #[error("failed to add volume '{uuid}' to a composite volume (status {status})")]
    Membership { uuid: String, status: i32 },

    /// No native volume type is registered for the member's variant.
    #[error("no volume type registered for {kind} volumes")]
    UnknownVolumeType { kind: VolumeKind },

    /// The engine failed to open the aggregate.
    #[error("failed to open composite volume (status {status})")]
    Open { status: i32 },

    /// The engine returned no I/O handle.
    #[error("failed to allocate {dir} io at {addr:#x} (length {len})")]
    IoCreation { addr: u64, len: u32, dir: IoDir },

    /// The identifier cannot be encoded as a NUL-terminated ASCII string.
    #[error("invalid volume identifier {uuid:?}: {reason}")]
    InvalidIdentifier { uuid: String, reason: &'static str },

    /// Operation issued out of lifecycle order.
    #[error("cannot {op} a composite volume in state {state:?}")]
    InvalidState { op: &'static str, state: VolumeState },
}

impl CvolError {
    /// Native status code, when the engine reported one.
    pub fn status(&self) -> Option<i32> {
        match self {
            Self::Creation { status } | Self::Membership { status, .. } | Self::Open { status } => {
                Some(*status)
            }
            Self::UnknownVolumeType { .. }
            | Self::IoCreation { .. }
            | Self::InvalidIdentifier { .. }
            | Self::InvalidState { .. } => None,
        }
    }

    /// Short label for correlating with engine-side logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Creation { .. } => "creation",
            Self::Membership { .. } => "membership",
            Self::UnknownVolumeType { .. } => "unknown-volume-type",
            Self::Open { .. } => "open",
            Self::IoCreation { .. } => "io-creation",
            Self::InvalidIdentifier { .. } => "invalid-identifier",
            Self::InvalidState { .. } => "invalid-state",
        }
    }
}

/// Result type for composite volume operations.
pub type CvolResult<T> = Result<T, CvolError>;
