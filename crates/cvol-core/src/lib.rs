//! Composite volume binding for the caching engine's functional test suite.
//!
//! A composite volume is one logical block volume assembled from several
//! independently addressable sub-volumes. This crate owns the lifecycle of the
//! engine-side aggregate object and the dispatch of I/O requests against it:
//!
//! - [`CompositeVolume`] performs create on construction and destroy on drop
//! - [`CompositeVolume::add`] registers members resolved through the
//!   [`VolumeTypeRegistry`] of the owning [`Context`]
//! - every native status is checked and translated into a [`CvolError`]
//!
//! The native engine itself sits behind [`CompositeVolumeEngine`]; the
//! `cvol-native` crate binds it to the shared library and `cvol-sim` provides
//! an in-memory implementation.
//!
//! # Quick Start
//!
//! ```ignore
//! use cvol_core::{CompositeVolume, Context, IoDir, SubVolume, VolumeKind};
//!
//! let mut cvol = CompositeVolume::create(&ctx)?;
//! cvol.add(&SubVolume::new(VolumeKind::Ram, "dev0"))?;
//! cvol.add(&SubVolume::new(VolumeKind::Ram, "dev1"))?;
//! cvol.open()?;
//! let io = cvol.new_io(None, 0, 4096, IoDir::Read, 0, 0)?;
//! cvol.close()?;
//! ```

pub mod composite;
pub mod context;
pub mod engine;
pub mod error;
pub mod handle;
pub mod io;
pub mod uuid;
pub mod volume_type;

pub use composite::{CompositeVolume, VolumeState};
pub use context::Context;
pub use engine::{CompositeVolumeEngine, Status};
pub use error::{CvolError, CvolResult};
pub use handle::{ContextHandle, CvolumeHandle, IoHandle, QueueHandle, VolumeTypeHandle};
pub use io::{Io, IoDir};
pub use uuid::Uuid;
pub use volume_type::{Member, SubVolume, VolumeKind, VolumeTypeRegistry};
