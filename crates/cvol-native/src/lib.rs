//! Binding of [`CompositeVolumeEngine`](cvol_core::CompositeVolumeEngine)
//! to the caching engine shared library.
//!
//! The library is opened at runtime and the composite volume symbols are
//! resolved once, when [`OcfLib`] is loaded.
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `CVOL_OCF_LIBRARY` | Path of the engine shared library (default: `libocf.so`) |

pub mod config;
pub mod error;
mod ffi;
pub mod library;

pub use config::NativeConfig;
pub use error::{NativeError, NativeResult};
pub use ffi::OcfVolumeUuid;
pub use library::OcfLib;
