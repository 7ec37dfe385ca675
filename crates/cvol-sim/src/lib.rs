//! In-memory [`CompositeVolumeEngine`](cvol_core::CompositeVolumeEngine).
//!
//! [`SimEngine`] keeps the observable composite volume rules of the native
//! engine (member limit, open state, addressable range) and records every
//! call it receives, so test drivers can assert on exact call sequences and
//! identifier bytes without loading the shared library.

pub mod call;
pub mod config;
pub mod engine;
pub mod status;

pub use call::{SimCall, SimFault, SimMember};
pub use config::SimConfig;
pub use engine::SimEngine;
