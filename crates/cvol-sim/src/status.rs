//! Status codes returned by the simulator.
//!
//! Negative errno values, so they read naturally in failure messages.

use cvol_core::Status;

pub const OK: Status = 0;
/// Unknown handle or malformed argument.
pub const EINVAL: Status = -22;
/// Member added to an opened volume.
pub const EBUSY: Status = -16;
/// Identifier already registered in the volume.
pub const EEXIST: Status = -17;
/// Open without any members.
pub const ENODEV: Status = -19;
/// Member limit reached.
pub const ENOSPC: Status = -28;
