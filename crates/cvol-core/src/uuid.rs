//! Member identifier descriptor.
//!
//! The engine identifies a member by a byte buffer plus a size. For composite
//! volumes the buffer is the ASCII identifier followed by a NUL byte, and the
//! reported size counts that terminator: `"dev0"` has size 5, `""` has size 1.

use std::ffi::{CStr, CString};

use crate::error::{CvolError, CvolResult};

/// Owned identifier descriptor, built fresh for every `add` call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uuid {
    data: CString,
}

impl Uuid {
    /// Encode `identifier` as a NUL-terminated ASCII byte string.
    pub fn new(identifier: &str) -> CvolResult<Self> {
        if !identifier.is_ascii() {
            return Err(CvolError::InvalidIdentifier {
                uuid: identifier.to_string(),
                reason: "identifier must be ASCII",
            });
        }

        let data = CString::new(identifier).map_err(|_| CvolError::InvalidIdentifier {
            uuid: identifier.to_string(),
            reason: "identifier contains a NUL byte",
        })?;

        Ok(Self { data })
    }

    /// Descriptor size reported to the engine, terminator included.
    pub fn size(&self) -> usize {
        self.data.as_bytes_with_nul().len()
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.data.as_bytes_with_nul()
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.data
    }

    /// Identifier text without the terminator.
    pub fn identifier(&self) -> &str {
        // Constructed from ASCII, so this never falls back.
        self.data.to_str().unwrap_or_default()
    }
}
