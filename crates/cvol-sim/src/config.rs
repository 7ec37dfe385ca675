/// Simulator limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Maximum number of members per composite volume.
    pub max_members: usize,

    /// Size in bytes of every member volume.
    pub member_size: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_members: 16,
            member_size: 64 * 1024 * 1024,
        }
    }
}

impl SimConfig {
    pub fn with_max_members(mut self, max_members: usize) -> Self {
        self.max_members = max_members;
        self
    }

    pub fn with_member_size(mut self, member_size: u64) -> Self {
        self.member_size = member_size;
        self
    }
}
