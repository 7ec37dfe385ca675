use cvol_core::{IoDir, Status};

/// One call received by the simulator. Handles are recorded by address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    Create {
        ctx: usize,
        status: Status,
    },
    Destroy {
        cvol: usize,
    },
    Add {
        cvol: usize,
        volume_type: usize,
        /// Descriptor bytes exactly as received, terminator included.
        uuid: Vec<u8>,
        /// Descriptor size as reported by the caller.
        size: usize,
        status: Status,
    },
    Open {
        cvol: usize,
        status: Status,
    },
    Close {
        cvol: usize,
    },
    NewIo {
        cvol: usize,
        queue: Option<usize>,
        addr: u64,
        len: u32,
        dir: IoDir,
        io_class: u32,
        flags: u64,
        io: Option<usize>,
    },
}

impl SimCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Destroy { .. } => "destroy",
            Self::Add { .. } => "add",
            Self::Open { .. } => "open",
            Self::Close { .. } => "close",
            Self::NewIo { .. } => "new_io",
        }
    }
}

/// Misuse the native engine would not survive. A correct caller never
/// produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimFault {
    DestroyUnknown { cvol: usize },
    DestroyOpened { cvol: usize },
    CloseUnknown { cvol: usize },
    CloseUnopened { cvol: usize },
}

/// Member registered in a simulated composite volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimMember {
    pub volume_type: String,
    pub uuid: String,
}
