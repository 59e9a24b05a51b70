/// All possible errors emitted by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<TransportError> {
    /// Error reported by the debug transport
    Transport(TransportError),

    /// A memory block write into the page buffer failed, the page was not committed
    WriteFailed(TransportError),

    /// The controller did not become ready in time
    Timeout,

    /// A command targeted a locked region
    LockError,

    /// The controller rejected a malformed command
    ProgramError,

    /// Offset or length outside of the addressed region
    OutOfRange,

    /// Address or length not aligned to the access unit
    NotAligned,

    /// Invalid value passed
    Value,
}
