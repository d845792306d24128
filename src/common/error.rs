/// The error type for the operations of [`Queue`][crate::Queue].
///
/// The procedural functions in [`ops`][crate::ops] map these errors to `false`
/// or `None` return values.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The operation was called without a queue handle.
    #[error("No queue handle was given")]
    InvalidHandle,

    /// The operation needs at least one element but the queue is empty.
    #[error("The queue is empty")]
    EmptyQueue,

    /// Memory for a new element or its payload buffer could not be obtained.
    /// The queue is left exactly as it was before the call.
    #[error("Failed to allocate memory for the {0}")]
    AllocationFailure(AllocTarget),

    /// A remove was requested without an output buffer to copy the removed
    /// payload into. Nothing was removed.
    #[error("No destination buffer was given for the removed value")]
    NoDestination,
}

/// What was being allocated when a [`QueueError::AllocationFailure`] happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocTarget {
    /// The sentinel node of a new queue.
    Sentinel,
    /// A queue element.
    Element,
    /// The payload buffer of a queue element.
    Payload,
}

impl AllocTarget {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Sentinel => "queue sentinel",
            Self::Element => "queue element",
            Self::Payload => "payload buffer",
        }
    }
}

impl std::fmt::Display for AllocTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
