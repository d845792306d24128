pub(crate) mod error;
pub(crate) mod list;

/// Logs an allocation failure when the `logging` feature is enabled, and returns
/// the matching error.
pub(crate) fn alloc_failure(
    target: error::AllocTarget,
    _size: usize,
) -> error::QueueError {
    #[cfg(feature = "logging")]
    log::warn!("Failed to allocate {_size} bytes for the {target}");

    error::QueueError::AllocationFailure(target)
}
