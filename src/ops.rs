//! Procedural queue operations.
//!
//! These functions take the queue handle as an `Option`, so a caller (such as a
//! test harness replaying commands) can pass an absent handle. Every failure,
//! including an absent handle, is reported through the return value: `false`
//! for the boolean operations and `None` for the ones returning a value.
//! Nothing here panics.
//!
//! Use the methods of [`Queue`] directly to get a [`QueueError`] describing the
//! failure instead.

use crate::{Element, Queue, QueueError};

/// Creates an empty queue, or returns `None` if memory could not be obtained.
pub fn new_queue() -> Option<Queue> {
    Queue::new().ok()
}

/// Frees the queue and every element still in it. Does nothing for `None`.
pub fn free_queue(head: Option<Queue>) {
    drop(head);
}

/// Frees an element returned by [`remove_head`] or [`remove_tail`].
pub fn release_element(elem: Box<Element>) {
    drop(elem);
}

/// Inserts a copy of `s` at the head. Returns `false` if `head` is `None` or
/// memory could not be obtained.
pub fn insert_head(head: Option<&mut Queue>, s: &str) -> bool {
    with_queue("insert_head", head, |q| q.insert_head(s)).is_ok()
}

/// Inserts a copy of `s` at the tail. Returns `false` if `head` is `None` or
/// memory could not be obtained.
pub fn insert_tail(head: Option<&mut Queue>, s: &str) -> bool {
    with_queue("insert_tail", head, |q| q.insert_tail(s)).is_ok()
}

/// Removes the head element, copying its payload into `sp` (truncated to
/// `sp.len() - 1` bytes plus a NUL byte).
///
/// Returns `None` if `head` is `None`, the queue is empty, or `sp` is `None`.
pub fn remove_head(head: Option<&mut Queue>, sp: Option<&mut [u8]>) -> Option<Box<Element>> {
    with_queue("remove_head", head, |q| q.remove_head(sp)).ok()
}

/// Removes the tail element. See [`remove_head`].
pub fn remove_tail(head: Option<&mut Queue>, sp: Option<&mut [u8]>) -> Option<Box<Element>> {
    with_queue("remove_tail", head, |q| q.remove_tail(sp)).ok()
}

/// Returns the number of elements, or 0 if `head` is `None`.
pub fn size(head: Option<&Queue>) -> usize {
    head.map_or(0, Queue::size)
}

/// Deletes the middle element. Returns `false` if `head` is `None` or the queue
/// is empty.
pub fn delete_middle(head: Option<&mut Queue>) -> bool {
    with_queue("delete_middle", head, Queue::delete_middle).is_ok()
}

/// Deletes adjacent duplicates of a sorted queue. Returns `false` only if
/// `head` is `None`.
pub fn delete_duplicates(head: Option<&mut Queue>) -> bool {
    with_queue("delete_duplicates", head, |q| {
        q.delete_duplicates();
        Ok(())
    })
    .is_ok()
}

/// Swaps every two adjacent elements. Does nothing if `head` is `None`.
pub fn swap_pairs(head: Option<&mut Queue>) {
    if let Some(q) = head {
        q.swap_pairs();
    }
}

/// Reverses the queue. Does nothing if `head` is `None`.
pub fn reverse(head: Option<&mut Queue>) {
    if let Some(q) = head {
        q.reverse();
    }
}

/// Sorts the queue in ascending order. Does nothing if `head` is `None`.
pub fn sort(head: Option<&mut Queue>) {
    if let Some(q) = head {
        q.sort();
    }
}

fn with_queue<T>(
    _op: &'static str,
    head: Option<&mut Queue>,
    f: impl FnOnce(&mut Queue) -> Result<T, QueueError>,
) -> Result<T, QueueError> {
    match head {
        Some(q) => f(q),
        None => {
            #[cfg(feature = "logging")]
            log::debug!("{_op}: called without a queue handle");
            Err(QueueError::InvalidHandle)
        }
    }
}
