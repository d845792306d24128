use std::{alloc::Layout, ptr::NonNull};

use crate::common::{
    alloc_failure,
    error::{AllocTarget, QueueError},
    list::ListHead,
};

#[cfg(feature = "unstable-debug-counters")]
use crate::debug_counters::InternalGlobalDebugCounters;

/// An element of a [`Queue`][crate::Queue].
///
/// An element owns a NUL-terminated copy of the text it was inserted with. It is
/// handed to the caller by [`Queue::remove_head`][crate::Queue::remove_head] and
/// [`Queue::remove_tail`][crate::Queue::remove_tail], and can then be dropped
/// (or passed to [`release_element`][crate::ops::release_element]), or put back
/// into a queue with [`Queue::insert_head_element`][crate::Queue::insert_head_element]
/// and friends.
// `list` must stay the first field: a `*mut ListHead` pointing at it is cast
// back to `*mut Element`.
#[repr(C)]
pub struct Element {
    list: ListHead,
    // Always ends with a single '\0'.
    value: String,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("value", &self.value())
            .finish()
    }
}

impl Element {
    /// Allocates a new element holding a copy of `s`.
    ///
    /// Like a C string, `s` is only copied up to its first NUL character. The
    /// payload buffer is exactly one byte longer than the copied text.
    pub(crate) fn try_new(s: &str) -> Result<Box<Self>, QueueError> {
        let text = match s.find('\0') {
            Some(end) => &s[..end],
            None => s,
        };

        let buf_len = text.len() + 1;
        let mut value = String::new();
        value
            .try_reserve_exact(buf_len)
            .map_err(|_| alloc_failure(AllocTarget::Payload, buf_len))?;
        value.push_str(text);
        value.push('\0');

        let layout = Layout::new::<Self>();
        // If this fails, `value` is dropped on the way out, so nothing leaks.
        let ptr = NonNull::new(unsafe { std::alloc::alloc(layout) }.cast::<Self>())
            .ok_or_else(|| alloc_failure(AllocTarget::Element, layout.size()))?;

        #[cfg(feature = "unstable-debug-counters")]
        InternalGlobalDebugCounters::element_created();

        unsafe {
            ptr.as_ptr().write(Self {
                list: ListHead::new(),
                value,
            });
            // The memory came from the global allocator with `Layout::new::<Self>()`,
            // which is what `Box` expects.
            Ok(Box::from_raw(ptr.as_ptr()))
        }
    }

    /// Returns the payload text, without its NUL terminator.
    pub fn value(&self) -> &str {
        &self.value[..self.value.len() - 1]
    }

    /// Returns the payload buffer, including its NUL terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.value.as_bytes()
    }

    /// Consumes the element, returning the payload text.
    pub fn into_value(mut self: Box<Self>) -> String {
        let mut value = std::mem::take(&mut self.value);
        value.pop();
        value
    }

    /// Gives up ownership of the element and returns a pointer to its embedded
    /// list node, ready to be spliced into a list.
    pub(crate) fn into_link(this: Box<Self>) -> *mut ListHead {
        Box::into_raw(this).cast::<ListHead>()
    }

    /// Takes back ownership of the element embedding `link`.
    ///
    /// # Safety
    ///
    /// `link` must come from [`into_link`](Self::into_link), must have been
    /// unlinked already, and must not be used afterwards.
    pub(crate) unsafe fn from_link(link: *mut ListHead) -> Box<Self> {
        Box::from_raw(link.cast::<Self>())
    }

    /// Borrows the payload of the element embedding `link`.
    ///
    /// # Safety
    ///
    /// `link` must be the node of a live element, and the element must outlive
    /// the returned reference.
    pub(crate) unsafe fn value_of<'a>(link: *const ListHead) -> &'a str {
        (*link.cast::<Self>()).value()
    }
}

#[cfg(feature = "unstable-debug-counters")]
impl Drop for Element {
    fn drop(&mut self) {
        InternalGlobalDebugCounters::element_dropped();
    }
}

// An element is exclusively owned either by a queue or by the caller it was
// removed to. Its links are only followed while it is in a queue.
unsafe impl Send for Element {}
unsafe impl Sync for Element {}
