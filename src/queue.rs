pub(crate) mod element;
mod sort;

use std::{alloc::Layout, iter::FusedIterator, marker::PhantomData, ptr, ptr::NonNull};

use self::element::Element;
use crate::common::{
    alloc_failure,
    error::{AllocTarget, QueueError},
    list::ListHead,
};

#[cfg(feature = "unstable-debug-counters")]
use crate::debug_counters::InternalGlobalDebugCounters;

/// A double-ended queue of strings, stored in a circular doubly-linked list.
///
/// The queue owns a heap-allocated sentinel node and every [`Element`] linked
/// into it. Insertion and removal at either end are O(1). `size` walks the whole
/// list, as the queue keeps no element counter.
///
/// # Example
///
/// ```rust
/// use circq::Queue;
///
/// let mut queue = Queue::new().unwrap();
/// queue.insert_tail("b").unwrap();
/// queue.insert_tail("a").unwrap();
/// queue.insert_head("c").unwrap();
/// assert_eq!(queue.iter().collect::<Vec<_>>(), ["c", "b", "a"]);
///
/// queue.sort();
///
/// let mut buf = [0u8; 4];
/// let elem = queue.remove_head(Some(&mut buf)).unwrap();
/// assert_eq!(elem.value(), "a");
/// assert_eq!(&buf[..2], b"a\0");
/// assert_eq!(queue.size(), 2);
/// ```
pub struct Queue {
    head: NonNull<ListHead>,
    marker: PhantomData<Box<Element>>,
}

impl Drop for Queue {
    fn drop(&mut self) {
        let head = self.sentinel();
        unsafe {
            for link in ListHead::links_safe(head) {
                drop(Element::from_link(link));
            }
            drop(Box::from_raw(head));
        }

        #[cfg(feature = "unstable-debug-counters")]
        InternalGlobalDebugCounters::sentinel_dropped();
    }
}

// The queue exclusively owns its sentinel and elements. Mutation requires
// `&mut self`, and `&self` methods only read.
unsafe impl Send for Queue {}
unsafe impl Sync for Queue {}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Queue {
    /// Creates an empty queue.
    ///
    /// Returns [`QueueError::AllocationFailure`] if the sentinel node could not
    /// be allocated.
    pub fn new() -> Result<Self, QueueError> {
        let layout = Layout::new::<ListHead>();
        let head = NonNull::new(unsafe { std::alloc::alloc(layout) }.cast::<ListHead>())
            .ok_or_else(|| alloc_failure(AllocTarget::Sentinel, layout.size()))?;

        unsafe {
            head.as_ptr().write(ListHead::new());
            ListHead::init(head.as_ptr());
        }

        #[cfg(feature = "unstable-debug-counters")]
        InternalGlobalDebugCounters::sentinel_created();

        Ok(Self {
            head,
            marker: PhantomData,
        })
    }

    /// Returns `true` if the queue has no elements.
    pub fn is_empty(&self) -> bool {
        unsafe { ListHead::is_empty(self.sentinel()) }
    }

    /// Returns the number of elements, counting them one by one.
    pub fn size(&self) -> usize {
        unsafe { ListHead::links(self.sentinel()).count() }
    }

    /// Inserts a copy of `s` at the head of the queue.
    ///
    /// On failure the queue is left unchanged.
    pub fn insert_head(&mut self, s: &str) -> Result<(), QueueError> {
        let elem = Element::try_new(s)?;
        self.insert_head_element(elem);
        Ok(())
    }

    /// Inserts a copy of `s` at the tail of the queue.
    ///
    /// On failure the queue is left unchanged.
    pub fn insert_tail(&mut self, s: &str) -> Result<(), QueueError> {
        let elem = Element::try_new(s)?;
        self.insert_tail_element(elem);
        Ok(())
    }

    /// Links an element previously removed from a queue at the head of this
    /// queue. This does not allocate.
    pub fn insert_head_element(&mut self, elem: Box<Element>) {
        unsafe { ListHead::add(Element::into_link(elem), self.sentinel()) };
    }

    /// Links an element previously removed from a queue at the tail of this
    /// queue. This does not allocate.
    pub fn insert_tail_element(&mut self, elem: Box<Element>) {
        unsafe { ListHead::add_tail(Element::into_link(elem), self.sentinel()) };
    }

    /// Removes the element at the head of the queue and returns it.
    ///
    /// The payload is also copied into `sp`: at most `sp.len() - 1` bytes
    /// followed by a NUL byte. A longer payload is silently truncated in `sp`,
    /// but the returned element keeps it whole.
    ///
    /// Returns [`QueueError::EmptyQueue`] if there is nothing to remove, and
    /// [`QueueError::NoDestination`] if `sp` is `None`. In both cases the queue
    /// is left unchanged.
    pub fn remove_head(&mut self, sp: Option<&mut [u8]>) -> Result<Box<Element>, QueueError> {
        let head = self.sentinel();
        if self.is_empty() {
            return Err(QueueError::EmptyQueue);
        }
        unsafe { Self::remove_link((*head).next, sp) }
    }

    /// Removes the element at the tail of the queue and returns it. See
    /// [`remove_head`](Self::remove_head) for how `sp` is filled.
    pub fn remove_tail(&mut self, sp: Option<&mut [u8]>) -> Result<Box<Element>, QueueError> {
        let head = self.sentinel();
        if self.is_empty() {
            return Err(QueueError::EmptyQueue);
        }
        unsafe { Self::remove_link((*head).prev, sp) }
    }

    /// Deletes the middle element, the one at 0-based index `size / 2`.
    pub fn delete_middle(&mut self) -> Result<(), QueueError> {
        let head = self.sentinel();
        if self.is_empty() {
            return Err(QueueError::EmptyQueue);
        }

        unsafe {
            // `fast` moves two links per step. When it reaches the last node (odd
            // size) or the sentinel (even size), `slow` is at the middle.
            let mut slow = (*head).next;
            let mut fast = (*head).next;
            while fast != head && (*fast).next != head {
                slow = (*slow).next;
                fast = (*(*fast).next).next;
            }

            ListHead::unlink(slow);
            drop(Element::from_link(slow));
        }
        Ok(())
    }

    /// Deletes elements whose payload equals that of the preceding retained
    /// element, so that one element of each run of equal payloads remains.
    ///
    /// The queue must already be sorted (e.g. by [`sort`](Self::sort)); this is
    /// not checked. Note that the comparison starts from an empty string, so
    /// leading elements with an empty payload are all deleted.
    pub fn delete_duplicates(&mut self) {
        let head = self.sentinel();
        unsafe {
            // Only the duplicates are freed, never the retained element `last`
            // borrows from.
            let mut last = "";
            for link in ListHead::links_safe(head) {
                let value = Element::value_of(link);
                if value == last {
                    ListHead::unlink(link);
                    drop(Element::from_link(link));
                } else {
                    last = value;
                }
            }
        }
    }

    /// Swaps every two adjacent elements. A trailing odd element stays in place.
    pub fn swap_pairs(&mut self) {
        let head = self.sentinel();
        unsafe {
            // `node` is the node preceding the next pair.
            let mut node = head;
            while (*node).next != head && (*(*node).next).next != head {
                let second = (*(*node).next).next;
                ListHead::unlink(second);
                ListHead::add(second, node);
                node = (*(*node).next).next;
            }
        }
    }

    /// Reverses the order of the elements in place.
    pub fn reverse(&mut self) {
        let head = self.sentinel();
        unsafe {
            let mut cur = head;
            loop {
                let next = (*cur).next;
                ptr::swap(ptr::addr_of_mut!((*cur).next), ptr::addr_of_mut!((*cur).prev));
                cur = next;
                if cur == head {
                    break;
                }
            }
        }
    }

    /// Sorts the elements in ascending byte order of their payloads. The sort is
    /// stable.
    pub fn sort(&mut self) {
        unsafe { sort::sort_list(self.sentinel()) }
    }

    /// Returns the payload of the head element.
    pub fn front(&self) -> Option<&str> {
        let head = self.sentinel();
        if self.is_empty() {
            None
        } else {
            Some(unsafe { Element::value_of((*head).next) })
        }
    }

    /// Returns the payload of the tail element.
    pub fn back(&self) -> Option<&str> {
        let head = self.sentinel();
        if self.is_empty() {
            None
        } else {
            Some(unsafe { Element::value_of((*head).prev) })
        }
    }

    /// Returns an iterator over the payloads, from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        let head = self.sentinel();
        unsafe {
            Iter {
                head,
                front: (*head).next,
                back: (*head).prev,
                marker: PhantomData,
            }
        }
    }
}

// Private function/methods
impl Queue {
    fn sentinel(&self) -> *mut ListHead {
        self.head.as_ptr()
    }

    unsafe fn remove_link(
        link: *mut ListHead,
        sp: Option<&mut [u8]>,
    ) -> Result<Box<Element>, QueueError> {
        // The payload is copied out before the node is unlinked.
        let sp = sp.ok_or(QueueError::NoDestination)?;
        copy_truncated(Element::value_of(link), sp);

        ListHead::unlink(link);
        Ok(Element::from_link(link))
    }
}

/// Copies as much of `src` as fits into `dst` while leaving room for a NUL
/// terminator. Nothing is written to an empty `dst`.
fn copy_truncated(src: &str, dst: &mut [u8]) {
    let Some(room) = dst.len().checked_sub(1) else {
        return;
    };
    let len = src.len().min(room);
    dst[..len].copy_from_slice(&src.as_bytes()[..len]);
    dst[len] = b'\0';
}

/// Returns the layout of the allocation that failed while inserting `s`.
fn failed_layout(target: AllocTarget, s: &str) -> Layout {
    match target {
        AllocTarget::Sentinel => Layout::new::<ListHead>(),
        AllocTarget::Element => Layout::new::<Element>(),
        AllocTarget::Payload => {
            let text_len = s.find('\0').unwrap_or(s.len());
            Layout::array::<u8>(text_len + 1).unwrap_or_else(|_| Layout::new::<u8>())
        }
    }
}

/// An iterator over the payloads of a [`Queue`].
///
/// Created by [`Queue::iter`].
pub struct Iter<'a> {
    head: *const ListHead,
    // `front` and `back` are the next nodes to yield from each end. Once they
    // cross, both sit on the sentinel.
    front: *const ListHead,
    back: *const ListHead,
    marker: PhantomData<&'a Element>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.head {
            return None;
        }
        let node = self.front;
        unsafe {
            if node == self.back {
                self.front = self.head;
                self.back = self.head;
            } else {
                self.front = (*node).next;
            }
            Some(Element::value_of(node))
        }
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back == self.head {
            return None;
        }
        let node = self.back;
        unsafe {
            if node == self.front {
                self.front = self.head;
                self.back = self.head;
            } else {
                self.back = (*node).prev;
            }
            Some(Element::value_of(node))
        }
    }
}

impl<'a> FusedIterator for Iter<'a> {}

impl<'a> IntoIterator for &'a Queue {
    type Item = &'a str;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s> Extend<&'s str> for Queue {
    /// Inserts each string at the tail.
    ///
    /// # Aborts
    ///
    /// Aborts through [`std::alloc::handle_alloc_error`] if an element or its
    /// payload buffer cannot be allocated, like the standard collections do.
    fn extend<I: IntoIterator<Item = &'s str>>(&mut self, iter: I) {
        for s in iter {
            if let Err(QueueError::AllocationFailure(target)) = self.insert_tail(s) {
                std::alloc::handle_alloc_error(failed_layout(target, s));
            }
        }
    }
}

impl<'s> FromIterator<&'s str> for Queue {
    fn from_iter<I: IntoIterator<Item = &'s str>>(iter: I) -> Self {
        let mut queue = match Queue::new() {
            Ok(queue) => queue,
            Err(_) => std::alloc::handle_alloc_error(failed_layout(AllocTarget::Sentinel, "")),
        };
        queue.extend(iter);
        queue
    }
}

#[cfg(test)]
impl Queue {
    /// Walks the list both ways from the sentinel, checking that every node's
    /// links agree with its neighbours' and that both walks see the same nodes.
    pub(crate) fn check_links(&self) {
        let head = self.sentinel();
        unsafe {
            let mut forward = Vec::new();
            let mut cur = head;
            loop {
                assert_eq!((*(*cur).next).prev, cur, "next.prev mismatch");
                assert_eq!((*(*cur).prev).next, cur, "prev.next mismatch");
                cur = (*cur).next;
                if cur == head {
                    break;
                }
                assert!(!Element::value_of(cur).contains('\0'));
                forward.push(cur);
            }

            let mut backward = Vec::new();
            let mut cur = (*head).prev;
            while cur != head {
                backward.push(cur);
                cur = (*cur).prev;
            }
            backward.reverse();
            assert_eq!(forward, backward);
            assert_eq!(forward.len(), self.size());
        }
    }

    /// Returns the addresses of the element nodes, from head to tail.
    pub(crate) fn link_addrs(&self) -> Vec<*mut ListHead> {
        unsafe { ListHead::links(self.sentinel()).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::{copy_truncated, failed_layout, Element, Queue};
    use crate::{common::list::ListHead, AllocTarget, QueueError};
    use std::alloc::Layout;

    fn queue_of(values: &[&str]) -> Queue {
        let q: Queue = values.iter().copied().collect();
        q.check_links();
        q
    }

    fn values(queue: &Queue) -> Vec<&str> {
        queue.iter().collect()
    }

    #[test]
    fn basics() {
        let mut q = Queue::new().unwrap();
        assert!(q.is_empty());
        assert_eq!(q.size(), 0);
        assert_eq!(q.front(), None);
        assert_eq!(q.back(), None);
        q.check_links();

        q.insert_tail("b").unwrap();
        q.check_links();
        q.insert_tail("a").unwrap();
        q.check_links();
        q.insert_head("c").unwrap();
        q.check_links();
        assert_eq!(values(&q), ["c", "b", "a"]);
        assert_eq!(q.size(), 3);
        assert_eq!(q.front(), Some("c"));
        assert_eq!(q.back(), Some("a"));

        let mut buf = [0xffu8; 8];
        let elem = q.remove_tail(Some(&mut buf)).unwrap();
        q.check_links();
        assert_eq!(elem.value(), "a");
        assert_eq!(&buf[..2], b"a\0");
        assert_eq!(values(&q), ["c", "b"]);

        let elem = q.remove_head(Some(&mut buf)).unwrap();
        q.check_links();
        assert_eq!(elem.value(), "c");
        assert_eq!(values(&q), ["b"]);

        let elem = q.remove_head(Some(&mut buf)).unwrap();
        assert_eq!(elem.value(), "b");
        assert!(q.is_empty());
        q.check_links();
    }

    #[test]
    fn remove_from_empty() {
        let mut q = Queue::new().unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(
            q.remove_head(Some(&mut buf)).unwrap_err(),
            QueueError::EmptyQueue
        );
        assert_eq!(
            q.remove_tail(Some(&mut buf)).unwrap_err(),
            QueueError::EmptyQueue
        );
        // Empty wins over a missing destination.
        assert_eq!(q.remove_head(None).unwrap_err(), QueueError::EmptyQueue);
    }

    #[test]
    fn remove_without_destination() {
        let mut q = queue_of(&["x", "y"]);
        assert_eq!(q.remove_head(None).unwrap_err(), QueueError::NoDestination);
        assert_eq!(q.remove_tail(None).unwrap_err(), QueueError::NoDestination);
        assert_eq!(values(&q), ["x", "y"]);
        q.check_links();
    }

    #[test]
    fn remove_truncates_copy_only() {
        let mut q = queue_of(&["abcdefgh"]);
        let mut buf = [0xffu8; 4];
        let elem = q.remove_head(Some(&mut buf)).unwrap();
        assert_eq!(&buf, b"abc\0");
        assert_eq!(elem.value(), "abcdefgh");
    }

    #[test]
    fn copy_truncated_edges() {
        let mut empty: [u8; 0] = [];
        copy_truncated("abc", &mut empty);

        let mut one = [0xffu8; 1];
        copy_truncated("abc", &mut one);
        assert_eq!(one, [0]);

        let mut exact = [0xffu8; 4];
        copy_truncated("abc", &mut exact);
        assert_eq!(&exact, b"abc\0");

        let mut roomy = [0xffu8; 6];
        copy_truncated("abc", &mut roomy);
        assert_eq!(&roomy, b"abc\0\xff\xff");
    }

    #[test]
    fn layout_of_failed_allocation() {
        assert_eq!(
            failed_layout(AllocTarget::Element, "abc"),
            Layout::new::<Element>()
        );
        assert_eq!(
            failed_layout(AllocTarget::Sentinel, ""),
            Layout::new::<ListHead>()
        );
        let payload = failed_layout(AllocTarget::Payload, "abc");
        assert_eq!((payload.size(), payload.align()), (4, 1));
        // Only the text before the first NUL is copied.
        assert_eq!(failed_layout(AllocTarget::Payload, "ab\0cdef").size(), 3);
    }

    #[test]
    fn reinsert_removed_element() {
        let mut q = queue_of(&["a", "b", "c"]);
        let mut buf = [0u8; 2];
        let elem = q.remove_head(Some(&mut buf)).unwrap();
        let addr = Box::as_ref(&elem) as *const Element as *mut ListHead;
        q.insert_tail_element(elem);
        q.check_links();
        assert_eq!(values(&q), ["b", "c", "a"]);
        assert_eq!(q.link_addrs()[2], addr);

        let elem = q.remove_tail(Some(&mut buf)).unwrap();
        let mut other = Queue::new().unwrap();
        other.insert_head_element(elem);
        other.check_links();
        assert_eq!(values(&other), ["a"]);
    }

    #[test]
    fn delete_middle() {
        let mut q = Queue::new().unwrap();
        assert_eq!(q.delete_middle().unwrap_err(), QueueError::EmptyQueue);

        let cases: &[(&[&str], &[&str])] = &[
            (&["0"], &[]),
            (&["0", "1"], &["0"]),
            (&["0", "1", "2"], &["0", "2"]),
            (&["0", "1", "2", "3", "4"], &["0", "1", "3", "4"]),
            (&["0", "1", "2", "3", "4", "5"], &["0", "1", "2", "4", "5"]),
        ];
        for (input, expected) in cases {
            let mut q = queue_of(input);
            q.delete_middle().unwrap();
            q.check_links();
            assert_eq!(values(&q), *expected, "input: {input:?}");
        }
    }

    #[test]
    fn delete_duplicates() {
        let mut q = queue_of(&["a", "a", "b", "c", "c", "c"]);
        q.delete_duplicates();
        q.check_links();
        assert_eq!(values(&q), ["a", "b", "c"]);

        let mut q = queue_of(&["a", "b", "c"]);
        q.delete_duplicates();
        assert_eq!(values(&q), ["a", "b", "c"]);

        let mut q = queue_of(&["z", "z", "z"]);
        q.delete_duplicates();
        assert_eq!(values(&q), ["z"]);

        let mut q = queue_of(&[]);
        q.delete_duplicates();
        assert!(q.is_empty());
    }

    #[test]
    fn delete_duplicates_drops_leading_empty_payloads() {
        let mut q = queue_of(&["", "", "a"]);
        q.delete_duplicates();
        q.check_links();
        assert_eq!(values(&q), ["a"]);
    }

    #[test]
    fn delete_duplicates_keeps_first_of_run() {
        let mut q = queue_of(&["a", "a", "b"]);
        let first_a = q.link_addrs()[0];
        q.delete_duplicates();
        assert_eq!(q.link_addrs()[0], first_a);
    }

    #[test]
    fn swap_pairs() {
        let cases: &[(&[&str], &[&str])] = &[
            (&[], &[]),
            (&["1"], &["1"]),
            (&["1", "2"], &["2", "1"]),
            (&["1", "2", "3", "4", "5"], &["2", "1", "4", "3", "5"]),
            (&["1", "2", "3", "4", "5", "6"], &["2", "1", "4", "3", "6", "5"]),
        ];
        for (input, expected) in cases {
            let mut q = queue_of(input);
            let addrs = q.link_addrs();
            q.swap_pairs();
            q.check_links();
            assert_eq!(values(&q), *expected, "input: {input:?}");

            // Same nodes, only relinked.
            let mut before = addrs;
            let mut after = q.link_addrs();
            before.sort();
            after.sort();
            assert_eq!(before, after);
        }
    }

    #[test]
    fn reverse() {
        let mut q = queue_of(&[]);
        q.reverse();
        q.check_links();
        assert!(q.is_empty());

        let mut q = queue_of(&["1"]);
        q.reverse();
        q.check_links();
        assert_eq!(values(&q), ["1"]);

        let mut q = queue_of(&["1", "2", "3", "4"]);
        q.reverse();
        q.check_links();
        assert_eq!(values(&q), ["4", "3", "2", "1"]);
        assert_eq!(q.front(), Some("4"));
        assert_eq!(q.back(), Some("1"));

        q.reverse();
        q.check_links();
        assert_eq!(values(&q), ["1", "2", "3", "4"]);
    }

    #[test]
    fn iter_both_ends() {
        let q = queue_of(&["a", "b", "c", "d"]);
        assert_eq!(q.iter().rev().collect::<Vec<_>>(), ["d", "c", "b", "a"]);

        let mut iter = q.iter();
        assert_eq!(iter.next(), Some("a"));
        assert_eq!(iter.next_back(), Some("d"));
        assert_eq!(iter.next(), Some("b"));
        assert_eq!(iter.next_back(), Some("c"));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        let mut iter = q.iter();
        assert_eq!(iter.next_back(), Some("d"));
        assert_eq!(iter.collect::<Vec<_>>(), ["a", "b", "c"]);

        let empty = queue_of(&[]);
        assert_eq!(empty.iter().next(), None);
        assert_eq!(empty.iter().next_back(), None);
    }

    #[test]
    fn debug_format() {
        let q = queue_of(&["a", "b"]);
        assert_eq!(format!("{q:?}"), r#"["a", "b"]"#);
    }

    #[test]
    fn drop_non_empty() {
        let mut q = queue_of(&["a", "b", "c"]);
        q.insert_head("d").unwrap();
        drop(q);
    }
}
