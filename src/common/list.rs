//! Circular, doubly-linked, intrusive list primitives.
//!
//! A list is anchored by a sentinel [`ListHead`] which never carries a payload.
//! An empty list is a sentinel whose `next` and `prev` both point to itself.
//! Every other node is embedded (as the first field) in the structure it links.
//!
//! All functions here operate on raw pointers and never allocate or free. The
//! callers in `crate::queue` own the nodes and are responsible for keeping them
//! alive while they are linked.

use std::ptr;

#[repr(C)]
pub(crate) struct ListHead {
    pub(crate) next: *mut ListHead,
    pub(crate) prev: *mut ListHead,
}

impl std::fmt::Debug for ListHead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListHead")
            .field("next", &self.next)
            .field("prev", &self.prev)
            .finish()
    }
}

impl ListHead {
    /// Creates an unlinked node. Both links are null until the node is either
    /// initialized as a sentinel or spliced into a list.
    pub(crate) const fn new() -> Self {
        Self {
            next: ptr::null_mut(),
            prev: ptr::null_mut(),
        }
    }

    /// Makes `node` a singleton circular list (an empty list when `node` is a
    /// sentinel).
    ///
    /// # Safety
    ///
    /// `node` must be valid for writes and must not be linked into a list that
    /// is still in use, or that list loses its link to `node`.
    pub(crate) unsafe fn init(node: *mut Self) {
        (*node).next = node;
        (*node).prev = node;
    }

    /// Splices `new` between two adjacent nodes `left` and `right`.
    ///
    /// # Safety
    ///
    /// `left.next` must be `right`, and `new` must not be linked into any list.
    pub(crate) unsafe fn insert_between(new: *mut Self, left: *mut Self, right: *mut Self) {
        (*new).prev = left;
        (*new).next = right;
        (*left).next = new;
        (*right).prev = new;
    }

    /// Inserts `new` right after `head`.
    ///
    /// # Safety
    ///
    /// `head` must be a node of a consistent list, and `new` must be a valid
    /// node not linked into any list.
    pub(crate) unsafe fn add(new: *mut Self, head: *mut Self) {
        Self::insert_between(new, head, (*head).next);
    }

    /// Inserts `new` right before `head`, i.e. at the tail when `head` is the
    /// sentinel.
    ///
    /// # Safety
    ///
    /// Same as [`add`](Self::add).
    pub(crate) unsafe fn add_tail(new: *mut Self, head: *mut Self) {
        Self::insert_between(new, (*head).prev, head);
    }

    /// Unlinks `node` from its list.
    ///
    /// IMPORTANT: The links of `node` itself are left untouched and become stale.
    /// Do not follow them afterwards. This does not free the node either.
    ///
    /// # Safety
    ///
    /// `node` must be linked into a consistent list, and must not be the
    /// sentinel of a list that still has other nodes.
    pub(crate) unsafe fn unlink(node: *mut Self) {
        let prev = (*node).prev;
        let next = (*node).next;
        (*prev).next = next;
        (*next).prev = prev;
    }

    /// Returns `true` if the list has no node besides `head`.
    ///
    /// # Safety
    ///
    /// `head` must be a valid, initialized sentinel.
    pub(crate) unsafe fn is_empty(head: *const Self) -> bool {
        ptr::eq((*head).next, head)
    }

    /// Returns `true` if the list has exactly one node besides `head`.
    ///
    /// # Safety
    ///
    /// `head` must be a valid, initialized sentinel.
    pub(crate) unsafe fn is_singular(head: *const Self) -> bool {
        !Self::is_empty(head) && ptr::eq((*head).next, (*head).prev)
    }

    /// Returns a forward iterator over the nodes of the list anchored at `head`.
    /// The yielded nodes must not be unlinked while iterating; use
    /// [`links_safe`](Self::links_safe) for that.
    ///
    /// # Safety
    ///
    /// `head` must be the sentinel of a consistent list, and every node must
    /// stay alive and linked while the iterator is in use.
    pub(crate) unsafe fn links(head: *const Self) -> Links {
        Links {
            head,
            cur: (*head).next,
        }
    }

    /// Returns a forward iterator that reads the successor of a node before
    /// yielding it, so the caller may unlink or free the yielded node.
    ///
    /// # Safety
    ///
    /// `head` must be the sentinel of a consistent list. While iterating, only
    /// the node most recently yielded may be unlinked or freed.
    pub(crate) unsafe fn links_safe(head: *const Self) -> LinksSafe {
        let cur = (*head).next;
        LinksSafe {
            head,
            cur,
            next: (*cur).next,
        }
    }
}

/// Forward iterator over the nodes of a list. Clone it (or call
/// [`ListHead::links`] again) to restart from the front.
#[derive(Clone)]
pub(crate) struct Links {
    head: *const ListHead,
    cur: *mut ListHead,
}

impl Iterator for Links {
    type Item = *mut ListHead;

    fn next(&mut self) -> Option<Self::Item> {
        if ptr::eq(self.cur, self.head) {
            return None;
        }
        let node = self.cur;
        self.cur = unsafe { (*node).next };
        Some(node)
    }
}

/// Forward iterator which tolerates removal of the node it just yielded.
pub(crate) struct LinksSafe {
    head: *const ListHead,
    cur: *mut ListHead,
    next: *mut ListHead,
}

impl Iterator for LinksSafe {
    type Item = *mut ListHead;

    fn next(&mut self) -> Option<Self::Item> {
        if ptr::eq(self.cur, self.head) {
            return None;
        }
        let node = self.cur;
        self.cur = self.next;
        // `cur` is still linked here: only the previously yielded node may have
        // been removed by the caller.
        if !ptr::eq(self.cur, self.head) {
            self.next = unsafe { (*self.cur).next };
        }
        Some(node)
    }
}
