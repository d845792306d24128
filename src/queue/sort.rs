//! Stable merge sort over the nodes of a circular list.
//!
//! The cycle is cut open into a linear chain linked by `next` only (the last
//! node's `next` is null), sorted recursively, and then the `prev` links and the
//! sentinel are restored in a single forward pass.

use std::ptr;

use super::element::Element;
use crate::common::list::ListHead;

/// Sorts the list anchored at `head` in ascending byte order of the payloads.
/// Elements with equal payloads keep their relative order.
///
/// # Safety
///
/// `head` must be the sentinel of a consistent list of `Element` nodes.
pub(crate) unsafe fn sort_list(head: *mut ListHead) {
    if ListHead::is_empty(head) || ListHead::is_singular(head) {
        return;
    }

    (*(*head).prev).next = ptr::null_mut();
    let first = merge_sort((*head).next);

    // Walk the sorted chain once to rebuild the back links.
    let mut prev = head;
    let mut cur = first;
    while !cur.is_null() {
        (*prev).next = cur;
        (*cur).prev = prev;
        prev = cur;
        cur = (*cur).next;
    }
    (*prev).next = head;
    (*head).prev = prev;
}

unsafe fn merge_sort(first: *mut ListHead) -> *mut ListHead {
    if first.is_null() || (*first).next.is_null() {
        return first;
    }

    // Find the midpoint. `slow` ends at the last node of the left half.
    let mut slow = first;
    let mut fast = (*first).next;
    while !fast.is_null() && !(*fast).next.is_null() {
        slow = (*slow).next;
        fast = (*(*fast).next).next;
    }

    let second = (*slow).next;
    (*slow).next = ptr::null_mut();

    merge(merge_sort(first), merge_sort(second))
}

/// Merges two sorted chains. On ties the node from `left` goes first.
unsafe fn merge(mut left: *mut ListHead, mut right: *mut ListHead) -> *mut ListHead {
    let mut merged = ptr::null_mut();
    let mut tail: *mut *mut ListHead = &mut merged;

    while !left.is_null() && !right.is_null() {
        if Element::value_of(left) > Element::value_of(right) {
            *tail = right;
            right = (*right).next;
        } else {
            *tail = left;
            left = (*left).next;
        }
        tail = ptr::addr_of_mut!((**tail).next);
    }

    *tail = if left.is_null() { right } else { left };
    merged
}
