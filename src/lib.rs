#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A double-ended queue of strings on an intrusive, circular, doubly-linked
//! list.
//!
//! A [`Queue`] owns a sentinel node; each [`Element`] embeds its own list node
//! and owns a NUL-terminated copy of the string it was inserted with. Besides
//! O(1) insertion and removal at both ends, the queue supports a few whole-list
//! transformations that work purely by relinking nodes:
//!
//! - [`delete_middle`](Queue::delete_middle)
//! - [`delete_duplicates`](Queue::delete_duplicates) (on a sorted queue)
//! - [`swap_pairs`](Queue::swap_pairs)
//! - [`reverse`](Queue::reverse)
//! - [`sort`](Queue::sort), a stable merge sort
//!
//! "Remove" operations hand the unlinked [`Element`] over to the caller, while
//! "delete" operations free it.
//!
//! The [`ops`] module offers the same operations as free functions that accept
//! an absent queue handle and report failures as `false`/`None`.
//!
//! # Example
//!
//! ```rust
//! use circq::Queue;
//!
//! let mut queue = Queue::new().unwrap();
//! for s in ["1", "2", "3", "4", "5"] {
//!     queue.insert_tail(s).unwrap();
//! }
//!
//! queue.swap_pairs();
//! assert_eq!(queue.iter().collect::<Vec<_>>(), ["2", "1", "4", "3", "5"]);
//!
//! queue.reverse();
//! assert_eq!(queue.iter().collect::<Vec<_>>(), ["5", "3", "4", "1", "2"]);
//!
//! queue.delete_middle().unwrap();
//! assert_eq!(queue.iter().collect::<Vec<_>>(), ["5", "3", "1", "2"]);
//! ```
//!
//! # Thread safety
//!
//! A queue can be moved to another thread, but it has no internal
//! synchronization. Wrap it in a lock to share it between threads.
//!
//! # Cargo features
//!
//! - `logging`: reports allocation failures (and [`ops`] calls without a queue
//!   handle) through the [`log`](https://docs.rs/log) crate.
//! - `unstable-debug-counters`: enables [`GlobalDebugCounters`], which counts
//!   created and dropped sentinels and elements.

pub(crate) mod common;
pub mod ops;
pub(crate) mod queue;

#[cfg(feature = "unstable-debug-counters")]
#[cfg_attr(docsrs, doc(cfg(feature = "unstable-debug-counters")))]
mod debug_counters;

pub use common::error::{AllocTarget, QueueError};
pub use queue::{element::Element, Iter, Queue};

#[cfg(feature = "unstable-debug-counters")]
#[cfg_attr(docsrs, doc(cfg(feature = "unstable-debug-counters")))]
pub use debug_counters::GlobalDebugCounters;
