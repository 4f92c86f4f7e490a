//! Guarded intrusive queue service.
//!
//! Items embed a [`Link`] and are threaded into a sentinel-headed,
//! doubly-linked [`Queue`]. Each queue carries its own guard; every
//! operation runs under it, and O(1) operations stay O(1).

pub mod core;

pub use crate::core::error::{QueueError, Result};
pub use crate::core::guard::{DefaultGuard, SpinGuard};
pub use crate::core::link::{Link, Linked};
pub use crate::core::queue::Queue;
