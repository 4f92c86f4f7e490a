//! Intrusive link embedded in queued items.
//!
//! A [`Link`] is either unqueued (`None`) or holds the item's two neighbors.
//! A neighbor is another item or [`Neighbor::Head`], the sentinel of the
//! queue the item is in: the first item has `prev == Head`, the tail has
//! `next == Head`. There is no separate "queued" flag.
//!
//! Neighbor slots are only rewritten by the owning queue while its guard is
//! held. The link's own lock is a leaf lock: it is never held while another
//! lock is acquired.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::error::{QueueError, Result};

/// Types that can be threaded into a [`Queue`](crate::core::queue::Queue).
///
/// Implementors return the link embedded in themselves. Each item embeds one
/// link and therefore sits in at most one queue at a time.
pub trait Linked: Sized {
    fn link(&self) -> &Link<Self>;
}

/// One side of a queued link.
pub(crate) enum Neighbor<T> {
    Head,
    Item(Arc<T>),
}

impl<T> Neighbor<T> {
    pub(crate) fn into_item(self) -> Option<Arc<T>> {
        match self {
            Neighbor::Head => None,
            Neighbor::Item(item) => Some(item),
        }
    }

    pub(crate) fn is_head(&self) -> bool {
        matches!(self, Neighbor::Head)
    }
}

impl<T> From<Option<Arc<T>>> for Neighbor<T> {
    fn from(item: Option<Arc<T>>) -> Self {
        match item {
            None => Neighbor::Head,
            Some(item) => Neighbor::Item(item),
        }
    }
}

impl<T> Clone for Neighbor<T> {
    fn clone(&self) -> Self {
        match self {
            Neighbor::Head => Neighbor::Head,
            Neighbor::Item(item) => Neighbor::Item(Arc::clone(item)),
        }
    }
}

pub(crate) struct Neighbors<T> {
    pub(crate) next: Neighbor<T>,
    pub(crate) prev: Neighbor<T>,
}

impl<T> Clone for Neighbors<T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            prev: self.prev.clone(),
        }
    }
}

/// Link field embedded in a queueable item.
pub struct Link<T> {
    state: Mutex<Option<Neighbors<T>>>,
}

impl<T> Link<T> {
    /// Create an unqueued link.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// Mark the link unqueued.
    ///
    /// Idempotent on an unqueued link. A queued link is left untouched and
    /// `AlreadyQueued` is returned: clearing it would orphan the item from
    /// its queue without fixing the queue's count.
    pub fn init(&self) -> Result<()> {
        let state = self.state.lock();
        if state.is_some() {
            return Err(QueueError::AlreadyQueued);
        }
        Ok(())
    }

    /// Returns `true` if the item is currently threaded into a queue.
    pub fn is_queued(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Atomically move an unqueued link into the queued state.
    ///
    /// Returns `false` without touching the link if it is already queued,
    /// which makes the check-and-link race free across queues.
    pub(crate) fn claim(&self, neighbors: Neighbors<T>) -> bool {
        let mut state = self.state.lock();
        if state.is_some() {
            return false;
        }
        *state = Some(neighbors);
        true
    }

    /// Unlink, returning the neighbors the item had.
    pub(crate) fn take(&self) -> Option<Neighbors<T>> {
        self.state.lock().take()
    }

    pub(crate) fn neighbors(&self) -> Option<Neighbors<T>> {
        self.state.lock().clone()
    }

    /// The next item, or `None` at the tail or when unqueued.
    pub(crate) fn next_item(&self) -> Option<Arc<T>> {
        self.state
            .lock()
            .as_ref()
            .and_then(|n| n.next.clone().into_item())
    }

    pub(crate) fn replace_next(&self, next: Neighbor<T>) -> Neighbor<T> {
        let mut state = self.state.lock();
        match state.as_mut() {
            Some(n) => std::mem::replace(&mut n.next, next),
            None => {
                debug_assert!(false, "rewriting next of an unqueued link");
                Neighbor::Head
            }
        }
    }

    pub(crate) fn replace_prev(&self, prev: Neighbor<T>) -> Neighbor<T> {
        let mut state = self.state.lock();
        match state.as_mut() {
            Some(n) => std::mem::replace(&mut n.prev, prev),
            None => {
                debug_assert!(false, "rewriting prev of an unqueued link");
                Neighbor::Head
            }
        }
    }
}

impl<T> Default for Link<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("queued", &self.is_queued())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cell {
        link: Link<Cell>,
    }

    #[test]
    fn new_link_is_unqueued_and_init_is_idempotent() {
        let link: Link<Cell> = Link::new();
        assert!(!link.is_queued());
        assert!(link.init().is_ok());
        assert!(link.init().is_ok());
        assert!(!link.is_queued());
    }

    #[test]
    fn claim_is_exclusive() {
        let cell = Cell { link: Link::new() };
        let first = Neighbors {
            next: Neighbor::Head,
            prev: Neighbor::Head,
        };
        assert!(cell.link.claim(first.clone()));
        assert!(!cell.link.claim(first));
        assert_eq!(cell.link.init(), Err(QueueError::AlreadyQueued));

        assert!(cell.link.take().is_some());
        assert!(!cell.link.is_queued());
        assert!(cell.link.init().is_ok());
    }
}
