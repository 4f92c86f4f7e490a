use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::lock_api::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::core::error::{QueueError, Result};
use crate::core::guard::{DefaultGuard, RawMutex};
use crate::core::link::{Linked, Neighbor, Neighbors};

/// Sentinel state of a queue: its first and last items and the item count.
///
/// `first` plays the sentinel's `next`, `last` its `prev`. The chain is only
/// touched with the owning queue's guard held.
pub(crate) struct Chain<T> {
    pub(crate) first: Option<Arc<T>>,
    pub(crate) last: Option<Arc<T>>,
    pub(crate) count: usize,
}

impl<T: Linked> Chain<T> {
    fn empty() -> Self {
        Self {
            first: None,
            last: None,
            count: 0,
        }
    }

    /// Walk the items from first to last.
    pub(crate) fn iter(&self) -> Walk<'_, T> {
        Walk {
            cursor: self.first.clone(),
            _chain: PhantomData,
        }
    }

    pub(crate) fn contains(&self, item: &T) -> bool {
        self.iter().any(|queued| std::ptr::eq(Arc::as_ptr(&queued), item))
    }

    fn next_of(&self, at: &Neighbor<T>) -> Neighbor<T> {
        match at {
            Neighbor::Head => self.first.clone().into(),
            Neighbor::Item(item) => item
                .link()
                .neighbors()
                .map_or(Neighbor::Head, |n| n.next),
        }
    }

    fn replace_next(&mut self, at: &Neighbor<T>, next: Neighbor<T>) -> Neighbor<T> {
        match at {
            Neighbor::Head => std::mem::replace(&mut self.first, next.into_item()).into(),
            Neighbor::Item(item) => item.link().replace_next(next),
        }
    }

    fn replace_prev(&mut self, at: &Neighbor<T>, prev: Neighbor<T>) -> Neighbor<T> {
        match at {
            Neighbor::Head => std::mem::replace(&mut self.last, prev.into_item()).into(),
            Neighbor::Item(item) => item.link().replace_prev(prev),
        }
    }

    /// Append at the tail. Returns `false` if the item is already queued.
    pub(crate) fn link_tail(&mut self, item: &Arc<T>) -> bool {
        let tail: Neighbor<T> = self.last.clone().into();
        let claimed = item.link().claim(Neighbors {
            next: Neighbor::Head,
            prev: tail.clone(),
        });
        if !claimed {
            return false;
        }

        self.replace_next(&tail, Neighbor::Item(Arc::clone(item)));
        self.replace_prev(&Neighbor::Head, Neighbor::Item(Arc::clone(item)));
        self.count += 1;

        self.assert_shape();
        true
    }

    pub(crate) fn link_before(&mut self, before: &T, item: &Arc<T>) -> Result<()> {
        let Some(anchor) = before.link().neighbors() else {
            return Err(QueueError::NotQueued);
        };
        let before_slot = self.next_of(&anchor.prev);
        debug_assert!(
            matches!(&before_slot, Neighbor::Item(b) if std::ptr::eq(Arc::as_ptr(b), before)),
            "anchor's predecessor does not point back at it"
        );

        let claimed = item.link().claim(Neighbors {
            next: before_slot.clone(),
            prev: anchor.prev.clone(),
        });
        if !claimed {
            return Err(QueueError::AlreadyQueued);
        }

        self.replace_next(&anchor.prev, Neighbor::Item(Arc::clone(item)));
        self.replace_prev(&before_slot, Neighbor::Item(Arc::clone(item)));
        self.count += 1;

        self.assert_shape();
        Ok(())
    }

    /// Whether a sentinel neighbor of `item` is this chain's sentinel.
    ///
    /// O(1). Catches foreign first/last items; a foreign item with two item
    /// neighbors passes and is only caught by a membership walk.
    pub(crate) fn ends_match(&self, neighbors: &Neighbors<T>, item: &T) -> bool {
        let is_item = |end: &Option<Arc<T>>| {
            end.as_ref()
                .is_some_and(|e| std::ptr::eq(Arc::as_ptr(e), item))
        };
        (!neighbors.prev.is_head() || is_item(&self.first))
            && (!neighbors.next.is_head() || is_item(&self.last))
    }

    /// Splice an item out by rejoining its neighbors. O(1).
    ///
    /// Returns `None`, touching nothing, if the item is not queued or one of
    /// its sentinel neighbors belongs to another chain.
    pub(crate) fn unlink(&mut self, item: &T) -> Option<Arc<T>> {
        let neighbors = item.link().neighbors()?;
        if !self.ends_match(&neighbors, item) {
            return None;
        }
        let Neighbors { next, prev } = item.link().take()?;

        let removed = self.replace_next(&prev, next.clone());
        self.replace_prev(&next, prev);

        debug_assert!(self.count > 0, "unlinking from an empty chain");
        self.count = self.count.saturating_sub(1);

        self.assert_shape();
        let removed = removed.into_item();
        debug_assert!(
            removed
                .as_ref()
                .is_some_and(|r| std::ptr::eq(Arc::as_ptr(r), item)),
            "predecessor did not point at the unlinked item"
        );
        removed
    }

    #[inline]
    fn assert_shape(&self) {
        debug_assert_eq!(self.first.is_none(), self.last.is_none());
        debug_assert_eq!(self.first.is_none(), self.count == 0);
        debug_assert!(
            self.last
                .as_ref()
                .and_then(|tail| tail.link().neighbors())
                .is_none_or(|n| n.next.is_head()),
            "tail must point at the sentinel"
        );
    }
}

/// Forward walk over a chain, borrowed for as long as its guard is held.
pub(crate) struct Walk<'a, T> {
    cursor: Option<Arc<T>>,
    _chain: PhantomData<&'a Chain<T>>,
}

impl<T: Linked> Iterator for Walk<'_, T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Arc<T>> {
        let item = self.cursor.take()?;
        self.cursor = item.link().next_item();
        Some(item)
    }
}

/// Guarded intrusive doubly-linked queue.
///
/// The queue holds a reference to each linked item and drops it on unlink;
/// it never creates or destroys item storage. Every operation runs under the
/// queue's own guard `R`, so distinct queues never contend.
pub struct Queue<T: Linked, R: RawMutex = DefaultGuard> {
    chain: Mutex<R, Chain<T>>,
}

impl<T: Linked, R: RawMutex> Queue<T, R> {
    /// Create an empty queue with a fresh guard.
    pub fn new() -> Self {
        Self {
            chain: Mutex::new(Chain::empty()),
        }
    }

    pub(crate) fn lock_chain(&self) -> MutexGuard<'_, R, Chain<T>> {
        self.chain.lock()
    }

    /// Append an item at the tail.
    ///
    /// Rejected with `AlreadyQueued` (and no mutation) if the item is linked
    /// into this or any other queue.
    pub fn put(&self, item: &Arc<T>) -> Result<()> {
        let mut chain = self.chain.lock();
        if !chain.link_tail(item) {
            debug!("put rejected: item already queued");
            return Err(QueueError::AlreadyQueued);
        }
        trace!(count = chain.count, "put");
        Ok(())
    }

    /// Move every item of `source` to the tail of this queue in one splice.
    ///
    /// `source` is left empty. Both guards are held; they are taken in address
    /// order so merges in opposite directions cannot deadlock.
    pub fn merge_all(&self, source: &Self) {
        if std::ptr::eq(self, source) {
            return;
        }

        let (mut target, mut src) = if (self as *const Self) < (source as *const Self) {
            let target = self.chain.lock();
            let src = source.chain.lock();
            (target, src)
        } else {
            let src = source.chain.lock();
            let target = self.chain.lock();
            (target, src)
        };

        let Some(src_first) = src.first.take() else {
            return;
        };
        let src_last = src.last.take();
        let moved = std::mem::take(&mut src.count);

        let tail: Neighbor<T> = target.last.clone().into();
        target.replace_next(&tail, Neighbor::Item(Arc::clone(&src_first)));
        src_first.link().replace_prev(tail);
        target.last = src_last;
        target.count += moved;

        target.assert_shape();
        src.assert_shape();
        trace!(moved, count = target.count, "merge_all");
    }

    /// Remove and return the head item, or `None` if empty.
    pub fn get(&self) -> Option<Arc<T>> {
        let mut chain = self.chain.lock();
        let first = chain.first.clone()?;
        let item = chain.unlink(&first);
        trace!(count = chain.count, "get");
        item
    }

    /// Remove and return the tail item, or `None` if empty.
    pub fn get_last(&self) -> Option<Arc<T>> {
        let mut chain = self.chain.lock();
        let last = chain.last.clone()?;
        let item = chain.unlink(&last);
        trace!(count = chain.count, "get_last");
        item
    }

    /// The head item without removing it.
    pub fn peek(&self) -> Option<Arc<T>> {
        self.chain.lock().first.clone()
    }

    /// The tail item without removing it.
    pub fn peek_last(&self) -> Option<Arc<T>> {
        self.chain.lock().last.clone()
    }

    /// The item after `item`, or `None` at the end of the queue.
    ///
    /// `item` must be queued here; an unqueued item yields `None`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self, item: &T) -> Option<Arc<T>> {
        let _chain = self.chain.lock();
        item.link().next_item()
    }

    /// Splice `item` in immediately before `before`.
    ///
    /// `before` must be queued here. Fails with `NotQueued` if it is not
    /// queued at all and with `AlreadyQueued` if `item` is.
    pub fn insert_before(&self, before: &T, item: &Arc<T>) -> Result<()> {
        let mut chain = self.chain.lock();
        debug_assert!(
            !before.link().is_queued() || chain.contains(before),
            "insert anchor belongs to another queue"
        );
        if let Err(err) = chain.link_before(before, item) {
            debug!(%err, "insert_before rejected");
            return Err(err);
        }
        trace!(count = chain.count, "insert_before");
        Ok(())
    }

    /// Unlink a known member in O(1).
    ///
    /// Unqueued items are ignored, and so are items that are first or last
    /// of another queue. A foreign item from the middle of another queue is a
    /// contract violation caught only by debug assertions; use
    /// [`delete_ext`](Self::delete_ext) when membership is uncertain.
    pub fn delete(&self, item: &T) {
        let mut chain = self.chain.lock();
        debug_assert!(
            item.link()
                .neighbors()
                .is_none_or(|n| !chain.ends_match(&n, item) || chain.contains(item)),
            "deleting an item from the middle of another queue"
        );
        match chain.unlink(item) {
            Some(_) => trace!(count = chain.count, "delete"),
            None if item.link().is_queued() => {
                debug!("delete ignored: item is queued in another queue")
            }
            None => {}
        }
    }

    /// Unlink `item` after verifying it is a member by walking the queue.
    ///
    /// Returns `false`, leaving the queue unchanged, if it is not found.
    pub fn delete_ext(&self, item: &T) -> bool {
        let mut chain = self.chain.lock();
        if !chain.contains(item) {
            debug!(err = %QueueError::NotFound, "delete_ext");
            return false;
        }
        chain.unlink(item);
        trace!(count = chain.count, "delete_ext");
        true
    }

    /// Number of queued items. O(1), maintained by every mutation.
    pub fn count(&self) -> usize {
        self.chain.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.chain.lock().first.is_none()
    }

    /// Tear the queue down, unlinking any remaining items.
    ///
    /// The items themselves are untouched apart from their links, which end
    /// unqueued. Returns how many items were still linked.
    pub fn destroy(self) -> usize {
        let remaining = self.count();
        drop(self);
        remaining
    }
}

impl<T: Linked, R: RawMutex> Default for Queue<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Linked, R: RawMutex> Drop for Queue<T, R> {
    fn drop(&mut self) {
        let chain = self.chain.get_mut();
        let mut unlinked = 0usize;
        while let Some(first) = chain.first.clone() {
            if chain.unlink(&first).is_none() {
                // Stale head: the chain cannot be followed any further.
                warn!(
                    count = chain.count,
                    "queue dropped with a corrupt chain; abandoning remaining links"
                );
                *chain = Chain::empty();
                break;
            }
            unlinked += 1;
        }
        if unlinked > 0 {
            debug!(unlinked, "queue dropped with items still linked");
        }
    }
}

impl<T: Linked, R: RawMutex> fmt::Debug for Queue<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("count", &self.count())
            .finish()
    }
}
