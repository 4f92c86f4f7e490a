//! Predicate traversal over a queue.
//!
//! Each walk holds the queue's guard from first item to last, so it sees a
//! stable snapshot. Predicates and removal callbacks run under that guard and
//! must not call back into the same queue.

use std::sync::Arc;

use tracing::trace;

use crate::core::guard::RawMutex;
use crate::core::link::Linked;
use crate::core::queue::Queue;

impl<T: Linked, R: RawMutex> Queue<T, R> {
    /// First item, from the head, for which `matches` holds. Nothing is removed.
    pub fn linear_search<F>(&self, mut matches: F) -> Option<Arc<T>>
    where
        F: FnMut(&T) -> bool,
    {
        let chain = self.lock_chain();
        chain.iter().find(|item| matches(&**item))
    }

    /// Remove every item for which `matches` holds, in a single pass.
    ///
    /// `on_removed` takes ownership of each removed item after it has been
    /// unlinked, in queue order, so it may re-queue the item elsewhere.
    pub fn linear_delete<F, A>(&self, mut matches: F, mut on_removed: A)
    where
        F: FnMut(&T) -> bool,
        A: FnMut(Arc<T>),
    {
        let mut chain = self.lock_chain();
        let mut cursor = chain.first.clone();
        let mut removed = 0usize;

        while let Some(item) = cursor {
            // Successor first: unlinking clears the item's link.
            cursor = item.link().next_item();
            if matches(&*item) {
                chain.unlink(&item);
                removed += 1;
                on_removed(item);
            }
        }
        trace!(removed, count = chain.count, "linear_delete");
    }

    /// Remove the first item for which `matches` holds and return it.
    ///
    /// `on_removed` runs once on that item after the unlink. Unlike
    /// [`linear_delete`](Self::linear_delete) the walk stops at the first match.
    pub fn linear_delete_new<F, A>(&self, mut matches: F, on_removed: A) -> Option<Arc<T>>
    where
        F: FnMut(&T) -> bool,
        A: FnOnce(&Arc<T>),
    {
        let mut chain = self.lock_chain();
        let found = chain.iter().find(|item| matches(&**item))?;
        chain.unlink(&found);
        on_removed(&found);
        trace!(count = chain.count, "linear_delete_new");
        Some(found)
    }

    /// Copy of the queue's items in traversal order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.lock_chain().iter().collect()
    }
}
