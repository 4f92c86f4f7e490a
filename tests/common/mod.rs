#![allow(dead_code)]

use std::sync::Arc;

use intrusive_queue_mini::core::guard::RawMutex;
use intrusive_queue_mini::{Link, Linked, Queue};

/// Test item carrying a numeric payload.
#[derive(Debug)]
pub struct Item {
    link: Link<Item>,
    pub value: u32,
}

impl Linked for Item {
    fn link(&self) -> &Link<Self> {
        &self.link
    }
}

pub fn item(value: u32) -> Arc<Item> {
    Arc::new(Item {
        link: Link::new(),
        value,
    })
}

/// Build a queue holding `values` in order, returning the items too.
pub fn queue_of(values: &[u32]) -> (Queue<Item>, Vec<Arc<Item>>) {
    queue_with(values)
}

pub fn queue_with<R: RawMutex>(values: &[u32]) -> (Queue<Item, R>, Vec<Arc<Item>>) {
    let queue = Queue::new();
    let items: Vec<_> = values.iter().map(|&v| item(v)).collect();
    for it in &items {
        queue.put(it).unwrap();
    }
    (queue, items)
}

pub fn values<R: RawMutex>(queue: &Queue<Item, R>) -> Vec<u32> {
    queue.snapshot().iter().map(|it| it.value).collect()
}

/// Walk with `peek`/`next` and check it agrees with `count`.
pub fn assert_count_matches_walk<R: RawMutex>(queue: &Queue<Item, R>) {
    let mut walked = 0;
    let mut cursor = queue.peek();
    while let Some(it) = cursor {
        walked += 1;
        cursor = queue.next(&it);
    }
    assert_eq!(walked, queue.count(), "count must equal reachable items");
    assert_eq!(queue.snapshot().len(), queue.count());
}
