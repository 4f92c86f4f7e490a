mod common;

use std::sync::Arc;

use common::{assert_count_matches_walk, queue_of, values, Item};
use intrusive_queue_mini::{Linked, Queue};

fn is_even(it: &Item) -> bool {
    it.value % 2 == 0
}

#[test]
fn test_linear_search_returns_first_match_without_removing() {
    let (queue, items) = queue_of(&[1, 2, 3, 4, 5]);

    let found = queue.linear_search(is_even).unwrap();
    assert!(Arc::ptr_eq(&found, &items[1]));
    assert_eq!(values(&queue), vec![1, 2, 3, 4, 5]);
    assert!(found.link().is_queued());
}

#[test]
fn test_linear_search_with_context_and_no_match() {
    let (queue, _items) = queue_of(&[1, 3, 5]);

    let wanted = 3;
    assert_eq!(queue.linear_search(|it| it.value == wanted).unwrap().value, 3);
    assert!(queue.linear_search(is_even).is_none());

    let empty: Queue<Item> = Queue::new();
    assert!(empty.linear_search(|_| true).is_none());
}

#[test]
fn test_linear_delete_removes_all_matches_in_order() {
    let (queue, _items) = queue_of(&[1, 2, 3, 4, 5]);
    let mut removed = Vec::new();

    queue.linear_delete(is_even, |it| {
        assert!(!it.link().is_queued(), "callback must see an unlinked item");
        removed.push(it.value);
    });

    assert_eq!(removed, vec![2, 4]);
    assert_eq!(values(&queue), vec![1, 3, 5]);
    assert_eq!(queue.count(), 3);
    assert_count_matches_walk(&queue);
}

#[test]
fn test_linear_delete_adjacent_and_boundary_matches() {
    let (queue, _items) = queue_of(&[2, 4, 5, 6, 8]);
    let mut calls = 0;

    queue.linear_delete(is_even, |_| calls += 1);

    assert_eq!(calls, 4);
    assert_eq!(values(&queue), vec![5]);
    assert_eq!(queue.peek().unwrap().value, 5);
    assert_eq!(queue.peek_last().unwrap().value, 5);
}

#[test]
fn test_linear_delete_everything_and_nothing() {
    let (queue, _items) = queue_of(&[1, 2, 3]);

    queue.linear_delete(|_| false, |_| panic!("nothing matches"));
    assert_eq!(values(&queue), vec![1, 2, 3]);

    queue.linear_delete(|_| true, drop);
    assert!(queue.is_empty());
    assert_eq!(queue.count(), 0);
}

#[test]
fn test_linear_delete_callback_can_requeue_elsewhere() {
    let (queue, _items) = queue_of(&[1, 2, 3, 4]);
    let evens: Queue<Item> = Queue::new();

    queue.linear_delete(is_even, |it| evens.put(&it).unwrap());

    assert_eq!(values(&queue), vec![1, 3]);
    assert_eq!(values(&evens), vec![2, 4]);
}

#[test]
fn test_linear_delete_new_removes_first_match_only() {
    let (queue, items) = queue_of(&[1, 2, 3, 4, 5]);
    let mut seen = Vec::new();

    let found = queue
        .linear_delete_new(is_even, |it| seen.push(it.value))
        .unwrap();

    assert!(Arc::ptr_eq(&found, &items[1]));
    assert!(!found.link().is_queued());
    assert_eq!(seen, vec![2]);
    assert_eq!(values(&queue), vec![1, 3, 4, 5]);
    assert_eq!(queue.count(), 4);
}

#[test]
fn test_linear_delete_new_without_match() {
    let (queue, _items) = queue_of(&[1, 3]);

    let found = queue.linear_delete_new(is_even, |_| panic!("no match expected"));

    assert!(found.is_none());
    assert_eq!(values(&queue), vec![1, 3]);
}
