//! Concurrent put/get stress scenario.
//!
//! `producers` threads each put `items_per_producer` fresh tokens on one
//! shared queue while a single consumer drains it with `get`. The run passes
//! when every token arrives exactly once and each producer's tokens arrive in
//! the order they were put.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use tracing::{info, info_span, warn};

use crate::core::config::StressConfig;
use crate::core::error::HarnessError;
use crate::core::guard::RawMutex;
use crate::core::link::{Link, Linked};
use crate::core::queue::Queue;
use crate::core::report::{Outcome, RunRecord};

/// Item moved through the queue by a stress run.
#[derive(Debug)]
pub struct Token {
    link: Link<Token>,
    pub producer: usize,
    pub seq: usize,
}

impl Token {
    pub fn new(producer: usize, seq: usize) -> Arc<Self> {
        Arc::new(Self {
            link: Link::new(),
            producer,
            seq,
        })
    }
}

impl Linked for Token {
    fn link(&self) -> &Link<Self> {
        &self.link
    }
}

#[derive(Default)]
struct Tally {
    received: usize,
    unique: usize,
    duplicates: usize,
    out_of_order: usize,
}

/// Run the scenario on a queue guarded by `R`.
pub fn run<R>(config: &StressConfig) -> Result<RunRecord, HarnessError>
where
    R: RawMutex + Send + Sync,
{
    config.validate()?;

    let run_id = RunRecord::next_run_id();
    let span = info_span!(
        "stress_run",
        run_id,
        producers = config.producers,
        items_per_producer = config.items_per_producer
    );
    let _enter = span.enter();

    let queue: Queue<Token, R> = Queue::new();
    let started = Instant::now();

    let tally = drive(&queue, config.producers, |producer| {
        let mut rejected = 0usize;
        for seq in 0..config.items_per_producer {
            if queue.put(&Token::new(producer, seq)).is_err() {
                rejected += 1;
            }
        }
        rejected
    })?;

    let expected = config.expected();
    let missing = expected.saturating_sub(tally.unique);
    let passed = tally.received == expected
        && tally.duplicates == 0
        && missing == 0
        && tally.out_of_order == 0
        && queue.is_empty();

    let record = RunRecord {
        run_id,
        producers: config.producers,
        items_per_producer: config.items_per_producer,
        expected,
        received: tally.received,
        duplicates: tally.duplicates,
        missing,
        out_of_order: tally.out_of_order,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        outcome: if passed { Outcome::Passed } else { Outcome::Failed },
    };
    info!(%record, "stress run finished");
    Ok(record)
}

/// Run `produce` on `producers` threads against one consumer draining `queue`.
///
/// `produce` returns how many of its puts were rejected. The consumer is told
/// to finish once every producer has returned, including by panicking.
fn drive<R, P>(
    queue: &Queue<Token, R>,
    producers: usize,
    produce: P,
) -> Result<Tally, HarnessError>
where
    R: RawMutex + Send + Sync,
    P: Fn(usize) -> usize + Sync,
{
    let producers_done = AtomicBool::new(false);

    thread::scope(|scope| -> Result<Tally, HarnessError> {
        let handles: Vec<_> = (0..producers)
            .map(|producer| {
                let produce = &produce;
                scope.spawn(move || produce(producer))
            })
            .collect();

        let consumer = scope.spawn(|| consume(queue, producers, &producers_done));

        let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();
        producers_done.store(true, Ordering::Release);
        let tally = consumer
            .join()
            .map_err(|_| HarnessError::WorkerPanicked { role: "consumer" })?;

        let mut rejected = 0usize;
        for result in joined {
            rejected += result.map_err(|_| HarnessError::WorkerPanicked { role: "producer" })?;
        }
        if rejected > 0 {
            warn!(rejected, "fresh tokens were rejected by put");
        }
        Ok(tally)
    })
}

fn consume<R: RawMutex>(
    queue: &Queue<Token, R>,
    producers: usize,
    producers_done: &AtomicBool,
) -> Tally {
    let mut tally = Tally::default();
    let mut seen = HashSet::new();
    let mut last_seq: Vec<Option<usize>> = vec![None; producers];

    loop {
        match queue.get() {
            Some(token) => {
                tally.received += 1;
                if !seen.insert((token.producer, token.seq)) {
                    tally.duplicates += 1;
                }
                let last = &mut last_seq[token.producer];
                if last.is_some_and(|prev| token.seq <= prev) {
                    tally.out_of_order += 1;
                }
                *last = Some(token.seq);
            }
            // Items put before the flag flipped may still be queued.
            None if producers_done.load(Ordering::Acquire) => {
                if queue.is_empty() {
                    break;
                }
            }
            None => thread::yield_now(),
        }
    }

    tally.unique = seen.len();
    tally
}
