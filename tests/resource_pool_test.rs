//! Integration tests for ResourcePool
//!
//! Exercises exhaustion, lowest-index allocation and the
//! `available + reserved == total` invariant under contention.

use retail_counter::core::{ResourcePool, UnitStatus};
use retail_counter::util::UnitId;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_pool_of_five_exhausts_on_sixth_reserve() {
    let pool = ResourcePool::new(5);
    let ids: Vec<UnitId> = (0..5).filter_map(|_| pool.reserve_next()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(pool.reserve_next(), None);
    assert_eq!(pool.available_count(), 0);
}

#[test]
fn test_released_unit_is_reused_first() {
    let pool = ResourcePool::new(5);
    for _ in 0..5 {
        pool.reserve_next();
    }
    assert!(pool.release(3));
    assert!(!pool.release(3));
    assert_eq!(pool.reserve_next(), Some(3));
}

#[test]
fn test_reserve_specific_and_unknown_ids() {
    let pool = ResourcePool::new(3);
    assert!(pool.reserve_specific(2));
    assert!(!pool.reserve_specific(2));
    assert!(!pool.reserve_specific(9));
    assert!(!pool.release(9));

    let units = pool.units();
    assert_eq!(units[2].status, UnitStatus::Reserved);
    assert!(units[2].reserved_at.is_some());
    assert!(units[0].reserved_at.is_none());
}

#[test]
fn test_restock_returns_everything() {
    let pool = ResourcePool::new(4);
    pool.reserve_next();
    pool.reserve_next();
    assert_eq!(pool.restock(), 2);
    let stats = pool.stats();
    assert_eq!(stats.available, 4);
    assert_eq!(stats.reserved, 0);
}

#[test]
fn test_concurrent_reservations_are_distinct() {
    const THREADS: usize = 16;
    const SIZE: usize = 50;

    for _trial in 0..20 {
        let pool = Arc::new(ResourcePool::new(SIZE));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut mine = Vec::new();
                    while let Some(id) = pool.reserve_next() {
                        mine.push(id);
                    }
                    mine
                })
            })
            .collect();

        let all: Vec<UnitId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<UnitId> = all.iter().copied().collect();
        assert_eq!(all.len(), SIZE);
        assert_eq!(unique.len(), SIZE);
        assert_eq!(pool.available_count(), 0);
    }
}

#[test]
fn test_counts_always_sum_to_total() {
    const THREADS: usize = 8;
    const SIZE: usize = 10;

    let pool = Arc::new(ResourcePool::new(SIZE));
    let done = Arc::new(AtomicBool::new(false));

    let observer = {
        let pool = Arc::clone(&pool);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut observations = 0_u64;
            while !done.load(Ordering::Acquire) {
                let stats = pool.stats();
                assert_eq!(stats.available + stats.reserved, stats.total);
                assert_eq!(stats.total, SIZE);
                observations += 1;
            }
            observations
        })
    };

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..2_000 {
                    if let Some(id) = pool.reserve_next() {
                        assert!(pool.release(id));
                    }
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }
    done.store(true, Ordering::Release);
    assert!(observer.join().unwrap() > 0);
    assert_eq!(pool.available_count(), SIZE);
}
