//! Scheduler tests with a shortened tick resolution.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bitforcast::{Scheduler, Task};

#[test]
fn due_tasks_fire_repeatedly_at_their_cadence() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    let _scheduler = Scheduler::start_with_tick(
        vec![Task::new("counter", Duration::from_millis(20), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })],
        Duration::from_millis(5),
    );

    thread::sleep(Duration::from_millis(300));
    let count = fired.load(Ordering::SeqCst);
    // 300ms / 20ms cadence: generous bounds to stay robust under load.
    assert!(count >= 3, "task fired only {count} times");
}

#[test]
fn each_task_keeps_its_own_cadence() {
    let fast = Arc::new(AtomicUsize::new(0));
    let slow = Arc::new(AtomicUsize::new(0));
    let fast_counter = Arc::clone(&fast);
    let slow_counter = Arc::clone(&slow);

    let _scheduler = Scheduler::start_with_tick(
        vec![
            Task::new("fast", Duration::from_millis(10), move || {
                fast_counter.fetch_add(1, Ordering::SeqCst);
            }),
            Task::new("slow", Duration::from_millis(120), move || {
                slow_counter.fetch_add(1, Ordering::SeqCst);
            }),
        ],
        Duration::from_millis(5),
    );

    thread::sleep(Duration::from_millis(300));
    assert!(fast.load(Ordering::SeqCst) > slow.load(Ordering::SeqCst));
}

#[test]
fn stop_halts_future_ticks() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    let mut scheduler = Scheduler::start_with_tick(
        vec![Task::new("counter", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })],
        Duration::from_millis(5),
    );

    thread::sleep(Duration::from_millis(50));
    scheduler.stop();
    let after_stop = fired.load(Ordering::SeqCst);
    assert!(after_stop >= 1);

    thread::sleep(Duration::from_millis(100));
    assert_eq!(fired.load(Ordering::SeqCst), after_stop);
}

#[test]
fn dropping_the_scheduler_joins_the_thread() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    {
        let _scheduler = Scheduler::start_with_tick(
            vec![Task::new("counter", Duration::from_millis(10), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })],
            Duration::from_millis(5),
        );
        thread::sleep(Duration::from_millis(40));
    }

    let after_drop = fired.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(fired.load(Ordering::SeqCst), after_drop);
}
