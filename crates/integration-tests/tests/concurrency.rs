//! Concurrency: many producers, completions from many execution contexts

use async_trait::async_trait;
use dispatchq_core::port::{EventHandler, HandlerError};
use dispatchq_core::{DispatchQueue, WorkerId};
use dispatchq_runtime::{ExecutionStatus, QueueRunner};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every event once and tracks how many run at the same time
#[derive(Default)]
struct TrackingHandler {
    seen: Mutex<HashSet<u64>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl EventHandler<u64> for TrackingHandler {
    async fn handle(&self, _worker: WorkerId, event: u64) -> Result<(), HandlerError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.seen.lock().unwrap().insert(event) {
            return Err(HandlerError::Failed(format!("event {} delivered twice", event)));
        }
        tokio::time::sleep(Duration::from_micros(200)).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_every_event_runs_once() {
    const PRODUCERS: u64 = 8;
    const PER_PRODUCER: u64 = 100;
    const POOL: usize = 3;

    let handler = Arc::new(TrackingHandler::default());
    let queue = Arc::new(DispatchQueue::new(5, POOL));
    let runner = Arc::new(QueueRunner::new(queue.clone(), handler.clone()));

    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let runner = Arc::clone(&runner);
        producers.push(tokio::spawn(async move {
            let mut tasks = Vec::new();
            let mut rejections = 0u64;
            for i in 0..PER_PRODUCER {
                let mut event = p * 1_000 + i;
                loop {
                    match runner.spawn(event) {
                        Ok(task) => {
                            tasks.push(task);
                            break;
                        }
                        Err(rejected) => {
                            rejections += 1;
                            event = rejected.into_event();
                            tokio::time::sleep(Duration::from_micros(100)).await;
                        }
                    }
                }
            }
            let mut failures = 0;
            for task in tasks {
                let report = task.await.unwrap().unwrap();
                if report.status != ExecutionStatus::Success {
                    failures += 1;
                }
            }
            (rejections, failures)
        }));
    }

    let mut total_rejections = 0;
    for producer in producers {
        let (rejections, failures) = producer.await.unwrap();
        assert_eq!(failures, 0);
        total_rejections += rejections;
    }
    runner.wait_idle().await;

    assert_eq!(handler.seen.lock().unwrap().len() as u64, PRODUCERS * PER_PRODUCER);
    assert!(handler.peak.load(Ordering::SeqCst) <= POOL);

    let stats = queue.stats();
    assert_eq!(stats.length, 0);
    assert_eq!(stats.busy_workers, 0);
    assert_eq!(stats.counters.completed, PRODUCERS * PER_PRODUCER);
    assert_eq!(stats.counters.rejected, total_rejections);
}

#[test]
fn test_plain_threads_share_the_queue() {
    const THREADS: usize = 6;
    const PER_THREAD: usize = 300;

    let queue = Arc::new(DispatchQueue::new(2, 2));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let queue = Arc::clone(&queue);
            let seen = Arc::clone(&seen);
            std::thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let mut event = t * PER_THREAD + i;
                    let handle = loop {
                        match queue.try_submit(event) {
                            Ok(handle) => break handle,
                            Err(rejected) => {
                                event = rejected.into_event();
                                std::thread::yield_now();
                            }
                        }
                    };
                    let mut worker = futures::executor::block_on(handle).expect("bound");
                    seen.lock().unwrap().push(worker.take_event().unwrap());
                    worker.complete();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..THREADS * PER_THREAD).collect::<Vec<_>>());
    assert_eq!(queue.length(), 0);
    assert_eq!(queue.count_busy_workers(), 0);
}
