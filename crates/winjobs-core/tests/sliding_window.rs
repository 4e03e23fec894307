//! Integration tests: window advancement, retries and result ordering.
//!
//! Runs on a paused Tokio clock so job delays resolve deterministically.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::observer::{Event, Recorder};
use common::probe::{expected_results, failing, scripted, Probe};
use winjobs_core::scheduler::JobFuture;
use winjobs_core::{
    job, CompletionError, Job, JobError, JobObserver, JobStatus, SchedulerStatus,
    SlidingWindowJobs, Snapshot,
};

fn build(
    jobs: Vec<Job<String, String>>,
    window_size: usize,
    retry: u32,
    recorder: Option<&Arc<Recorder>>,
) -> SlidingWindowJobs<String, String> {
    let mut builder = SlidingWindowJobs::builder(jobs)
        .window_size(window_size)
        .retry(retry);
    if let Some(recorder) = recorder {
        let observer: Arc<dyn JobObserver<String, String>> = recorder.clone();
        builder = builder.observer(observer);
    }
    builder.build().expect("build scheduler")
}

fn assert_success_prefix(snapshot: &Snapshot<String, String>) {
    if let Some(cursor) = snapshot.cursor {
        for report in &snapshot.reports[..=cursor] {
            assert_eq!(
                report.status(),
                JobStatus::Success,
                "job {} is inside the cursor but not successful",
                report.index()
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn window_of_two_resolves_in_order() {
    let probe = Probe::new();
    let jobs = vec![
        scripted(&probe, 0, 30, 0),
        scripted(&probe, 1, 10, 0),
        scripted(&probe, 2, 20, 0),
    ];
    let sched = build(jobs, 2, 0, None);

    let results = sched.start().unwrap().await.unwrap();

    assert_eq!(results, expected_results(3));
    assert!(probe.max_running() <= 2);
    assert_eq!(probe.launches(), vec![0, 1, 2]);
    assert_eq!(sched.status(), SchedulerStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn exhausted_job_rejects_with_its_index() {
    let probe = Probe::new();
    let jobs = vec![
        failing(&probe, 0, 10),
        failing(&probe, 1, 25),
        scripted(&probe, 2, 5, 0),
    ];
    let sched = build(jobs, 3, 1, None);

    let err = sched.start().unwrap().await.unwrap_err();

    assert_eq!(err.failed_job_index(), Some(0));
    assert_eq!(probe.attempts(0), 2);
    assert_eq!(sched.status(), SchedulerStatus::Fail);
    match err {
        CompletionError::JobFailed(failed) => {
            assert_eq!(failed.message(), "job failed");
            assert_eq!(failed.reports.len(), 3);
            let first = &failed.reports[0];
            assert_eq!(first.status(), JobStatus::Fail);
            assert_eq!(first.tried(), 2);
            assert_eq!(failed.reports[1].status(), JobStatus::Running);
            assert_eq!(failed.reports[2].status(), JobStatus::Success);
        }
        CompletionError::Abandoned => panic!("expected JobFailed"),
    }
}

#[tokio::test(start_paused = true)]
async fn failure_within_budget_retries_then_advances() {
    let probe = Probe::new();
    let recorder = Arc::new(Recorder::default());
    let jobs = vec![scripted(&probe, 0, 10, 1), scripted(&probe, 1, 10, 0)];
    let sched = build(jobs, 1, 2, Some(&recorder));

    let results = sched.start().unwrap().await.unwrap();

    assert_eq!(results, expected_results(2));
    assert_eq!(probe.launches(), vec![0, 0, 1]);
    assert_eq!(
        recorder.events(),
        vec![
            Event::Fail(0),
            Event::Executed(0),
            Event::Succeed(0, "r0".to_string()),
            Event::Executed(0),
            Event::Succeed(1, "r1".to_string()),
            Event::Executed(1),
        ]
    );
    let snapshot = sched.snapshot().await.unwrap();
    assert_eq!(snapshot.cursor, Some(1));
    assert_eq!(snapshot.reports[0].tried(), 2);
    assert_eq!(snapshot.reports[1].tried(), 1);
}

#[tokio::test(start_paused = true)]
async fn pause_lets_in_flight_settle_without_new_batches() {
    let probe = Probe::new();
    let recorder = Arc::new(Recorder::default());
    let jobs = (0..4).map(|i| scripted(&probe, i, 10, 0)).collect();
    let sched = build(jobs, 2, 0, Some(&recorder));

    let completion = sched.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(probe.running(), 2);
    sched.pause();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = sched.snapshot().await.unwrap();
    assert_eq!(snapshot.status, SchedulerStatus::Paused);
    let statuses: Vec<_> = snapshot.reports.iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![
            JobStatus::Success,
            JobStatus::Success,
            JobStatus::Init,
            JobStatus::Init
        ]
    );
    assert_eq!(recorder.count(|e| matches!(e, Event::Succeed(..))), 2);
    assert_eq!(recorder.count(|e| matches!(e, Event::Executed(_))), 2);
    assert!(!completion.is_settled());
    assert_eq!(probe.launches(), vec![0, 1]);

    sched.resume();
    let results = completion.await.unwrap();
    assert_eq!(results, expected_results(4));
    assert_eq!(probe.launches(), vec![0, 1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn interior_completion_does_not_advance_cursor() {
    let probe = Probe::new();
    let jobs = vec![
        scripted(&probe, 0, 40, 0),
        scripted(&probe, 1, 5, 0),
        scripted(&probe, 2, 5, 0),
        scripted(&probe, 3, 5, 0),
    ];
    let sched = build(jobs, 3, 0, None);
    let completion = sched.start().unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let snapshot = sched.snapshot().await.unwrap();
    assert_eq!(snapshot.cursor, None);
    assert_eq!(snapshot.reports[1].status(), JobStatus::Success);
    assert_eq!(snapshot.reports[3].status(), JobStatus::Init);
    assert_eq!(probe.launches(), vec![0, 1, 2]);

    assert_eq!(completion.await.unwrap(), expected_results(4));
    assert_eq!(probe.launches(), vec![0, 1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn empty_job_list_resolves_immediately() {
    let sched = build(Vec::new(), 5, 2, None);
    let results = sched.start().unwrap().await.unwrap();
    assert!(results.is_empty());
    assert_eq!(sched.status(), SchedulerStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn panicking_job_counts_as_failure() {
    let recorder = Arc::new(Recorder::default());
    let explode = true;
    let jobs: Vec<Job<String, String>> = vec![job(move || async move {
        if explode {
            panic!("boom");
        }
        Ok(String::from("never"))
    })];
    let sched = build(jobs, 1, 0, Some(&recorder));

    let err = sched.start().unwrap().await.unwrap_err();

    assert_eq!(err.failed_job_index(), Some(0));
    let CompletionError::JobFailed(failed) = err else {
        panic!("expected JobFailed");
    };
    assert_eq!(
        failed.reports[0].error(),
        Some(&JobError::Panicked("boom".to_string()))
    );
    assert_eq!(recorder.events(), vec![Event::Fail(0), Event::Executed(0)]);
}

#[tokio::test(start_paused = true)]
async fn panicking_factory_counts_as_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let factory_calls = Arc::clone(&calls);
    let exploding: Job<String, String> = Arc::new(move || -> JobFuture<String, String> {
        factory_calls.fetch_add(1, Ordering::SeqCst);
        panic!("sync boom")
    });
    let sched = build(vec![exploding], 1, 1, None);

    let err = sched.start().unwrap().await.unwrap_err();

    assert_eq!(err.failed_job_index(), Some(0));
    let CompletionError::JobFailed(failed) = err else {
        panic!("expected JobFailed");
    };
    assert_eq!(failed.reports[0].tried(), 2);
    assert_eq!(
        failed.reports[0].error(),
        Some(&JobError::Panicked("sync boom".to_string()))
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // The driver survived and still answers.
    let snapshot = sched.snapshot().await.unwrap();
    assert_eq!(snapshot.status, SchedulerStatus::Fail);
}

#[tokio::test(start_paused = true)]
async fn later_failures_after_rejection_do_not_resettle() {
    let probe = Probe::new();
    let jobs = vec![failing(&probe, 0, 5), failing(&probe, 1, 20)];
    let sched = build(jobs, 2, 0, None);

    let completion = sched.start().unwrap();
    let err = completion.clone().await.unwrap_err();
    assert_eq!(err.failed_job_index(), Some(0));

    // Job 1 still finishes and exhausts; the first outcome stands.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = sched.snapshot().await.unwrap();
    assert_eq!(snapshot.reports[1].status(), JobStatus::Fail);
    assert_eq!(snapshot.reports[1].tried(), 1);
    assert_eq!(
        completion.try_outcome().unwrap().unwrap_err().failed_job_index(),
        Some(0)
    );
    assert_eq!(probe.total_attempts(), 2);
}

/// Every small window/retry combination with failures inside the budget must
/// resolve in order, never run a job twice at once, never exceed the window
/// and keep the cursor on a success prefix.
#[tokio::test(start_paused = true)]
async fn sweep_resolves_with_success_prefix_held() {
    const JOBS: usize = 6;
    for window_size in 1..=4usize {
        for retry in 0..=2u32 {
            let probe = Probe::new();
            let jobs = (0..JOBS)
                .map(|i| {
                    let failures = ((i * 7 + window_size) % (retry as usize + 1)) as u32;
                    let delay = (((i * 13 + window_size * 3) % 5) + 1) as u64 * 3;
                    scripted(&probe, i, delay, failures)
                })
                .collect();
            let sched = build(jobs, window_size, retry, None);
            let completion = sched.start().unwrap();

            for _ in 0..1_000 {
                let snapshot = sched.snapshot().await.unwrap();
                assert_success_prefix(&snapshot);
                if completion.is_settled() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }

            let results = tokio::time::timeout(Duration::from_secs(60), completion.wait())
                .await
                .unwrap_or_else(|_| {
                    panic!("no progress with window {} retry {}", window_size, retry)
                })
                .unwrap();
            assert_eq!(results, expected_results(JOBS));
            assert_eq!(probe.duplicates(), 0);
            assert!(probe.max_running() <= window_size);
        }
    }
}
