//! Poll loop behaviour: pacing trace, counters, handler isolation, envelope
//! ownership and cancellation.
//!
//! Time-dependent tests run on tokio's paused clock, so sleeps complete
//! instantly while `Instant` still reports the virtual time that passed.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use helpers::{collect, Fault, RecordingHandler, ScriptedTransport, Step};
use odds_poller::{
    CancellationToken, Directive, FailedCallPolicy, FetchOutcome, PollEvent, Poller, QuotaWindow,
    Transport, TransportError,
};
use tokio::time::{timeout, Instant};

const URL: &str = "http://odds.test/v4/sports?apiKey=test";

fn gaps_ms(times: &[Instant]) -> Vec<u128> {
    times
        .windows(2)
        .map(|w| w[1].duration_since(w[0]).as_millis())
        .collect()
}

async fn wait_for_handlers(stats: &odds_poller::PollStats, n: usize) {
    timeout(Duration::from_secs(5), async {
        while stats.handlers_finished() < n {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("handlers did not finish");
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_trace_with_cooldown_and_failure() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(
        vec![
            Step::Body(b"one"),
            Step::Body(b"two"),
            Step::Body(b"three"),
            Step::Fail("connection refused"),
            Step::Body(b"five"),
        ],
        5,
        cancel.clone(),
    );
    let (handler, mut rx) = RecordingHandler::new(Fault::None);
    let window = QuotaWindow::new(3, Duration::from_millis(300)).unwrap();
    let mut poller = Poller::new(Arc::clone(&transport), handler, URL, window);

    let report = poller.run(cancel).await;

    // f1 -100- f2 -100- f3 -300 (cooldown)- f4 (fail) -100- f5
    assert_eq!(gaps_ms(&transport.call_times()), vec![100, 100, 300, 100]);

    assert_eq!(report.attempts, 5);
    assert_eq!(report.successes, 4);
    assert_eq!(report.failures, 1);

    let seen = collect(&mut rx, 4).await;
    let observed: Vec<(u64, &[u8])> = seen.iter().map(|e| (e.sequence, e.body.as_slice())).collect();
    assert_eq!(
        observed,
        vec![
            (1, &b"one"[..]),
            (2, &b"two"[..]),
            (3, &b"three"[..]),
            (4, &b"five"[..]),
        ]
    );

    let stats = poller.stats();
    assert_eq!(stats.get(PollEvent::Cooldown), 1);
    assert_eq!(stats.get(PollEvent::TransportFailure), 1);
    assert_eq!(stats.get(PollEvent::FetchAttempt), 5);
}

#[tokio::test(start_paused = true)]
async fn test_reference_quota_paces_then_cools_down() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(vec![], 22, cancel.clone());
    let (handler, _rx) = RecordingHandler::new(Fault::None);
    let window = QuotaWindow::new(20, Duration::from_millis(60_000)).unwrap();
    let mut poller = Poller::new(Arc::clone(&transport), handler, URL, window);

    poller.run(cancel).await;

    let gaps = gaps_ms(&transport.call_times());
    assert_eq!(gaps.len(), 21);
    assert!(gaps[..19].iter().all(|&g| g == 3_000), "{gaps:?}");
    assert_eq!(gaps[19], 60_000);
    assert_eq!(gaps[20], 3_000);
}

#[tokio::test]
async fn test_counters_with_failed_calls_consuming_quota() {
    let transport = ScriptedTransport::unbounded(vec![
        Step::Body(b"a"),
        Step::Fail("timeout"),
        Step::Body(b"b"),
    ]);
    let (handler, _rx) = RecordingHandler::new(Fault::None);
    let window = QuotaWindow::new(10, Duration::from_secs(10)).unwrap();
    let mut poller = Poller::new(transport, handler, URL, window)
        .with_failed_call_policy(FailedCallPolicy::ConsumeQuota);

    assert!(matches!(
        poller.fetch_and_dispatch().await,
        FetchOutcome::Dispatched { sequence: 1, .. }
    ));
    assert_eq!((poller.sequence(), poller.calls_made()), (1, 1));

    assert!(matches!(
        poller.fetch_and_dispatch().await,
        FetchOutcome::Failed(_)
    ));
    assert_eq!((poller.sequence(), poller.calls_made()), (1, 2));

    assert!(matches!(
        poller.fetch_and_dispatch().await,
        FetchOutcome::Dispatched { sequence: 2, .. }
    ));
    assert_eq!((poller.sequence(), poller.calls_made()), (2, 3));
}

#[tokio::test]
async fn test_counters_with_free_failed_calls() {
    let transport = ScriptedTransport::unbounded(vec![
        Step::Body(b"a"),
        Step::Fail("timeout"),
        Step::Fail("timeout"),
        Step::Body(b"b"),
    ]);
    let (handler, _rx) = RecordingHandler::new(Fault::None);
    let window = QuotaWindow::new(2, Duration::from_millis(200)).unwrap();
    let mut poller = Poller::new(transport, handler, URL, window)
        .with_failed_call_policy(FailedCallPolicy::Free);

    poller.fetch_and_dispatch().await;
    poller.fetch_and_dispatch().await;
    poller.fetch_and_dispatch().await;
    assert_eq!((poller.sequence(), poller.calls_made()), (1, 1));
    assert_eq!(poller.directive(), Directive::Pace(Duration::from_millis(100)));

    poller.fetch_and_dispatch().await;
    assert_eq!((poller.sequence(), poller.calls_made()), (2, 2));
    assert_eq!(
        poller.directive(),
        Directive::Cooldown(Duration::from_millis(200))
    );
}

async fn assert_isolated(fault: Fault, event: PollEvent) {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(
        vec![
            Step::Body(b"1"),
            Step::Body(b"2"),
            Step::Body(b"3"),
            Step::Body(b"4"),
            Step::Body(b"5"),
        ],
        5,
        cancel.clone(),
    );
    let (handler, mut rx) = RecordingHandler::new(fault);
    let window = QuotaWindow::new(100, Duration::from_millis(10_000)).unwrap();
    let mut poller = Poller::new(Arc::clone(&transport), handler, URL, window);

    let report = poller.run(cancel).await;
    assert_eq!(transport.call_count(), 5, "fetches #4 and #5 must still happen");
    assert_eq!(report.successes, 5);

    let seen = collect(&mut rx, 5).await;
    let sequences: Vec<u64> = seen.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);

    let stats = poller.stats();
    wait_for_handlers(&stats, 5).await;
    assert_eq!(stats.get(event), 1);
    assert_eq!(stats.get(PollEvent::HandlerSuccess), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failing_handler_does_not_stop_polling() {
    assert_isolated(Fault::ErrorOn(3), PollEvent::HandlerFailure).await;
}

#[tokio::test(start_paused = true)]
async fn test_panicking_handler_does_not_stop_polling() {
    assert_isolated(Fault::PanicOn(3), PollEvent::HandlerPanic).await;
}

#[tokio::test]
async fn test_envelope_survives_buffer_mutation() {
    let transport = ScriptedTransport::unbounded(vec![Step::Body(b"original")]);
    let (handler, mut rx) = RecordingHandler::new(Fault::None);
    let window = QuotaWindow::new(10, Duration::from_secs(10)).unwrap();
    let mut poller = Poller::new(transport, handler, URL, window);

    let handle = match poller.fetch_and_dispatch().await {
        FetchOutcome::Dispatched { handle, .. } => handle,
        FetchOutcome::Failed(e) => panic!("unexpected failure: {e}"),
    };
    let buffer = poller.buffer_mut();
    buffer.clear();
    buffer.extend_from_slice(b"overwritten");

    handle.await.unwrap();
    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.body, b"original");
}

#[tokio::test(start_paused = true)]
async fn test_slow_handlers_see_their_own_bodies() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(
        vec![Step::Body(b"first"), Step::Body(b"second"), Step::Body(b"third")],
        3,
        cancel.clone(),
    );
    // Handlers outlive several fetches, so the receive buffer is reused under them
    let (handler, mut rx) = RecordingHandler::slow(Duration::from_secs(1));
    let window = QuotaWindow::new(10, Duration::from_millis(1_000)).unwrap();
    let mut poller = Poller::new(Arc::clone(&transport), handler, URL, window);

    let start = Instant::now();
    poller.run(cancel).await;
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "slow handlers must not delay fetches"
    );

    let seen = collect(&mut rx, 3).await;
    let bodies: Vec<&[u8]> = seen.iter().map(|e| e.body.as_slice()).collect();
    assert_eq!(bodies, vec![&b"first"[..], &b"second"[..], &b"third"[..]]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_cooldown() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::unbounded(vec![Step::Body(b"x")]);
    let (handler, _rx) = RecordingHandler::new(Fault::None);
    let window = QuotaWindow::new(1, Duration::from_secs(60)).unwrap();
    let mut poller = Poller::new(Arc::clone(&transport), handler, URL, window);

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        })
    };

    let report = poller.run(cancel).await;
    canceller.await.unwrap();

    assert_eq!(report.attempts, 1);
    assert_eq!(transport.call_count(), 1);
    assert!(report.elapsed < Duration::from_secs(60));
}

/// Transport whose requests take an hour to answer.
struct HangingTransport {
    calls: AtomicUsize,
}

impl Transport for HangingTransport {
    async fn fetch(&self, _url: &str, buf: &mut Vec<u8>) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        buf.extend_from_slice(b"too late");
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_pending_fetch() {
    let cancel = CancellationToken::new();
    let transport = Arc::new(HangingTransport {
        calls: AtomicUsize::new(0),
    });
    let (handler, mut rx) = RecordingHandler::new(Fault::None);
    let window = QuotaWindow::new(5, Duration::from_secs(5)).unwrap();
    let mut poller = Poller::new(Arc::clone(&transport), handler, URL, window);

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        })
    };

    let report = poller.run(cancel).await;
    canceller.await.unwrap();

    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.attempts, 1);
    assert_eq!(report.successes, 0);
    assert_eq!(report.failures, 0);
    assert!(report.elapsed < Duration::from_secs(3_600));

    let stats = poller.stats();
    assert_eq!(stats.get(PollEvent::FetchSuccess), 0);
    assert_eq!(stats.handlers_finished(), 0);
    assert!(rx.try_recv().is_err(), "no handler may be spawned");
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_calls() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let transport = ScriptedTransport::unbounded(vec![]);
    let (handler, _rx) = RecordingHandler::new(Fault::None);
    let window = QuotaWindow::new(5, Duration::from_secs(5)).unwrap();
    let mut poller = Poller::new(Arc::clone(&transport), handler, URL, window);

    let report = poller.run(cancel).await;
    assert_eq!(report.attempts, 0);
    assert_eq!(transport.call_count(), 0);
}
