//! Integration tests for the cold observable engine and its operator set.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tokio_test::assert_ok;

use coldstream::prelude::*;
use coldstream::utils::{self, CollectObserver};

/// Observer that records every callback as a string, for asserting on
/// delivery order and terminal-signal discipline.
#[derive(Clone)]
struct Recording {
    events: Arc<StdMutex<Vec<String>>>,
}

impl Recording {
    fn new() -> Self {
        Self {
            events: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Observer for Recording {
    type Item = String;

    async fn on_next(&mut self, item: String) {
        self.events.lock().unwrap().push(format!("next:{item}"));
    }

    async fn on_error(&mut self, error: Error) {
        self.events.lock().unwrap().push(format!("error:{error}"));
    }

    async fn on_complete(&mut self) {
        self.events.lock().unwrap().push("complete".to_string());
    }
}

#[tokio::test]
async fn test_just_emits_once_and_completes() {
    let items = utils::collect(just("Hello World!")).await.unwrap();
    assert_eq!(items, vec!["Hello World!"]);
}

#[tokio::test]
async fn test_map() {
    let greeting = just("Hello".to_string()).map(|s| format!("{s} Ben!"));
    let items = utils::collect(greeting).await.unwrap();
    assert_eq!(items, vec!["Hello Ben!"]);
}

#[tokio::test]
async fn test_filter_then_map_preserves_order() {
    let labeled = from_iter(1..=6)
        .filter(|n| n % 2 == 0)
        .map(|n| format!("{n}-Even"));
    let items = utils::collect(labeled).await.unwrap();
    assert_eq!(items, vec!["2-Even", "4-Even", "6-Even"]);
}

#[tokio::test]
async fn test_empty_source() {
    let items = utils::collect(empty::<i32>()).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_take_stops_infinite_source() {
    let naturals = create(|emitter: Emitter<u64>| async move {
        let mut n = 0;
        loop {
            emitter.emit(n).await?;
            n += 1;
        }
    });

    let items = utils::collect(naturals.take(5)).await.unwrap();
    assert_eq!(items, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_concat_map_order_is_deterministic() {
    // The first inner sequence is slow; concat still yields it in full
    // before the second is even subscribed.
    let flattened = from_iter(vec![0u64, 1]).concat_map(|i| {
        create(move |emitter: Emitter<u64>| async move {
            if i == 0 {
                sleep(Duration::from_millis(30)).await;
            }
            emitter.emit(i * 10).await?;
            emitter.emit(i * 10 + 1).await?;
            Ok(())
        })
    });

    let items = utils::collect(flattened).await.unwrap();
    assert_eq!(items, vec![0, 1, 10, 11]);
}

#[tokio::test]
async fn test_flat_map_is_a_valid_interleaving() {
    let merged = from_iter(0usize..3).flat_map(|i| {
        create(move |emitter: Emitter<(usize, usize)>| async move {
            for k in 0..3 {
                sleep(Duration::from_millis(5)).await;
                emitter.emit((i, k)).await?;
            }
            Ok(())
        })
    });

    let items = utils::collect(merged).await.unwrap();
    assert_eq!(items.len(), 9);

    // Order within each inner sequence is preserved.
    for i in 0..3 {
        let ks: Vec<usize> = items.iter().filter(|(a, _)| *a == i).map(|(_, k)| *k).collect();
        assert_eq!(ks, vec![0, 1, 2]);
    }

    // Multiset equality with the expected items.
    let mut sorted = items.clone();
    sorted.sort();
    let expected: Vec<(usize, usize)> = (0..3).flat_map(|i| (0..3).map(move |k| (i, k))).collect();
    assert_eq!(sorted, expected);
}

#[tokio::test]
async fn test_flat_map_with_concurrency_one_matches_concat() {
    let flattened = from_iter(vec![0u64, 1])
        .flat_map(|i| {
            create(move |emitter: Emitter<u64>| async move {
                if i == 0 {
                    sleep(Duration::from_millis(20)).await;
                }
                emitter.emit(i * 10).await?;
                emitter.emit(i * 10 + 1).await?;
                Ok(())
            })
        })
        .with_concurrency(1);

    let items = utils::collect(flattened).await.unwrap();
    assert_eq!(items, vec![0, 1, 10, 11]);
}

#[tokio::test]
async fn test_flat_map_inner_error_terminates_everything() {
    let merged = from_iter(0i32..4).flat_map(|i| {
        create(move |emitter: Emitter<i32>| async move {
            if i == 2 {
                return Err(Error::custom("inner failed"));
            }
            emitter.emit(i).await?;
            sleep(Duration::from_millis(50)).await;
            emitter.emit(i + 100).await?;
            Ok(())
        })
    });

    let result = utils::collect(merged).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_reduce_max() {
    let max = from_iter(vec![3, 7, 4])
        .reduce(|max, item| if item > max { item } else { max })
        .value()
        .await
        .unwrap();
    assert_eq!(max, Some(7));
}

#[derive(Clone, Debug, PartialEq)]
struct BoxArt {
    width: u32,
    height: u32,
    url: String,
}

impl BoxArt {
    fn new(width: u32, height: u32, url: &str) -> Self {
        Self {
            width,
            height,
            url: url.to_string(),
        }
    }

    fn area(&self) -> u32 {
        self.width * self.height
    }
}

#[tokio::test]
async fn test_reduce_smallest_by_area_keeps_first_on_tie() {
    // Areas are [3, 4, 4, 3]; the comparator keeps the incumbent on ties,
    // so the first art with area 3 wins.
    let arts = vec![
        BoxArt::new(1, 3, "a"),
        BoxArt::new(2, 2, "b"),
        BoxArt::new(4, 1, "c"),
        BoxArt::new(3, 1, "d"),
    ];
    let smallest = from_iter(arts.clone())
        .reduce(|best, item| if item.area() < best.area() { item } else { best })
        .value()
        .await
        .unwrap();
    assert_eq!(smallest, Some(arts[0].clone()));
}

#[tokio::test]
async fn test_reduce_empty_source_yields_no_value() {
    let result = from_iter(Vec::<i32>::new())
        .reduce(|a, b| a.max(b))
        .value()
        .await
        .unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_reduce_upstream_error_fails_without_result() {
    let result = fail::<i32>(Error::custom("boom"))
        .reduce(|a, b| a.max(b))
        .value()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_fold_with_seed() {
    let sum = from_iter(1i64..=4)
        .fold(0i64, |acc, n| acc + n)
        .value()
        .await
        .unwrap();
    assert_eq!(sum, Some(10));
}

#[tokio::test]
async fn test_count() {
    let total = from_iter("hello".chars()).count().value().await.unwrap();
    assert_eq!(total, Some(5));
}

#[tokio::test]
async fn test_zip_pairs_in_order() {
    let a = from_iter(vec!["one", "two", "red", "blue"]);
    let b = from_iter(vec!["fish", "fish", "fish", "fish"]);
    let items = utils::collect(a.zip(b, |x, y| format!("{x} {y}"))).await.unwrap();
    assert_eq!(items, vec!["one fish", "two fish", "red fish", "blue fish"]);
}

#[tokio::test]
async fn test_zip_unequal_lengths_completes_at_shorter() {
    let a = from_iter(vec!["a", "b", "c"]);
    let b = from_iter(vec![1, 2, 3, 4]);
    let items = utils::collect(a.zip(b, |x, y| format!("{x}{y}"))).await.unwrap();
    assert_eq!(items, vec!["a1", "b2", "c3"]);
}

#[tokio::test]
async fn test_zip_completes_against_infinite_side() {
    let finite = from_iter(vec![10, 20]);
    let endless = create(|emitter: Emitter<u64>| async move {
        let mut n = 0;
        loop {
            emitter.emit(n).await?;
            n += 1;
        }
    });

    let items = utils::collect(finite.zip(endless, |x, y| (x, y))).await.unwrap();
    assert_eq!(items, vec![(10, 0), (20, 1)]);
}

#[tokio::test]
async fn test_zip_error_discards_buffered_values() {
    let a = from_iter(0..10);
    let b = fail::<i32>(Error::custom("right side broke"));
    let result = utils::collect(a.zip(b, |x, y| x + y)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_on_error_resume_next_keeps_prefix_then_falls_back() {
    let flaky = create(|emitter: Emitter<String>| async move {
        emitter.emit("a".to_string()).await?;
        emitter.emit("b".to_string()).await?;
        Err(Error::custom("flaked"))
    });

    let recovered = flaky.on_error_resume_next(just("default-value".to_string()));
    let observer = Recording::new();
    let handle = observer.clone();
    let outcome = recovered.subscribe(observer).join().await;

    assert_ok!(outcome);
    assert_eq!(
        handle.events(),
        vec!["next:a", "next:b", "next:default-value", "complete"]
    );
}

#[tokio::test]
async fn test_on_error_resume_next_skips_fallback_on_completion() {
    let touched = Arc::new(AtomicBool::new(false));
    let flag = touched.clone();
    let fallback = create(move |emitter: Emitter<i32>| {
        let flag = flag.clone();
        async move {
            flag.store(true, Ordering::SeqCst);
            emitter.emit(-1).await?;
            Ok(())
        }
    });

    let items = utils::collect(from_iter(vec![1, 2]).on_error_resume_next(fallback))
        .await
        .unwrap();
    assert_eq!(items, vec![1, 2]);
    assert!(!touched.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_on_error_resume_next_propagates_fallback_error() {
    let result = utils::collect(
        fail::<i32>(Error::custom("first")).on_error_resume_next(fail(Error::custom("second"))),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_retry_succeeds_on_third_attempt() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let flaky = create(move |emitter: Emitter<i32>| {
        let counter = counter.clone();
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            if attempt < 2 {
                return Err(Error::custom("transient"));
            }
            emitter.emit(1).await?;
            emitter.emit(2).await?;
            Ok(())
        }
    });

    let items = utils::collect(flaky.retry()).await.unwrap();
    assert_eq!(items, vec![1, 2]);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_limited_gives_up() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let broken = create(move |_emitter: Emitter<i32>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::custom("permanent"))
        }
    });

    let result = utils::collect(broken.retry_limited(2)).await;
    assert!(result.is_err());
    // Initial attempt plus two retries.
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_repeat_replays_cold_source() {
    let items = utils::collect(just(2).repeat(3)).await.unwrap();
    assert_eq!(items, vec![2, 2, 2]);
}

#[tokio::test]
async fn test_shared_observable_resubscribes_independently() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let source = Arc::new(create(move |emitter: Emitter<i32>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            for n in 1..=3 {
                emitter.emit(n).await?;
            }
            Ok(())
        }
    }));

    let first = utils::collect(source.clone()).await.unwrap();
    let second = utils::collect(source.clone()).await.unwrap();

    assert_eq!(first, vec![1, 2, 3]);
    assert_eq!(second, vec![1, 2, 3]);
    // Each subscription replayed the production logic from scratch.
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_terminal_error_is_delivered_exactly_once() {
    let flaky = create(|emitter: Emitter<String>| async move {
        emitter.emit("a".to_string()).await?;
        Err(Error::custom("broke"))
    });

    let observer = Recording::new();
    let handle = observer.clone();
    let outcome = flaky.subscribe(observer).join().await;

    assert!(outcome.is_err());
    let events = handle.events();
    assert_eq!(events[0], "next:a");
    let terminals = events
        .iter()
        .filter(|e| e.starts_with("error") || e.starts_with("complete"))
        .count();
    assert_eq!(terminals, 1);
    assert!(events.last().unwrap().starts_with("error"));
}

#[tokio::test]
async fn test_cancel_stops_delivery_without_terminal_signal() {
    let endless = create(|emitter: Emitter<String>| async move {
        let mut n = 0u64;
        loop {
            emitter.emit(n.to_string()).await?;
            n += 1;
            sleep(Duration::from_millis(5)).await;
        }
    });

    let observer = Recording::new();
    let handle = observer.clone();
    let subscription = endless.subscribe(observer);

    sleep(Duration::from_millis(40)).await;
    subscription.cancel();
    assert!(subscription.is_cancelled());

    let outcome = subscription.join().await;
    assert!(matches!(outcome, Err(e) if e.is_cancelled()));

    let events = handle.events();
    assert!(!events.is_empty());
    // No terminal callback after cancellation, and nothing trickles in late.
    assert!(events.iter().all(|e| e.starts_with("next")));
    sleep(Duration::from_millis(30)).await;
    assert_eq!(handle.events(), events);
}

#[tokio::test]
async fn test_cancellation_reaches_inner_subscriptions() {
    let emitted = Arc::new(AtomicUsize::new(0));
    let counter = emitted.clone();
    let merged = from_iter(0..4).flat_map(move |_| {
        let counter = counter.clone();
        create(move |emitter: Emitter<u64>| {
            let counter = counter.clone();
            async move {
                let mut n = 0;
                loop {
                    counter.fetch_add(1, Ordering::SeqCst);
                    emitter.emit(n).await?;
                    n += 1;
                    sleep(Duration::from_millis(5)).await;
                }
            }
        })
    });

    let subscription = merged.subscribe(CollectObserver::new());
    sleep(Duration::from_millis(30)).await;
    subscription.cancel();
    let _ = subscription.join().await;

    let seen = emitted.load(Ordering::SeqCst);
    sleep(Duration::from_millis(30)).await;
    // All inner producers stopped once the subscription was cancelled.
    assert_eq!(emitted.load(Ordering::SeqCst), seen);
}

#[tokio::test]
async fn test_panicking_transform_becomes_error_signal() {
    let cursed = from_iter(vec![1, 2]).map(|_: i32| -> i32 { panic!("boom") });
    let result = utils::collect(cursed).await;
    assert!(matches!(result, Err(Error::Fault(_))));
}

#[tokio::test]
async fn test_retry_recovers_from_transient_transform_fault() {
    // The fault is the map operator's own error signal, so a wrapping retry
    // resubscribes through it like any other failure.
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let source = from_iter(vec![1, 2]).map(move |n| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("transient transform fault");
        }
        n * 10
    });

    let items = utils::collect(source.retry_limited(3)).await.unwrap();
    assert_eq!(items, vec![10, 20]);
}

#[tokio::test]
async fn test_fallback_subscribed_after_transform_fault() {
    let cursed = from_iter(vec![1]).map(|_: i32| -> i32 { panic!("boom") });
    let items = utils::collect(cursed.on_error_resume_next(just(42)))
        .await
        .unwrap();
    assert_eq!(items, vec![42]);
}

#[tokio::test]
async fn test_cancel_stops_retry_loop() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let broken = create(move |_emitter: Emitter<i32>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(5)).await;
            Err(Error::custom("still down"))
        }
    });

    let subscription = broken.retry().subscribe(CollectObserver::new());
    let token = subscription.cancellation_token();
    sleep(Duration::from_millis(30)).await;
    subscription.cancel();
    assert!(token.is_cancelled());

    let outcome = subscription.join().await;
    assert!(matches!(outcome, Err(e) if e.is_cancelled()));

    // No further resubscription attempts once cancelled.
    let seen = attempts.load(Ordering::SeqCst);
    sleep(Duration::from_millis(30)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), seen);
}

#[tokio::test]
async fn test_subscribe_with_small_buffer_preserves_order() {
    let source = from_iter(0..50);
    let sink = CollectObserver::new();
    let items = sink.items();
    let config = SubscribeConfig::default().buffer_size(1);

    assert_ok!(source.subscribe_with(sink, config).join().await);
    let collected = items.lock().await;
    assert_eq!(*collected, (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_into_stream_yields_signals() {
    let stream = utils::into_stream(from_iter(vec![1, 2]));
    let signals: Vec<Signal<i32>> = stream.collect().await;

    assert_eq!(signals.len(), 3);
    assert!(matches!(signals[0], Signal::Next(1)));
    assert!(matches!(signals[1], Signal::Next(2)));
    assert!(matches!(signals[2], Signal::Complete));
    assert!(signals.iter().take(2).all(|s| !s.is_terminal()));
    assert!(signals[2].is_terminal());
}

#[tokio::test]
async fn test_observer_from_fn() {
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let sink = seen.clone();
    let observer = utils::observer_from_fn(move |item: i32| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(item);
        }
    });

    assert_ok!(from_iter(vec![1, 2, 3]).subscribe(observer).join().await);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_composed_exercise_end_to_end() {
    // Repeat even items three times, fail on the first odd item, recover by
    // doubling the whole sequence, then format.
    let formatted = from_iter(0..=6)
        .concat_map(|n| just(n).repeat(if n % 2 == 0 { 3 } else { 1 }))
        .concat_map(|n| {
            create(move |emitter: Emitter<i32>| async move {
                if n % 2 == 0 {
                    emitter.emit(n).await?;
                    Ok(())
                } else {
                    Err(Error::custom("odd element"))
                }
            })
        })
        .on_error_resume_next(from_iter(0..=6).map(|n| n * 2))
        .map(|n| format!("Integer : {n}"));

    let items = utils::collect(formatted).await.unwrap();
    let expected: Vec<String> = [0, 0, 0, 0, 2, 4, 6, 8, 10, 12]
        .iter()
        .map(|n| format!("Integer : {n}"))
        .collect();
    assert_eq!(items, expected);
}
