//! Recovering from an intermittent source with retry and a fallback value.
//!
//! Run with: cargo run --example flaky

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coldstream::prelude::*;
use coldstream::utils;

#[tokio::main]
async fn main() -> coldstream::Result<()> {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    // Fails on its first two subscriptions, then delivers three readings.
    let feed = create(move |emitter: Emitter<String>| {
        let counter = counter.clone();
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            println!("subscribing to feed (attempt {})", attempt + 1);
            if attempt < 2 {
                return Err(Error::custom("feed unavailable"));
            }
            for reading in ["42.1", "42.3", "41.9"] {
                emitter.emit(reading.to_string()).await?;
            }
            Ok(())
        }
    });

    let resilient = feed
        .retry_limited(5)
        .on_error_resume_next(just("default-value".to_string()));

    let printer = utils::observer_from_fn(|reading: String| async move {
        println!("reading: {reading}");
    });

    resilient.subscribe(printer).join().await?;
    println!("feed drained after {} attempts", attempts.load(Ordering::SeqCst));
    Ok(())
}
