//! The consumer-side capability set.

use async_trait::async_trait;

use crate::error::Error;

/// A single notification travelling from a producer to a subscription.
///
/// Exactly one terminal signal (`Error` or `Complete`) is delivered per
/// subscription, and no `Next` follows it.
#[derive(Debug, Clone)]
pub enum Signal<T> {
    /// The next item in the sequence
    Next(T),
    /// The sequence failed; no further signals follow
    Error(Error),
    /// The sequence completed normally; no further signals follow
    Complete,
}

impl<T> Signal<T> {
    /// Whether this signal ends the subscription.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }
}

/// A consumer of an observable sequence.
///
/// Callbacks for one subscription are never invoked concurrently: delivery is
/// driven by a single task, so `on_next` calls are strictly sequential and a
/// terminal callback is the last call the observer ever receives.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use coldstream::core::Observer;
///
/// struct Printer;
///
/// #[async_trait]
/// impl Observer for Printer {
///     type Item = String;
///
///     async fn on_next(&mut self, item: String) {
///         println!("{item}");
///     }
/// }
/// ```
#[async_trait]
pub trait Observer: Send {
    /// The type of items this observer accepts
    type Item: Send + 'static;

    /// Receive the next item.
    async fn on_next(&mut self, item: Self::Item);

    /// Receive the terminal error signal.
    async fn on_error(&mut self, error: Error) {
        tracing::debug!(%error, "unhandled error signal");
    }

    /// Receive the terminal completion signal.
    async fn on_complete(&mut self) {}
}
