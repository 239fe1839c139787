//! The cold sequence abstraction and its operator entry points.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::emitter::Emitter;
use crate::core::observer::Observer;
use crate::core::subscription::{SubscribeConfig, Subscription};
use crate::error::Result;
use crate::operators::{
    ConcatMap, Count, Filter, FlatMap, Fold, Map, Maybe, OnErrorResumeNext, Reduce, Repeat, Retry,
    Take, Zip,
};

/// A cold, lazy description of how to produce a sequence of items.
///
/// An observable owns no running state: every call to `produce` is one
/// independent execution of the production logic, which is what makes a
/// single instance re-subscribable. Items are pushed through the [`Emitter`];
/// returning `Ok(())` completes the sequence and returning an error fails it.
/// The subscription driver turns that return value into the single terminal
/// signal, so producers cannot violate the at-most-one-terminal invariant.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use coldstream::core::{Emitter, Observable};
/// use coldstream::Result;
///
/// struct Countdown {
///     from: u32,
/// }
///
/// #[async_trait]
/// impl Observable for Countdown {
///     type Item = u32;
///
///     async fn produce(&self, emitter: Emitter<u32>) -> Result<()> {
///         for n in (1..=self.from).rev() {
///             emitter.emit(n).await?;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Observable: Send + Sync {
    /// The type of items this observable emits
    type Item: Send + 'static;

    /// Run one full production of the sequence, pushing items through
    /// `emitter` until completion, error, or cancellation.
    async fn produce(&self, emitter: Emitter<Self::Item>) -> Result<()>;
}

// A shared observable is itself an observable, which is how one instance
// backs several concurrent, independent subscriptions.
#[async_trait]
impl<S: Observable> Observable for Arc<S> {
    type Item = S::Item;

    async fn produce(&self, emitter: Emitter<Self::Item>) -> Result<()> {
        self.as_ref().produce(emitter).await
    }
}

/// Operator constructors and the subscribe entry point.
///
/// Construction is pure: each method wraps `self` in an operator struct that
/// owns its upstream, and nothing runs until the chain is subscribed.
pub trait ObservableExt: Observable + Sized {
    /// Transform every item with `f`.
    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        F: Fn(Self::Item) -> U + Send + Sync,
        U: Send + 'static,
    {
        Map::new(self, f)
    }

    /// Keep only items for which `predicate` holds.
    fn filter<F>(self, predicate: F) -> Filter<Self, F>
    where
        F: Fn(&Self::Item) -> bool + Send + Sync,
    {
        Filter::new(self, predicate)
    }

    /// Emit the first `count` items, then complete and release the upstream.
    fn take(self, count: usize) -> Take<Self> {
        Take::new(self, count)
    }

    /// Map each item to an inner observable and flatten them concurrently.
    ///
    /// Inner sequences may interleave in arrival order; concurrency is
    /// unbounded unless capped with [`FlatMap::with_concurrency`].
    fn flat_map<F, S2>(self, f: F) -> FlatMap<Self, F>
    where
        F: Fn(Self::Item) -> S2 + Send + Sync,
        S2: Observable + 'static,
    {
        FlatMap::new(self, f)
    }

    /// Map each item to an inner observable and flatten them strictly one at
    /// a time, preserving full source order.
    fn concat_map<F, S2>(self, f: F) -> ConcatMap<Self, F>
    where
        F: Fn(Self::Item) -> S2 + Send + Sync,
        S2: Observable + 'static,
    {
        ConcatMap::new(self, f)
    }

    /// Accumulate all items into at most one result, seeding the accumulator
    /// with the first item. An empty source yields an empty [`Maybe`].
    fn reduce<F>(self, f: F) -> Maybe<Reduce<Self, F>>
    where
        F: Fn(Self::Item, Self::Item) -> Self::Item + Send + Sync,
    {
        Maybe::new(Reduce::new(self, f))
    }

    /// Accumulate all items starting from `seed`; always yields one result.
    fn fold<A, F>(self, seed: A, f: F) -> Maybe<Fold<Self, A, F>>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, Self::Item) -> A + Send + Sync,
    {
        Maybe::new(Fold::new(self, seed, f))
    }

    /// Count the items in the sequence.
    fn count(self) -> Maybe<Count<Self>> {
        Maybe::new(Count::new(self))
    }

    /// Pair the n-th item of `self` with the n-th item of `other`.
    fn zip<S2, F, C>(self, other: S2, combine: F) -> Zip<Self, S2, F>
    where
        S2: Observable,
        F: Fn(Self::Item, S2::Item) -> C + Send + Sync,
        C: Send + 'static,
    {
        Zip::new(self, other, combine)
    }

    /// On error, switch to `fallback`; on clean completion, never touch it.
    fn on_error_resume_next<S2>(self, fallback: S2) -> OnErrorResumeNext<Self, S2>
    where
        S2: Observable<Item = Self::Item>,
    {
        OnErrorResumeNext::new(self, fallback)
    }

    /// On error, resubscribe to the source from scratch, indefinitely.
    ///
    /// A source that fails permanently will be retried forever; use
    /// [`retry_limited`](ObservableExt::retry_limited) to cap attempts.
    fn retry(self) -> Retry<Self> {
        Retry::new(self, None)
    }

    /// On error, resubscribe up to `retries` times, then propagate the last
    /// error.
    fn retry_limited(self, retries: usize) -> Retry<Self> {
        Retry::new(self, Some(retries))
    }

    /// Replay the cold source `times` times, back to back.
    fn repeat(self, times: usize) -> Repeat<Self> {
        Repeat::new(self, times)
    }

    /// Begin production, delivering signals to `observer`.
    ///
    /// Non-blocking: the producer and delivery tasks are spawned onto the
    /// current tokio runtime and a [`Subscription`] handle is returned
    /// immediately.
    fn subscribe<O>(self, observer: O) -> Subscription
    where
        Self: 'static,
        O: Observer<Item = Self::Item> + 'static,
    {
        self.subscribe_with(observer, SubscribeConfig::default())
    }

    /// [`subscribe`](ObservableExt::subscribe) with an explicit configuration.
    fn subscribe_with<O>(self, observer: O, config: SubscribeConfig) -> Subscription
    where
        Self: 'static,
        O: Observer<Item = Self::Item> + 'static,
    {
        Subscription::spawn(self, observer, config)
    }
}

impl<S: Observable> ObservableExt for S {}
