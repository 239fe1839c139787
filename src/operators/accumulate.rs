//! Reduction operators and the at-most-one-value wrapper.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::{Emitter, Observable, Pull};
use crate::error::Result;
use crate::operators::{trap_fault, OPERATOR_BUFFER};

/// An observable restricted to at most one value followed by completion.
///
/// This is the result shape of the reduction operators: zero values means
/// the source was empty (clean completion, no error), one value is the
/// accumulated result. It composes like any other observable, or the single
/// value can be extracted with [`value`](Maybe::value).
pub struct Maybe<S> {
    source: S,
}

impl<S> Maybe<S> {
    pub(crate) fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S> Maybe<S>
where
    S: Observable + 'static,
{
    /// Run the sequence to its terminal signal and return the value, if any.
    pub async fn value(self) -> Result<Option<S::Item>> {
        let items = crate::utils::collect(self.source).await?;
        Ok(items.into_iter().next())
    }
}

#[async_trait]
impl<S: Observable> Observable for Maybe<S> {
    type Item = S::Item;

    async fn produce(&self, emitter: Emitter<S::Item>) -> Result<()> {
        self.source.produce(emitter).await
    }
}

/// Accumulates all items with a binary function, seeding from the first
/// item. Tie-breaking and ordering policy live entirely in the accumulator.
pub struct Reduce<S, F> {
    source: S,
    f: F,
}

impl<S, F> Reduce<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Self { source, f }
    }
}

#[async_trait]
impl<S, F> Observable for Reduce<S, F>
where
    S: Observable,
    F: Fn(S::Item, S::Item) -> S::Item + Send + Sync,
{
    type Item = S::Item;

    async fn produce(&self, emitter: Emitter<S::Item>) -> Result<()> {
        let (tx, rx) = mpsc::channel(OPERATOR_BUFFER);
        let upstream = self.source.produce(Emitter::new(tx, emitter.token().clone()));
        tokio::pin!(upstream);
        let mut pull = Pull::new(upstream, rx);

        let mut acc: Option<S::Item> = None;
        while let Some(item) = pull.next().await? {
            acc = Some(match acc.take() {
                Some(previous) => trap_fault(|| (self.f)(previous, item))?,
                None => item,
            });
        }

        // An empty source yields no value, just clean completion.
        if let Some(result) = acc {
            emitter.emit(result).await?;
        }
        Ok(())
    }
}

/// Seeded accumulation: always yields exactly one value.
pub struct Fold<S, A, F> {
    source: S,
    seed: A,
    f: F,
}

impl<S, A, F> Fold<S, A, F> {
    pub(crate) fn new(source: S, seed: A, f: F) -> Self {
        Self { source, seed, f }
    }
}

#[async_trait]
impl<S, A, F> Observable for Fold<S, A, F>
where
    S: Observable,
    A: Clone + Send + Sync + 'static,
    F: Fn(A, S::Item) -> A + Send + Sync,
{
    type Item = A;

    async fn produce(&self, emitter: Emitter<A>) -> Result<()> {
        let (tx, rx) = mpsc::channel(OPERATOR_BUFFER);
        let upstream = self.source.produce(Emitter::new(tx, emitter.token().clone()));
        tokio::pin!(upstream);
        let mut pull = Pull::new(upstream, rx);

        let mut acc = self.seed.clone();
        while let Some(item) = pull.next().await? {
            acc = trap_fault(|| (self.f)(acc, item))?;
        }
        emitter.emit(acc).await?;
        Ok(())
    }
}

/// Counts the items in the sequence.
pub struct Count<S> {
    source: S,
}

impl<S> Count<S> {
    pub(crate) fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: Observable> Observable for Count<S> {
    type Item = u64;

    async fn produce(&self, emitter: Emitter<u64>) -> Result<()> {
        let (tx, rx) = mpsc::channel(OPERATOR_BUFFER);
        let upstream = self.source.produce(Emitter::new(tx, emitter.token().clone()));
        tokio::pin!(upstream);
        let mut pull = Pull::new(upstream, rx);

        let mut total: u64 = 0;
        while pull.next().await?.is_some() {
            total += 1;
        }
        emitter.emit(total).await?;
        Ok(())
    }
}
