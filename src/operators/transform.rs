//! Item-wise operators: map, filter, take.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::{Emitter, Observable, Pull};
use crate::error::Result;
use crate::operators::{trap_fault, OPERATOR_BUFFER};

/// Transforms every upstream item with a function. See
/// [`ObservableExt::map`](crate::core::ObservableExt::map).
pub struct Map<S, F> {
    source: S,
    f: F,
}

impl<S, F> Map<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Self { source, f }
    }
}

#[async_trait]
impl<S, F, U> Observable for Map<S, F>
where
    S: Observable,
    F: Fn(S::Item) -> U + Send + Sync,
    U: Send + 'static,
{
    type Item = U;

    async fn produce(&self, emitter: Emitter<U>) -> Result<()> {
        let (tx, rx) = mpsc::channel(OPERATOR_BUFFER);
        let upstream = self.source.produce(Emitter::new(tx, emitter.token().clone()));
        tokio::pin!(upstream);
        let mut pull = Pull::new(upstream, rx);

        while let Some(item) = pull.next().await? {
            let mapped = trap_fault(|| (self.f)(item))?;
            emitter.emit(mapped).await?;
        }
        Ok(())
    }
}

/// Forwards only items matching a predicate, in upstream order.
pub struct Filter<S, F> {
    source: S,
    predicate: F,
}

impl<S, F> Filter<S, F> {
    pub(crate) fn new(source: S, predicate: F) -> Self {
        Self { source, predicate }
    }
}

#[async_trait]
impl<S, F> Observable for Filter<S, F>
where
    S: Observable,
    F: Fn(&S::Item) -> bool + Send + Sync,
{
    type Item = S::Item;

    async fn produce(&self, emitter: Emitter<S::Item>) -> Result<()> {
        let (tx, rx) = mpsc::channel(OPERATOR_BUFFER);
        let upstream = self.source.produce(Emitter::new(tx, emitter.token().clone()));
        tokio::pin!(upstream);
        let mut pull = Pull::new(upstream, rx);

        while let Some(item) = pull.next().await? {
            if trap_fault(|| (self.predicate)(&item))? {
                emitter.emit(item).await?;
            }
        }
        Ok(())
    }
}

/// Emits the first `count` items, then completes and cancels the upstream.
pub struct Take<S> {
    source: S,
    count: usize,
}

impl<S> Take<S> {
    pub(crate) fn new(source: S, count: usize) -> Self {
        Self { source, count }
    }
}

#[async_trait]
impl<S: Observable> Observable for Take<S> {
    type Item = S::Item;

    async fn produce(&self, emitter: Emitter<S::Item>) -> Result<()> {
        if self.count == 0 {
            return Ok(());
        }

        // Child token: once the quota is met the upstream is revoked even
        // though the subscription itself lives on.
        let guard = emitter.token().child_token();
        let (tx, rx) = mpsc::channel(OPERATOR_BUFFER);
        let upstream = self.source.produce(Emitter::new(tx, guard.clone()));
        tokio::pin!(upstream);
        let mut pull = Pull::new(upstream, rx);

        let mut remaining = self.count;
        let result = loop {
            match pull.next().await {
                Ok(Some(item)) => {
                    if let Err(e) = emitter.emit(item).await {
                        break Err(e);
                    }
                    remaining -= 1;
                    if remaining == 0 {
                        break Ok(());
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        guard.cancel();
        result
    }
}
