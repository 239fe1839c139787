//! Flattening operators: concurrent merge and strict concatenation.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::core::{Emitter, Observable, Pull};
use crate::error::{Error, Result};
use crate::operators::{trap_fault, OPERATOR_BUFFER};

/// Maps each outer item to an inner observable and merges the inner
/// sequences concurrently.
///
/// Every inner observable runs on its own task; all of them emit into the
/// single downstream channel, so delivery stays serialized even while
/// production interleaves. The operator completes only once the outer source
/// and every inner sequence have completed. Any error, outer or inner,
/// terminates the whole thing: remaining inner tasks are aborted and the
/// scoped token is cancelled.
pub struct FlatMap<S, F> {
    source: S,
    f: F,
    limit: Option<usize>,
}

impl<S, F> FlatMap<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Self {
            source,
            f,
            limit: None,
        }
    }

    /// Cap the number of concurrently running inner observables. A limit of
    /// 1 degenerates to `concat_map` ordering.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.limit = Some(limit.max(1));
        self
    }
}

#[async_trait]
impl<S, F, S2> Observable for FlatMap<S, F>
where
    S: Observable,
    F: Fn(S::Item) -> S2 + Send + Sync,
    S2: Observable + 'static,
{
    type Item = S2::Item;

    async fn produce(&self, emitter: Emitter<S2::Item>) -> Result<()> {
        let guard = emitter.token().child_token();
        let (tx, rx) = mpsc::channel(OPERATOR_BUFFER);
        let outer = self.source.produce(Emitter::new(tx, guard.clone()));
        tokio::pin!(outer);
        let mut pull = Pull::new(outer, rx);

        let mut inners: JoinSet<Result<()>> = JoinSet::new();
        let mut outer_done = false;

        let result = loop {
            if outer_done && inners.is_empty() {
                break Ok(());
            }

            let idle = inners.is_empty();
            let capacity = self.limit.map_or(true, |limit| inners.len() < limit);

            tokio::select! {
                joined = inners.join_next(), if !idle => match joined {
                    Some(Ok(Ok(()))) => {}
                    Some(Ok(Err(e))) => break Err(e),
                    Some(Err(join_err)) => break Err(Error::fault(join_err.to_string())),
                    None => {}
                },
                item = pull.next(), if !outer_done && capacity => match item {
                    Ok(Some(value)) => match trap_fault(|| (self.f)(value)) {
                        Ok(inner) => {
                            let downstream = emitter.with_token(guard.clone());
                            inners.spawn(async move { inner.produce(downstream).await });
                        }
                        Err(e) => break Err(e),
                    },
                    Ok(None) => outer_done = true,
                    Err(e) => break Err(e),
                },
            }
        };

        // Dropping the JoinSet aborts whatever is still running; cancelling
        // the scoped token makes in-flight emits fail fast.
        guard.cancel();
        result
    }
}

/// Maps each outer item to an inner observable and flattens them strictly
/// one at a time: the next inner is subscribed only after the previous one
/// completed, so all items of inner *i* precede all items of inner *i + 1*.
pub struct ConcatMap<S, F> {
    source: S,
    f: F,
}

impl<S, F> ConcatMap<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Self { source, f }
    }
}

#[async_trait]
impl<S, F, S2> Observable for ConcatMap<S, F>
where
    S: Observable,
    F: Fn(S::Item) -> S2 + Send + Sync,
    S2: Observable + 'static,
{
    type Item = S2::Item;

    async fn produce(&self, emitter: Emitter<S2::Item>) -> Result<()> {
        let (tx, rx) = mpsc::channel(OPERATOR_BUFFER);
        let outer = self.source.produce(Emitter::new(tx, emitter.token().clone()));
        tokio::pin!(outer);
        let mut pull = Pull::new(outer, rx);

        // The outer source runs ahead only as far as the channel buffer
        // allows while an inner sequence is draining.
        while let Some(value) = pull.next().await? {
            let inner = trap_fault(|| (self.f)(value))?;
            inner.produce(emitter.clone()).await?;
        }
        Ok(())
    }
}
