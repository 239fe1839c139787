//! Error recovery operators: fallback, retry, and cold replay.

use async_trait::async_trait;

use crate::core::{Emitter, Observable};
use crate::error::Result;

/// Switches to a fallback sequence if and only if the source errors.
///
/// Items the source emitted before failing are preserved; the fallback then
/// continues the same downstream sequence. A clean completion never touches
/// the fallback, and a failing fallback propagates its own error, so at most
/// one recovery happens per subscription.
pub struct OnErrorResumeNext<S, S2> {
    source: S,
    fallback: S2,
}

impl<S, S2> OnErrorResumeNext<S, S2> {
    pub(crate) fn new(source: S, fallback: S2) -> Self {
        Self { source, fallback }
    }
}

#[async_trait]
impl<S, S2> Observable for OnErrorResumeNext<S, S2>
where
    S: Observable,
    S2: Observable<Item = S::Item>,
{
    type Item = S::Item;

    async fn produce(&self, emitter: Emitter<S::Item>) -> Result<()> {
        match self.source.produce(emitter.clone()).await {
            Err(error) if !error.is_cancelled() => {
                tracing::debug!(%error, "source failed, resuming with fallback");
                self.fallback.produce(emitter).await
            }
            outcome => outcome,
        }
    }
}

/// Resubscribes to the cold source from scratch whenever it errors.
///
/// Each attempt replays the production logic in full, so items a failed
/// attempt emitted before its error are passed through again by the next
/// attempt if the source re-emits them. Completion is forwarded without
/// retrying; cancellation stops the retry loop.
pub struct Retry<S> {
    source: S,
    limit: Option<usize>,
}

impl<S> Retry<S> {
    pub(crate) fn new(source: S, limit: Option<usize>) -> Self {
        Self { source, limit }
    }
}

#[async_trait]
impl<S: Observable> Observable for Retry<S> {
    type Item = S::Item;

    async fn produce(&self, emitter: Emitter<S::Item>) -> Result<()> {
        let mut attempt: usize = 0;
        loop {
            match self.source.produce(emitter.clone()).await {
                Ok(()) => return Ok(()),
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => {
                    attempt += 1;
                    if let Some(limit) = self.limit {
                        if attempt > limit {
                            return Err(error);
                        }
                    }
                    tracing::debug!(attempt, %error, "resubscribing to source after error");
                }
            }
        }
    }
}

/// Replays the cold source a fixed number of times, back to back.
pub struct Repeat<S> {
    source: S,
    times: usize,
}

impl<S> Repeat<S> {
    pub(crate) fn new(source: S, times: usize) -> Self {
        Self { source, times }
    }
}

#[async_trait]
impl<S: Observable> Observable for Repeat<S> {
    type Item = S::Item;

    async fn produce(&self, emitter: Emitter<S::Item>) -> Result<()> {
        for _ in 0..self.times {
            self.source.produce(emitter.clone()).await?;
        }
        Ok(())
    }
}
