//! Producer-side emission handle and the internal upstream pull loop.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::observer::Signal;
use crate::error::{Error, Result};

/// The handle through which a producer pushes items downstream.
///
/// An emitter is bound to one subscription (or to one scope inside an
/// operator, via a child cancellation token). `emit` fails with
/// [`Error::Cancelled`] once the subscription is cancelled or the consumer is
/// gone, which is how cancellation propagates back into production loops.
///
/// Producers never send terminal signals themselves: returning from
/// [`Observable::produce`](crate::core::Observable::produce) is the terminal
/// event, and the subscription driver translates the returned `Result` into
/// the single terminal signal.
pub struct Emitter<T> {
    tx: mpsc::Sender<Signal<T>>,
    token: CancellationToken,
}

impl<T: Send + 'static> Emitter<T> {
    pub(crate) fn new(tx: mpsc::Sender<Signal<T>>, token: CancellationToken) -> Self {
        Self { tx, token }
    }

    /// Push the next item downstream, waiting if the channel is at capacity.
    pub async fn emit(&self, item: T) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            _ = self.token.cancelled() => Err(Error::Cancelled),
            sent = self.tx.send(Signal::Next(item)) => sent.map_err(|_| Error::Cancelled),
        }
    }

    /// The cancellation token scoping this emitter.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the subscription behind this emitter has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Same channel, different cancellation scope. Used by flattening
    /// operators to hand inner producers a token they can revoke without
    /// touching the whole subscription.
    pub(crate) fn with_token(&self, token: CancellationToken) -> Self {
        Self {
            tx: self.tx.clone(),
            token,
        }
    }
}

// Manual impl: T itself need not be Clone.
impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            token: self.token.clone(),
        }
    }
}

/// Drives an upstream production future on the current task while yielding
/// the items it emits, one at a time.
///
/// Operators run their upstream as a locally pinned future feeding a bounded
/// channel; `next` polls both. If the upstream finishes with an error, any
/// items it emitted beforehand are still drained first, so downstream sees
/// items in order followed by the failure.
pub(crate) struct Pull<'a, F, T> {
    upstream: Pin<&'a mut F>,
    rx: mpsc::Receiver<Signal<T>>,
    done: Option<Result<()>>,
}

impl<'a, F, T> Pull<'a, F, T>
where
    F: Future<Output = Result<()>>,
    T: Send + 'static,
{
    pub(crate) fn new(upstream: Pin<&'a mut F>, rx: mpsc::Receiver<Signal<T>>) -> Self {
        Self {
            upstream,
            rx,
            done: None,
        }
    }

    /// The next upstream item, `Ok(None)` on completion, or the upstream
    /// error once all earlier items have been handed out.
    ///
    /// Cancel-safe: losing the race in an enclosing `select!` cannot drop an
    /// item, because all state lives in `self` and `recv` is cancel-safe.
    pub(crate) async fn next(&mut self) -> Result<Option<T>> {
        let Self { upstream, rx, done } = self;
        loop {
            tokio::select! {
                biased;
                signal = rx.recv() => match signal {
                    Some(Signal::Next(item)) => return Ok(Some(item)),
                    // Emitters only ever send Next; terminal signals travel
                    // out of band as the production future's return value.
                    Some(_) => continue,
                    None => {
                        return match done.take() {
                            Some(Err(e)) => Err(e),
                            _ => Ok(None),
                        };
                    }
                },
                finished = upstream.as_mut(), if done.is_none() => {
                    *done = Some(finished);
                }
            }
        }
    }
}
