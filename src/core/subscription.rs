//! One live consumption of an observable.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::emitter::Emitter;
use crate::core::observable::Observable;
use crate::core::observer::{Observer, Signal};
use crate::error::{Error, Result};

/// Configuration for one subscription.
#[derive(Clone)]
pub struct SubscribeConfig {
    /// Capacity of the delivery channel between producer and observer.
    /// Producers block on `emit` once this many items are in flight.
    pub buffer_size: usize,
}

impl SubscribeConfig {
    /// Set the delivery channel capacity.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

impl Default for SubscribeConfig {
    fn default() -> Self {
        Self { buffer_size: 64 }
    }
}

/// A handle to one active subscription.
///
/// The subscription owns the cancellation token and the two driver tasks:
/// a supervisor that runs the production logic and converts its outcome
/// (return value or panic) into the single terminal signal, and a delivery
/// task that invokes the observer callbacks strictly sequentially.
///
/// Dropping a `Subscription` detaches it; production continues in the
/// background. Call [`cancel`](Subscription::cancel) to stop it.
pub struct Subscription {
    token: CancellationToken,
    supervisor: JoinHandle<()>,
    delivery: JoinHandle<Result<()>>,
}

impl Subscription {
    pub(crate) fn spawn<S, O>(source: S, observer: O, config: SubscribeConfig) -> Subscription
    where
        S: Observable + 'static,
        O: Observer<Item = S::Item> + 'static,
    {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(config.buffer_size.max(1));
        let emitter = Emitter::new(tx.clone(), token.clone());

        tracing::debug!(buffer_size = config.buffer_size, "subscription started");

        let supervisor = tokio::spawn(Self::supervise(source, emitter, tx, token.clone()));
        let delivery = tokio::spawn(Self::deliver(observer, rx, token.clone()));

        Subscription {
            token,
            supervisor,
            delivery,
        }
    }

    /// Run the production future on its own task and translate its outcome
    /// into the terminal signal. Operators trap panics in user-supplied
    /// functions themselves; a panic anywhere else in production still
    /// surfaces here as a join error and becomes a terminal [`Error::Fault`]
    /// instead of unwinding further.
    async fn supervise<S: Observable + 'static>(
        source: S,
        emitter: Emitter<S::Item>,
        tx: mpsc::Sender<Signal<S::Item>>,
        token: CancellationToken,
    ) {
        let mut work = tokio::spawn(async move { source.produce(emitter).await });

        let terminal = tokio::select! {
            _ = token.cancelled() => {
                work.abort();
                None
            }
            finished = &mut work => match finished {
                Ok(Ok(())) => Some(Signal::Complete),
                Ok(Err(e)) if e.is_cancelled() => None,
                Ok(Err(e)) => Some(Signal::Error(e)),
                Err(join_err) if join_err.is_cancelled() => None,
                Err(join_err) => Some(Signal::Error(Error::fault(join_err.to_string()))),
            },
        };

        match terminal {
            Some(signal) => {
                if tx.send(signal).await.is_err() {
                    tracing::trace!("consumer gone before terminal delivery");
                }
            }
            None => tracing::debug!("subscription cancelled before terminal signal"),
        }
    }

    /// Single-writer delivery loop: the only place observer callbacks run.
    async fn deliver<O: Observer>(
        mut observer: O,
        mut rx: mpsc::Receiver<Signal<O::Item>>,
        token: CancellationToken,
    ) -> Result<()> {
        loop {
            let signal = tokio::select! {
                _ = token.cancelled() => return Err(Error::Cancelled),
                received = rx.recv() => match received {
                    Some(signal) => signal,
                    None => return Err(Error::Cancelled),
                },
            };

            match signal {
                Signal::Next(item) => observer.on_next(item).await,
                Signal::Error(error) => {
                    observer.on_error(error.clone()).await;
                    return Err(error);
                }
                Signal::Complete => {
                    observer.on_complete().await;
                    return Ok(());
                }
            }
        }
    }

    /// Request cancellation: no further signals are delivered once the
    /// cancellation is observed, and production is aborted promptly.
    /// Idempotent.
    pub fn cancel(&self) {
        tracing::debug!("subscription cancelled");
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A token that is cancelled together with this subscription.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the terminal outcome: `Ok(())` after completion, the terminal
    /// error after a failure, or [`Error::Cancelled`].
    pub async fn join(self) -> Result<()> {
        let outcome = match self.delivery.await {
            Ok(result) => result,
            Err(join_err) => Err(Error::fault(join_err.to_string())),
        };
        // The supervisor finishes right after the terminal signal; reap it so
        // nothing lingers past join().
        let _ = self.supervisor.await;
        outcome
    }
}
