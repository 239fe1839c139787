//! Helper observers and interop glue.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use crate::core::{Observable, ObservableExt, Observer, Signal, SubscribeConfig};
use crate::error::{Error, Result};

/// Create an observer from a function applied to each item.
///
/// Terminal signals fall through to the default handlers.
pub fn observer_from_fn<F, Fut, T>(f: F) -> FnObserver<F, Fut, T>
where
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = ()> + Send,
    T: Send + 'static,
{
    FnObserver {
        f,
        _phantom: std::marker::PhantomData,
    }
}

/// An observer created from a function.
pub struct FnObserver<F, Fut, T>
where
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = ()> + Send,
    T: Send + 'static,
{
    f: F,
    _phantom: std::marker::PhantomData<(Fut, T)>,
}

#[async_trait]
impl<F, Fut, T> Observer for FnObserver<F, Fut, T>
where
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = ()> + Send,
    T: Send + 'static,
{
    type Item = T;

    async fn on_next(&mut self, item: Self::Item) {
        (self.f)(item).await
    }
}

/// An observer that collects every item into a shared vector.
///
/// Clone it before subscribing and read the items back through the clone
/// once the subscription has terminated.
pub struct CollectObserver<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> CollectObserver<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the collected items.
    pub fn items(&self) -> Arc<Mutex<Vec<T>>> {
        self.items.clone()
    }
}

impl<T> Default for CollectObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CollectObserver<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Observer for CollectObserver<T> {
    type Item = T;

    async fn on_next(&mut self, item: Self::Item) {
        self.items.lock().await.push(item);
    }
}

/// Subscribe to a finite observable and gather everything it emits.
///
/// Returns the items on completion, or the terminal error (items emitted
/// before the failure are dropped; use a [`CollectObserver`] directly if you
/// need them).
pub async fn collect<S>(source: S) -> Result<Vec<S::Item>>
where
    S: Observable + 'static,
{
    let sink = CollectObserver::new();
    let items = sink.items();
    source.subscribe(sink).join().await?;
    let mut collected = items.lock().await;
    Ok(std::mem::take(&mut *collected))
}

/// Bridge an observable into a [`tokio_stream`] stream of signals.
///
/// The subscription runs detached until its terminal signal; dropping the
/// stream early just discards the remaining signals.
pub fn into_stream<S>(source: S) -> ReceiverStream<Signal<S::Item>>
where
    S: Observable + 'static,
{
    let (tx, rx) = mpsc::channel(SubscribeConfig::default().buffer_size);
    source.subscribe(ForwardObserver { tx });
    ReceiverStream::new(rx)
}

struct ForwardObserver<T> {
    tx: mpsc::Sender<Signal<T>>,
}

#[async_trait]
impl<T: Send + 'static> Observer for ForwardObserver<T> {
    type Item = T;

    async fn on_next(&mut self, item: Self::Item) {
        let _ = self.tx.send(Signal::Next(item)).await;
    }

    async fn on_error(&mut self, error: Error) {
        let _ = self.tx.send(Signal::Error(error)).await;
    }

    async fn on_complete(&mut self) {
        let _ = self.tx.send(Signal::Complete).await;
    }
}
