//! Factory observables: the leaves every operator chain starts from.
//!
//! All of these are cold: the production logic re-runs in full for each
//! subscription, so the same instance can be subscribed any number of times.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::core::{Emitter, Observable};
use crate::error::{Error, Result};

/// An observable that emits exactly one value, then completes.
pub fn just<T>(value: T) -> Just<T>
where
    T: Clone + Send + Sync + 'static,
{
    Just { value }
}

pub struct Just<T> {
    value: T,
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Observable for Just<T> {
    type Item = T;

    async fn produce(&self, emitter: Emitter<T>) -> Result<()> {
        emitter.emit(self.value.clone()).await?;
        Ok(())
    }
}

/// An observable that completes immediately without emitting.
pub fn empty<T: Send + 'static>() -> Empty<T> {
    Empty {
        _marker: PhantomData,
    }
}

pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: Send + 'static> Observable for Empty<T> {
    type Item = T;

    async fn produce(&self, _emitter: Emitter<T>) -> Result<()> {
        Ok(())
    }
}

/// An observable that fails immediately with `error`.
pub fn fail<T: Send + 'static>(error: Error) -> Fail<T> {
    Fail {
        error,
        _marker: PhantomData,
    }
}

pub struct Fail<T> {
    error: Error,
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: Send + 'static> Observable for Fail<T> {
    type Item = T;

    async fn produce(&self, _emitter: Emitter<T>) -> Result<()> {
        Err(self.error.clone())
    }
}

/// A cold sequence over a cloneable iterable.
///
/// The iterable is cloned per subscription, which is what makes re-emission
/// from the start possible.
///
/// # Examples
///
/// ```rust
/// use coldstream::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> coldstream::Result<()> {
/// let evens = from_iter(1..=6).filter(|n| n % 2 == 0);
/// assert_eq!(coldstream::utils::collect(evens).await?, vec![2, 4, 6]);
/// # Ok(())
/// # }
/// ```
pub fn from_iter<I>(iterable: I) -> FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    FromIter { iterable }
}

pub struct FromIter<I> {
    iterable: I,
}

#[async_trait]
impl<I> Observable for FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    type Item = I::Item;

    async fn produce(&self, emitter: Emitter<I::Item>) -> Result<()> {
        for item in self.iterable.clone() {
            emitter.emit(item).await?;
        }
        Ok(())
    }
}

/// Build an observable from an async closure over the [`Emitter`].
///
/// The closure is the production logic: it runs once per subscription, emits
/// through the handle it is given, and its return value is the terminal
/// outcome.
///
/// # Examples
///
/// ```rust
/// use coldstream::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> coldstream::Result<()> {
/// let squares = create(|emitter: Emitter<u32>| async move {
///     for n in 1..=3 {
///         emitter.emit(n * n).await?;
///     }
///     Ok(())
/// });
/// assert_eq!(coldstream::utils::collect(squares).await?, vec![1, 4, 9]);
/// # Ok(())
/// # }
/// ```
pub fn create<T, F, Fut>(f: F) -> Create<F, T>
where
    T: Send + 'static,
    F: Fn(Emitter<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    Create {
        f,
        _marker: PhantomData,
    }
}

pub struct Create<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T, F, Fut> Observable for Create<F, T>
where
    T: Send + 'static,
    F: Fn(Emitter<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    type Item = T;

    async fn produce(&self, emitter: Emitter<T>) -> Result<()> {
        (self.f)(emitter).await
    }
}
