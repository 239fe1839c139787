//! # Cold Observable Engine
//!
//! This crate provides a minimal, cancellable reactive stream engine: a cold,
//! lazy, re-subscribable sequence abstraction with explicit completion and
//! error signaling, plus the classic operator set built on top of it.
//!
//! ## Core Concepts
//!
//! - **Observable**: a cold description of how to produce a sequence; every
//!   subscription independently replays the production logic
//! - **Observer**: the three-callback consumer capability set (`on_next`,
//!   `on_error`, `on_complete`), invoked strictly sequentially
//! - **Subscription**: one live consumption, owning the cancellation token
//! - **Operators**: map, filter, flat_map, concat_map, reduce, zip,
//!   on_error_resume_next, retry, and friends
//!
//! At most one terminal signal is ever delivered per subscription, and no
//! item follows it. Producers cannot break this: they only push items, and
//! the subscription driver derives the terminal signal from the production
//! result.
//!
//! ## Example
//!
//! ```rust
//! use coldstream::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> coldstream::Result<()> {
//!     let labeled = from_iter(1..=6)
//!         .filter(|n| n % 2 == 0)
//!         .map(|n| format!("{n}-Even"));
//!
//!     let items = coldstream::utils::collect(labeled).await?;
//!     assert_eq!(items, vec!["2-Even", "4-Even", "6-Even"]);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod error;
pub mod operators;
pub mod sources;
pub mod utils;

// Re-export commonly used items
pub mod prelude {
    pub use crate::core::{
        Emitter, Observable, ObservableExt, Observer, Signal, SubscribeConfig, Subscription,
    };
    pub use crate::error::{Error, Result};
    pub use crate::operators::{
        ConcatMap, Count, Filter, FlatMap, Fold, Map, Maybe, OnErrorResumeNext, Reduce, Repeat,
        Retry, Take, Zip,
    };
    pub use crate::sources::{create, empty, fail, from_iter, just};
}

// Re-export main error type
pub use error::{Error, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
