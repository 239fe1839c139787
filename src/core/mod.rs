//! Core abstractions: the cold observable contract, the observer capability
//! set, and the subscription lifecycle.

pub mod emitter;
pub mod observable;
pub mod observer;
pub mod subscription;

pub use emitter::Emitter;
pub use observable::{Observable, ObservableExt};
pub use observer::{Observer, Signal};
pub use subscription::{SubscribeConfig, Subscription};

pub(crate) use emitter::Pull;
