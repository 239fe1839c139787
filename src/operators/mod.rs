//! Operator implementations built purely on the core observable contract.
//!
//! Each operator is a struct owning its upstream; construction is pure and
//! nothing runs until the chain is subscribed. Entry points live on
//! [`ObservableExt`](crate::core::ObservableExt).

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{Error, Result};

pub mod accumulate;
pub mod combine;
pub mod flatten;
pub mod recover;
pub mod transform;

pub use accumulate::{Count, Fold, Maybe, Reduce};
pub use combine::Zip;
pub use flatten::{ConcatMap, FlatMap};
pub use recover::{OnErrorResumeNext, Repeat, Retry};
pub use transform::{Filter, Map, Take};

/// Capacity of the internal channel between an operator and its upstream.
/// Upstream production runs at most this far ahead of downstream demand.
pub(crate) const OPERATOR_BUFFER: usize = 16;

/// Run a user-supplied function, converting a panic into the invoking
/// operator's own terminal error.
///
/// The fault surfaces as this operator's `Err`, so recovery operators
/// wrapping it (`retry`, `on_error_resume_next`) see an ordinary error
/// signal rather than a task panic.
pub(crate) fn trap_fault<T>(f: impl FnOnce() -> T) -> Result<T> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic in user-supplied function".to_string()
        };
        Error::Fault(message)
    })
}
