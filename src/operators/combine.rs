//! Pairwise combination of two sequences.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::{Emitter, Observable, Pull};
use crate::error::Result;
use crate::operators::{trap_fault, OPERATOR_BUFFER};

/// Pairs the n-th item of the left sequence with the n-th item of the right,
/// combining each pair with a function.
///
/// Items are buffered per side until their partner arrives. The zipped
/// sequence completes as soon as either side completes with no complete pair
/// left pending, at which point the other side is cancelled and any unpaired
/// buffered items are discarded. Either side erroring errors the zip
/// immediately.
pub struct Zip<A, B, F> {
    left: A,
    right: B,
    combine: F,
}

impl<A, B, F> Zip<A, B, F> {
    pub(crate) fn new(left: A, right: B, combine: F) -> Self {
        Self {
            left,
            right,
            combine,
        }
    }
}

#[async_trait]
impl<A, B, F, C> Observable for Zip<A, B, F>
where
    A: Observable,
    B: Observable,
    F: Fn(A::Item, B::Item) -> C + Send + Sync,
    C: Send + 'static,
{
    type Item = C;

    async fn produce(&self, emitter: Emitter<C>) -> Result<()> {
        let guard = emitter.token().child_token();
        let (left_tx, left_rx) = mpsc::channel(OPERATOR_BUFFER);
        let (right_tx, right_rx) = mpsc::channel(OPERATOR_BUFFER);
        let left = self.left.produce(Emitter::new(left_tx, guard.clone()));
        let right = self.right.produce(Emitter::new(right_tx, guard.clone()));
        tokio::pin!(left, right);
        let mut left_pull = Pull::new(left, left_rx);
        let mut right_pull = Pull::new(right, right_rx);

        let mut left_buf: VecDeque<A::Item> = VecDeque::new();
        let mut right_buf: VecDeque<B::Item> = VecDeque::new();
        let mut left_done = false;
        let mut right_done = false;

        let result = 'zip: loop {
            while !left_buf.is_empty() && !right_buf.is_empty() {
                let x = left_buf.pop_front().unwrap();
                let y = right_buf.pop_front().unwrap();
                let pair = match trap_fault(|| (self.combine)(x, y)) {
                    Ok(pair) => pair,
                    Err(e) => break 'zip Err(e),
                };
                if let Err(e) = emitter.emit(pair).await {
                    break 'zip Err(e);
                }
            }

            // A finished side with an empty buffer means no further complete
            // pair can ever form.
            if (left_done && left_buf.is_empty()) || (right_done && right_buf.is_empty()) {
                break Ok(());
            }

            tokio::select! {
                item = left_pull.next(), if !left_done => match item {
                    Ok(Some(x)) => left_buf.push_back(x),
                    Ok(None) => left_done = true,
                    Err(e) => break Err(e),
                },
                item = right_pull.next(), if !right_done => match item {
                    Ok(Some(y)) => right_buf.push_back(y),
                    Ok(None) => right_done = true,
                    Err(e) => break Err(e),
                },
            }
        };

        guard.cancel();
        result
    }
}
