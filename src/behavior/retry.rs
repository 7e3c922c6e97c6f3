//! Exponential backoff bounded by an overall time budget.
//!
//! The policy never counts attempts: a handler is retried until it succeeds
//! or the next sleep would carry the total elapsed time past
//! `max_elapsed_time`, so fast- and slow-failing handlers get the same
//! wall-clock budget.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::{debug, warn};

use super::Behavior;
use crate::context::Context;
use crate::error::Result;
use crate::hub::Hub;
use crate::message::Message;
use crate::reader::{MessageHandler, ReaderHandler, ReaderNode};

pub const DEFAULT_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Total time budget. Zero disables the budget.
    pub max_elapsed_time: Duration,
    pub multiplier: f64,
    /// Each interval is jittered by up to this fraction in either direction.
    pub randomization_factor: f64,
}

impl RetryPolicy {
    pub fn new(initial_interval: Duration, max_interval: Duration, max_elapsed_time: Duration) -> Self {
        Self {
            initial_interval,
            max_interval,
            max_elapsed_time,
            multiplier: DEFAULT_MULTIPLIER,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor;
        self
    }

    /// A fresh backoff whose clock starts now.
    ///
    /// `next_backoff` returns `None` once the elapsed time plus the next
    /// interval would exceed `max_elapsed_time`.
    pub fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval.max(self.initial_interval),
            randomization_factor: self.randomization_factor.clamp(0.0, 1.0),
            multiplier: self.multiplier.max(1.0),
            max_elapsed_time: (!self.max_elapsed_time.is_zero()).then_some(self.max_elapsed_time),
            ..ExponentialBackoff::default()
        };
        backoff.reset();
        backoff
    }

    /// Run `op` until it succeeds, the budget runs out, or `ctx` ends.
    ///
    /// On give-up the error of the last attempt is returned unchanged.
    pub async fn retry<T, F, Fut>(&self, ctx: &Context, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.backoff();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if ctx.is_done() {
                return Err(err);
            }
            let Some(delay) = backoff.next_backoff() else {
                debug!(
                    attempt,
                    elapsed = ?backoff.get_elapsed_time(),
                    error = %err,
                    "retry budget exhausted"
                );
                return Err(err);
            };

            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed, backing off"
            );
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = ctx.done() => return Err(err),
            }
        }
    }
}

/// Retries the whole wrapped chain with the node's retry parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryBehavior;

impl Behavior for RetryBehavior {
    fn wrap(&self, node: &ReaderNode, _hub: &Hub, next: ReaderHandler) -> ReaderHandler {
        Arc::new(RetryHandler {
            policy: RetryPolicy::new(
                node.retry_initial_interval,
                node.retry_max_interval,
                node.retry_timeout,
            ),
            next,
        })
    }
}

struct RetryHandler {
    policy: RetryPolicy,
    next: ReaderHandler,
}

#[async_trait]
impl MessageHandler for RetryHandler {
    async fn handle(&self, ctx: Context, message: Message) -> Result<()> {
        self.policy
            .retry(&ctx, || self.next.handle(ctx.clone(), message.clone()))
            .await
    }
}
