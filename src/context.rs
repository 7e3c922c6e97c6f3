//! Request context threaded through every read and write call.
//!
//! A [`Context`] carries a cancellation token, an optional deadline, and the
//! correlation/causation identifiers of the message flow currently executing.
//! Cloning is cheap; deriving a child via [`Context::child`] or
//! [`Context::with_timeout`] gives a context that is cancelled together with its
//! parent but can also be cancelled (or expire) on its own.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    correlation_id: Option<String>,
    causation_id: Option<String>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A root context with no deadline and no message identifiers.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            correlation_id: None,
            causation_id: None,
        }
    }

    /// Root context driven by an existing cancellation token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            ..Self::new()
        }
    }

    /// Derive a child that is cancelled whenever this context is.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            correlation_id: self.correlation_id.clone(),
            causation_id: self.causation_id.clone(),
        }
    }

    /// Derive a child whose deadline is `timeout` from now, or the parent's
    /// deadline if that comes sooner.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child that expires at `deadline` (never later than the parent).
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.child();
        child.deadline = Some(match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        });
        child
    }

    /// Attach a correlation id.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Attach a causation id.
    pub fn with_causation_id(mut self, id: impl Into<String>) -> Self {
        self.causation_id = Some(id.into());
        self
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying token, for drivers that hand it to their own tasks.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the context has been cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// The reason this context ended, if it has.
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline elapses.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Drive `fut` to completion unless the context ends first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            () = self.done() => Err(self.err().unwrap_or(Error::Cancelled)),
            res = fut => res,
        }
    }
}

/// Correlation id for a new message: the value carried by `ctx` if any,
/// otherwise `fallback`.
pub fn message_correlation_id(ctx: &Context, fallback: &str) -> String {
    ctx.correlation_id()
        .map(str::to_owned)
        .unwrap_or_else(|| fallback.to_owned())
}

/// Causation id for a new message: the value carried by `ctx` if any,
/// otherwise `fallback`.
pub fn message_causation_id(ctx: &Context, fallback: &str) -> String {
    ctx.causation_id()
        .map(str::to_owned)
        .unwrap_or_else(|| fallback.to_owned())
}
