//! Cancellation and deadline signal passed to the `*_with` repository
//! operations.
//!
//! An `OperationContext` pairs a [`CancellationToken`] with an optional
//! deadline. Child contexts derive their token from the parent, so cancelling
//! a parent cancels every child, but not vice versa.

use std::future::Future;
use std::time::Duration;

use sqrl_types::config::StoreConfig;
use sqrl_types::error::IdentityError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct OperationContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::background()
    }
}

impl OperationContext {
    /// A context that never fires: fresh token, no deadline.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Tie operations to an existing token (e.g. a request-scoped one).
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A background context carrying the configured default deadline, if any.
    pub fn from_config(config: &StoreConfig) -> Self {
        match config.operation_timeout() {
            Some(timeout) => Self::with_timeout(timeout),
            None => Self::background(),
        }
    }

    /// Tighten the deadline to at most `timeout` from now. An earlier
    /// existing deadline is kept.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(candidate),
            None => candidate,
        });
        self
    }

    /// Derived context: child token, same deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the context has already fired. Cancellation is reported
    /// ahead of an expired deadline.
    pub fn check(&self) -> Result<(), IdentityError> {
        if self.token.is_cancelled() {
            return Err(IdentityError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Err(IdentityError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `operation` until it finishes or the context fires, whichever
    /// comes first. When the context wins, `operation` is dropped without
    /// being polled again.
    ///
    /// Dropping the future only stops the caller from waiting. A store that
    /// has already handed the statement to its driver (sqlx SQLite runs it on
    /// a worker thread) may still complete it, so after `Cancelled` or
    /// `DeadlineExceeded` from a write the outcome is unknown.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, IdentityError>
    where
        F: Future<Output = Result<T, IdentityError>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(IdentityError::Cancelled),
            _ = deadline => Err(IdentityError::DeadlineExceeded),
            result = operation => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_fires() {
        let ctx = OperationContext::background();
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_check() {
        let ctx = OperationContext::background();
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(IdentityError::Cancelled)));
    }

    #[tokio::test]
    async fn test_zero_timeout_is_already_expired() {
        let ctx = OperationContext::with_timeout(Duration::ZERO);
        assert!(matches!(ctx.check(), Err(IdentityError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_cancellation_wins_over_expired_deadline() {
        let ctx = OperationContext::with_timeout(Duration::ZERO);
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(IdentityError::Cancelled)));
    }

    #[tokio::test]
    async fn test_timeout_keeps_earlier_deadline() {
        let ctx = OperationContext::with_timeout(Duration::from_secs(1));
        let first = ctx.deadline().unwrap();
        let ctx = ctx.timeout(Duration::from_secs(60));
        assert_eq!(ctx.deadline().unwrap(), first);
    }

    #[tokio::test]
    async fn test_parent_cancel_propagates_to_child_only() {
        let parent = OperationContext::background();
        let child = parent.child();
        let sibling_parent = OperationContext::background();
        let orphan = sibling_parent.child();

        orphan.cancel();
        assert!(!sibling_parent.is_cancelled());

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_returns_operation_result() {
        let ctx = OperationContext::background();
        let value = ctx.run(async { Ok::<_, IdentityError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_does_not_poll_when_already_cancelled() {
        let ctx = OperationContext::background();
        ctx.cancel();
        let polled = std::sync::atomic::AtomicBool::new(false);
        let result = ctx
            .run(async {
                polled.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok::<_, IdentityError>(())
            })
            .await;
        assert!(matches!(result, Err(IdentityError::Cancelled)));
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_times_out_slow_operation() {
        let ctx = OperationContext::with_timeout(Duration::from_millis(20));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, IdentityError>(())
            })
            .await;
        assert!(matches!(result, Err(IdentityError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_run_aborts_on_mid_flight_cancel() {
        let ctx = OperationContext::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, IdentityError>(())
            })
            .await;
        assert!(matches!(result, Err(IdentityError::Cancelled)));
    }

    #[test]
    fn test_from_config_without_timeout_is_background() {
        let ctx = OperationContext::from_config(&StoreConfig::default());
        assert!(ctx.deadline().is_none());
    }
}
