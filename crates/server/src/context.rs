//! Per-call context forwarded to every capability.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Request-scoped data passed through the services to the identity provider
/// and the account store.
///
/// The deadline is never imposed by the services themselves; whoever builds
/// the context (the HTTP layer, the CLI) decides it and both capabilities
/// honor it.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    request_id: Option<String>,
    deadline: Option<Instant>,
}

/// The deadline expired before the wrapped call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded;

impl CallContext {
    /// A context with no request id and no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the request id used for log correlation.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Expire the call `timeout` from now. A timeout too large to represent
    /// leaves the context without a deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Expire the call at `deadline`.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Run `fut` bounded by the deadline, or unbounded when none is set.
    ///
    /// # Errors
    ///
    /// Returns `DeadlineExceeded` if the deadline passes first.
    pub async fn bound<F: Future>(&self, fut: F) -> Result<F::Output, DeadlineExceeded> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| DeadlineExceeded),
            None => Ok(fut.await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unbounded_call_completes() {
        let ctx = CallContext::new();
        assert_eq!(ctx.bound(async { 7 }).await, Ok(7));
        assert!(ctx.remaining().is_none());
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(20));
        let never = std::future::pending::<()>();
        assert_eq!(ctx.bound(never).await, Err(DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_unrepresentable_timeout_leaves_no_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(u64::MAX));
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_request_id() {
        let ctx = CallContext::new().with_request_id("req-1");
        assert_eq!(ctx.request_id(), Some("req-1"));
    }
}
