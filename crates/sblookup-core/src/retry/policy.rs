use std::time::Duration;

/// What went wrong with a lookup attempt, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// curl timeout or the per-request deadline expired.
    Timeout,
    /// 429 or 503 from the lookup service.
    Throttled,
    /// Could not connect, resolve, send or receive.
    Connection,
    /// Any other 5xx status.
    ServerError(u32),
    /// Bad endpoint, bad payload, 4xx. Retrying cannot help.
    Permanent,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, ErrorKind::Permanent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Attempts per batch and the exponential backoff between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per batch, first one included. 1 disables retry.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

impl RetryPolicy {
    /// One attempt per batch; failures are final.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }

    /// `retries` extra attempts with the default backoff.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::no_retry()
        }
    }

    /// Delay before attempt `attempt + 1`; `attempt` is 1-based.
    fn backoff(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay)
    }

    /// Whether attempt `attempt` failing with `kind` earns another try.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts || !kind.is_transient() {
            RetryDecision::NoRetry
        } else {
            RetryDecision::RetryAfter(self.backoff(attempt))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay(p: &RetryPolicy, attempt: u32) -> Duration {
        match p.decide(attempt, ErrorKind::Timeout) {
            RetryDecision::RetryAfter(d) => d,
            RetryDecision::NoRetry => panic!("expected retry at attempt {}", attempt),
        }
    }

    #[test]
    fn default_is_single_attempt() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 1);
        for kind in [
            ErrorKind::Timeout,
            ErrorKind::Throttled,
            ErrorKind::ServerError(500),
        ] {
            assert_eq!(p.decide(1, kind), RetryDecision::NoRetry);
        }
    }

    #[test]
    fn permanent_errors_stop_immediately() {
        let p = RetryPolicy::with_retries(5);
        assert_eq!(p.decide(1, ErrorKind::Permanent), RetryDecision::NoRetry);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let p = RetryPolicy::with_retries(30);
        assert_eq!(delay(&p, 1), Duration::from_millis(250));
        assert_eq!(delay(&p, 2), Duration::from_millis(500));
        assert_eq!(delay(&p, 3), Duration::from_secs(1));
        assert_eq!(delay(&p, 20), p.max_delay);
    }

    #[test]
    fn retries_count_excludes_first_attempt() {
        let p = RetryPolicy::with_retries(2);
        assert_eq!(p.max_attempts, 3);
        assert!(matches!(
            p.decide(2, ErrorKind::Throttled),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, ErrorKind::Throttled), RetryDecision::NoRetry);
    }
}
