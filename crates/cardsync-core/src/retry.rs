use std::fmt::Display;
use std::time::Duration;

/// How many times to try a remote operation, how long to wait between
/// attempts, and how long a single attempt may take.
///
/// `timeout` is not enforced here; it is handed to whatever performs the
/// attempt (the HTTP client, for fetches).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Attempts actually made; a policy of zero still tries once.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up.
///
/// `op` receives the 1-indexed attempt number. The error of the last attempt
/// is returned.
pub fn retry<T, E, F>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    E: Display,
{
    retry_when(policy, op, |_| true)
}

/// Like [`retry`], but gives up immediately on an error `should_retry`
/// rejects.
pub fn retry_when<T, E, F, P>(policy: &RetryPolicy, mut op: F, should_retry: P) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && should_retry(&e) => {
                tracing::debug!(
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "attempt failed, retrying"
                );
                if !policy.delay.is_zero() {
                    std::thread::sleep(policy.delay);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
