//! Retry combinator with an accumulating backoff.
//!
//! Every failed attempt adds the base delay to the current delay (5s, 10s, 15s, ...) until the configured
//! ceiling is reached. Each call to [`retry`] owns a fresh [`Backoff`], hence a successful attempt always
//! starts the next operation from the base delay again. Only errors classified as retryable (see
//! [`Error::is_retryable`]) are retried; everything else is returned to the caller immediately.

use crate::error::Error;
use log::debug;
use std::time::Duration;

/// Immutable retry settings, usually read from [`crate::config::Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        BackoffPolicy { base, max }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::new(Duration::from_secs(5), Duration::from_secs(10 * 60))
    }
}

/// Mutable delay state of a single retried operation.
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Backoff {
            policy,
            current: Duration::ZERO,
        }
    }

    /// Returns the delay to sleep before the next attempt, growing by one base delay per call.
    pub fn next_delay(&mut self) -> Duration {
        self.current = std::cmp::min(self.current + self.policy.base, self.policy.max);
        self.current
    }
}

/// Retries `operation` until it succeeds or fails with a non-retryable error, sleeping between attempts.
pub fn retry<T, F>(policy: BackoffPolicy, operation: F) -> Result<T, Error>
where
    F: FnMut() -> Result<T, Error>,
{
    retry_with_sleep(policy, std::thread::sleep, operation)
}

/// Same as [`retry`] but with a custom sleep function.
pub fn retry_with_sleep<T, F, S>(policy: BackoffPolicy, mut sleep: S, mut operation: F) -> Result<T, Error>
where
    F: FnMut() -> Result<T, Error>,
    S: FnMut(Duration),
{
    let mut backoff = Backoff::new(policy);

    loop {
        match operation() {
            Ok(value) => return Ok(value),

            Err(why) if why.is_retryable() => {
                let delay = backoff.next_delay();
                debug!("Retrying in {}s because of '{why}'", delay.as_secs());
                sleep(delay);
            }

            Err(why) => return Err(why),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_secs(5), Duration::from_secs(20))
    }

    fn rejected() -> Error {
        Error::HttpRejected("https://www.bitcoinabuse.com/reports?page=1".to_string(), "502".to_string())
    }

    #[test]
    fn backoff_accumulates_until_ceiling() {
        let mut backoff = Backoff::new(policy());
        let delays: Vec<u64> = (0..6).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 15, 20, 20, 20]);
    }

    #[test]
    fn three_failures_then_success() {
        let mut attempts = 0;
        let mut delays = Vec::new();

        let result = retry_with_sleep(
            policy(),
            |delay| delays.push(delay),
            || {
                attempts += 1;
                match attempts {
                    1 | 2 => Err(rejected()),
                    3 => Err(Error::RateLimited("https://www.walletexplorer.com/".to_string(), "limit")),
                    _ => Ok(attempts),
                }
            },
        );

        assert_eq!(result.unwrap(), 4);
        assert_eq!(attempts, 4);
        assert_eq!(delays.len(), 3);
        assert!(delays[2] > delays[0]);
    }

    #[test]
    fn non_retryable_error_is_returned() {
        let mut attempts = 0;
        let mut delays = Vec::new();

        let result: Result<(), Error> = retry_with_sleep(
            policy(),
            |delay| delays.push(delay),
            || {
                attempts += 1;
                Err(Error::CrawlerChannelDisconnected)
            },
        );

        assert!(matches!(result, Err(Error::CrawlerChannelDisconnected)));
        assert_eq!(attempts, 1);
        assert!(delays.is_empty());
    }

    #[test]
    fn every_call_starts_from_base_delay() {
        let mut delays = Vec::new();

        for _ in 0..2 {
            let mut failed = false;
            retry_with_sleep(
                policy(),
                |delay| delays.push(delay),
                || match failed {
                    true => Ok(()),
                    false => {
                        failed = true;
                        Err(rejected())
                    }
                },
            )
            .unwrap();
        }

        assert_eq!(delays, vec![Duration::from_secs(5), Duration::from_secs(5)]);
    }
}
