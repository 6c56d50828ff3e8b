//! Time-bounded search for keys whose address matches a pattern.
//!
//! Each iteration samples a fresh scalar, derives its address and tests the
//! predicate. The deadline is checked between iterations, so an iteration
//! already in flight always finishes. Running out of time is an ordinary
//! outcome, reported as [`Error::Timeout`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use tracing::{debug, info};

use crate::address::{random_secret_key, Address};
use keyshard_common::{Error, Result, SensitiveBytes};

/// A key found by the search.
#[derive(Debug)]
pub struct VanityKey {
    /// The 32-byte private scalar.
    pub secret: SensitiveBytes,
    pub address: Address,
    /// Candidates tried across all workers.
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Build a predicate matching addresses that start with `prefix`.
///
/// A leading `0x` on the prefix is ignored. When the search is not case
/// sensitive the prefix is lowercased to match the folded address text.
pub fn prefix_matcher(prefix: &str, case_sensitive: bool) -> impl Fn(&str) -> bool + Send + Sync {
    let prefix = prefix.strip_prefix("0x").unwrap_or(prefix);
    let prefix = if case_sensitive {
        prefix.to_string()
    } else {
        prefix.to_ascii_lowercase()
    };
    move |address: &str| address.starts_with(&prefix)
}

/// Search on the current thread.
///
/// The predicate sees the 40 hex digits of each candidate address: the
/// checksum form when `case_sensitive`, lowercase otherwise.
pub fn search<P>(predicate: P, case_sensitive: bool, budget: Duration) -> Result<VanityKey>
where
    P: Fn(&str) -> bool + Sync,
{
    search_parallel(predicate, case_sensitive, budget, 1)
}

/// Search with `workers` threads racing to the first match.
///
/// Workers share only the stop flag, the attempt counter and the deadline.
pub fn search_parallel<P>(
    predicate: P,
    case_sensitive: bool,
    budget: Duration,
    workers: usize,
) -> Result<VanityKey>
where
    P: Fn(&str) -> bool + Sync,
{
    let workers = workers.max(1);
    let start = Instant::now();
    let deadline = start + budget;
    let stop = AtomicBool::new(false);
    let attempts = AtomicU64::new(0);

    debug!(workers, budget_ms = budget.as_millis() as u64, case_sensitive, "Starting vanity search");

    let found = if workers == 1 {
        run_worker(&predicate, case_sensitive, deadline, &stop, &attempts)
    } else {
        thread::scope(|scope| {
            let predicate = &predicate;
            let stop = &stop;
            let attempts = &attempts;

            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                handles.push(scope.spawn(move || {
                    run_worker(predicate, case_sensitive, deadline, stop, attempts)
                }));
            }

            let mut found = None;
            for handle in handles {
                match handle.join() {
                    Ok(Some(candidate)) if found.is_none() => found = Some(candidate),
                    Ok(_) => {}
                    Err(_) => {
                        stop.store(true, Ordering::Relaxed);
                        return Err(Error::Crypto("vanity worker panicked".to_string()));
                    }
                }
            }
            Ok(found)
        })?
    };

    let elapsed = start.elapsed();
    let attempts = attempts.load(Ordering::Relaxed);

    match found {
        Some((secret, address)) => {
            info!(address = %address, attempts, elapsed_ms = elapsed.as_millis() as u64, "Vanity key found");
            Ok(VanityKey {
                secret,
                address,
                attempts,
                elapsed,
            })
        }
        None => {
            debug!(attempts, elapsed_ms = elapsed.as_millis() as u64, "Vanity search timed out");
            Err(Error::Timeout { attempts, elapsed })
        }
    }
}

fn run_worker<P>(
    predicate: &P,
    case_sensitive: bool,
    deadline: Instant,
    stop: &AtomicBool,
    attempts: &AtomicU64,
) -> Option<(SensitiveBytes, Address)>
where
    P: Fn(&str) -> bool,
{
    let mut rng = OsRng;

    while !stop.load(Ordering::Relaxed) {
        if Instant::now() >= deadline {
            return None;
        }

        let key = random_secret_key(&mut rng);
        let address = Address::from_secret_key(&key);
        attempts.fetch_add(1, Ordering::Relaxed);

        let text = if case_sensitive {
            address.to_checksum()
        } else {
            address.to_lowercase_hex()
        };

        if predicate(&text) && !stop.swap(true, Ordering::Relaxed) {
            return Some((SensitiveBytes::new(key.to_bytes().to_vec()), address));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsatisfiable_times_out_near_budget() {
        let budget = Duration::from_millis(50);
        let started = Instant::now();

        let result = search(|_| false, false, budget);
        let wall = started.elapsed();

        match result {
            Err(Error::Timeout { attempts, elapsed }) => {
                assert!(attempts > 0);
                assert!(elapsed >= budget);
            }
            other => panic!("expected timeout, got {:?}", other.map(|k| k.address)),
        }
        assert!(wall < Duration::from_millis(200), "took {:?}", wall);
    }

    #[test]
    fn test_parallel_timeout() {
        let result = search_parallel(|_| false, true, Duration::from_millis(50), 4);
        assert!(matches!(result, Err(Error::Timeout { .. })));
    }

    #[test]
    fn test_zero_budget_times_out_without_attempts() {
        let result = search(|_| true, false, Duration::ZERO);
        assert!(matches!(result, Err(Error::Timeout { attempts: 0, .. })));
    }

    #[test]
    fn test_finds_short_prefix() {
        let found = search(prefix_matcher("0xa", false), false, Duration::from_secs(30)).unwrap();

        assert!(found.address.to_lowercase_hex().starts_with('a'));
        assert_eq!(Address::from_private_key(found.secret.as_bytes()).unwrap(), found.address);
        assert!(found.attempts >= 1);
    }

    #[test]
    fn test_case_sensitive_prefix() {
        let found = search_parallel(
            prefix_matcher("B", true),
            true,
            Duration::from_secs(30),
            2,
        )
        .unwrap();

        assert!(found.address.to_checksum().starts_with('B'));
    }

    #[test]
    fn test_prefix_matcher_folding() {
        let insensitive = prefix_matcher("0xAB", false);
        assert!(insensitive("abcdef"));

        let sensitive = prefix_matcher("AB", true);
        assert!(sensitive("ABcdef"));
        assert!(!sensitive("abcdef"));
    }
}
