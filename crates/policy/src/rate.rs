//! RateGate — per-identity fixed-window quota enforcement.
//!
//! Each identity owns its own window (count + window start) behind its own
//! mutex, so unrelated identities never serialize on a single global lock.
//! The outer map is only write-locked when a new identity appears.
//! Rejected attempts are not counted against the quota; the window resets
//! atomically once its period has elapsed.

use datagate_core::error::RateLimitError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Per-identity request quota over a fixed time window.
pub struct RateGate {
    quota: u32,
    window: Duration,
    windows: RwLock<HashMap<String, Arc<Mutex<Window>>>>,
}

impl RateGate {
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            quota: quota.max(1),
            window,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Admit or reject a request for `subject` at `now`.
    ///
    /// Increments the counter exactly once per admitted call.
    pub fn admit_at(&self, subject: &str, now: Instant) -> Result<(), RateLimitError> {
        let entry = self.entry(subject);
        let mut window = entry.lock().unwrap_or_else(|e| e.into_inner());

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.quota {
            let elapsed = now.duration_since(window.started);
            let retry_after = self.window.saturating_sub(elapsed);
            return Err(RateLimitError::QuotaExceeded {
                quota: self.quota,
                window_secs: self.window.as_secs(),
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        window.count += 1;
        Ok(())
    }

    /// Admit or reject a request for `subject` right now.
    pub fn admit(&self, subject: &str) -> Result<(), RateLimitError> {
        self.admit_at(subject, Instant::now())
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.windows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn entry(&self, subject: &str) -> Arc<Mutex<Window>> {
        {
            let map = self.windows.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = map.get(subject) {
                return entry.clone();
            }
        }
        let mut map = self.windows.write().unwrap_or_else(|e| e.into_inner());
        map.entry(subject.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Window {
                    started: Instant::now(),
                    count: 0,
                }))
            })
            .clone()
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("quota", &self.quota)
            .field("window", &self.window)
            .field("tracked_identities", &self.tracked_identities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_enforced_within_window() {
        let gate = RateGate::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(gate.admit_at("alice", now).is_ok());
        assert!(gate.admit_at("alice", now + Duration::from_secs(2)).is_ok());

        let err = gate
            .admit_at("alice", now + Duration::from_secs(5))
            .unwrap_err();
        match err {
            RateLimitError::QuotaExceeded {
                quota,
                retry_after_secs,
                ..
            } => {
                assert_eq!(quota, 2);
                assert!(retry_after_secs >= 1 && retry_after_secs <= 60);
            }
        }
    }

    #[test]
    fn window_resets_after_elapse() {
        let gate = RateGate::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(gate.admit_at("alice", now).is_ok());
        assert!(gate.admit_at("alice", now + Duration::from_secs(1)).is_err());
        // Window expires
        assert!(gate.admit_at("alice", now + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn identities_are_independent() {
        let gate = RateGate::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(gate.admit_at("alice", now).is_ok());
        assert!(gate.admit_at("bob", now).is_ok());
        assert!(gate.admit_at("alice", now + Duration::from_secs(1)).is_err());
        assert_eq!(gate.tracked_identities(), 2);
    }

    #[test]
    fn rejected_attempts_not_counted() {
        let gate = RateGate::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(gate.admit_at("alice", now).is_ok());
        for i in 1..10 {
            assert!(gate.admit_at("alice", now + Duration::from_secs(i)).is_err());
        }
        // A fresh window admits immediately — the rejections above did not
        // extend or inflate the count.
        assert!(gate.admit_at("alice", now + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn concurrent_admits_never_exceed_quota() {
        let gate = Arc::new(RateGate::new(50, Duration::from_secs(60)));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let gate = gate.clone();
            handles.push(std::thread::spawn(move || {
                let mut admitted = 0usize;
                for _ in 0..25 {
                    if gate.admit("shared").is_ok() {
                        admitted += 1;
                    }
                }
                admitted
            }));
        }

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 50);
    }
}
