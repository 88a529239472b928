// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-client submission allowance.
//!
//! Each client identifier may send a fixed number of confessions within a
//! reset window that starts at its first successful submission. Expired
//! records are dropped lazily, on the next lookup; there is no background
//! sweep. A client whose window has expired is treated exactly like a new
//! client.
//!
//! Checking and recording are split by the (slow) mail send. To keep two
//! concurrent submissions from the same client from both passing the check,
//! [`SubmissionLimiter::reserve`] counts in-flight submissions against the
//! allowance inside the same critical section as the check.

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Usage record for one client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionRecord {
    /// Successful submissions in the current window
    pub count: u32,
    /// Start of the current window
    pub first_submission: DateTime<Utc>,
}

/// The client has used up its allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("You have reached the maximum limit of {max} confessions.")]
pub struct RateLimitExceeded {
    pub max: u32,
}

#[derive(Debug, Default)]
struct LimiterState {
    records: HashMap<String, SubmissionRecord>,
    in_flight: HashMap<String, u32>,
}

impl LimiterState {
    /// Drop the record for `client_id` if its window has passed.
    fn expire(&mut self, client_id: &str, now: DateTime<Utc>, window: chrono::Duration) {
        let expired = self
            .records
            .get(client_id)
            .is_some_and(|record| now - record.first_submission > window);
        if expired {
            self.records.remove(client_id);
            debug!(client = %client_id, "Submission window expired, record reset");
        }
    }

    fn count(&mut self, client_id: &str, now: DateTime<Utc>, window: chrono::Duration) -> u32 {
        self.expire(client_id, now, window);
        self.records.get(client_id).map_or(0, |record| record.count)
    }

    fn record(
        &mut self,
        client_id: &str,
        now: DateTime<Utc>,
        window: chrono::Duration,
        max: u32,
    ) -> u32 {
        self.expire(client_id, now, window);
        match self.records.entry(client_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                if record.count >= max {
                    warn!(client = %client_id, count = record.count, "Submission recorded past allowance, ignoring");
                } else {
                    record.count += 1;
                }
                record.count
            }
            Entry::Vacant(entry) => {
                entry.insert(SubmissionRecord {
                    count: 1,
                    first_submission: now,
                });
                1
            }
        }
    }

    fn in_flight(&self, client_id: &str) -> u32 {
        self.in_flight.get(client_id).copied().unwrap_or(0)
    }

    fn release(&mut self, client_id: &str) {
        if let Entry::Occupied(mut entry) = self.in_flight.entry(client_id.to_string()) {
            *entry.get_mut() -= 1;
            if *entry.get() == 0 {
                entry.remove();
            }
        }
    }
}

/// Thread-safe submission limiter.
pub struct SubmissionLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<LimiterState>,
}

impl SubmissionLimiter {
    /// Create a limiter that reads the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter with an explicit time source.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(LimiterState::default()),
        }
    }

    pub fn max_submissions(&self) -> u32 {
        self.config.max_submissions
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Successful submissions in the client's live window, 0 if none.
    ///
    /// Removes the record as a side effect when the window has expired.
    pub fn get_count(&self, client_id: &str) -> u32 {
        let now = self.clock.now();
        self.lock().count(client_id, now, self.config.reset_window())
    }

    /// Submissions the client may still make.
    pub fn remaining(&self, client_id: &str) -> u32 {
        self.max_submissions().saturating_sub(self.get_count(client_id))
    }

    /// Count one successful submission for the client.
    pub fn record_submission(&self, client_id: &str) -> u32 {
        let now = self.clock.now();
        self.lock().record(
            client_id,
            now,
            self.config.reset_window(),
            self.config.max_submissions,
        )
    }

    /// Claim a submission slot for the client.
    ///
    /// The slot counts against the allowance until the permit is committed
    /// (which records the submission) or dropped (which gives it back).
    pub fn reserve(&self, client_id: &str) -> Result<SubmissionPermit<'_>, RateLimitExceeded> {
        let now = self.clock.now();
        let max = self.config.max_submissions;
        let mut state = self.lock();

        let used = state.count(client_id, now, self.config.reset_window());
        let pending = state.in_flight(client_id);
        if used + pending >= max {
            debug!(client = %client_id, used, pending, max, "Submission allowance exhausted");
            return Err(RateLimitExceeded { max });
        }

        *state.in_flight.entry(client_id.to_string()).or_insert(0) += 1;
        Ok(SubmissionPermit {
            limiter: self,
            client_id: client_id.to_string(),
            committed: false,
        })
    }

    /// Number of client identifiers with a stored record, expired or not.
    pub fn tracked_clients(&self) -> usize {
        self.lock().records.len()
    }
}

/// A claimed submission slot.
#[must_use = "dropping a permit releases the slot without recording a submission"]
pub struct SubmissionPermit<'a> {
    limiter: &'a SubmissionLimiter,
    client_id: String,
    committed: bool,
}

impl std::fmt::Debug for SubmissionPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPermit")
            .field("client_id", &self.client_id)
            .field("committed", &self.committed)
            .finish()
    }
}

impl SubmissionPermit<'_> {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Record the submission and return the client's new count.
    pub fn commit(mut self) -> u32 {
        let limiter = self.limiter;
        let now = limiter.clock.now();
        let mut state = limiter.lock();
        state.release(&self.client_id);
        self.committed = true;
        state.record(
            &self.client_id,
            now,
            limiter.config.reset_window(),
            limiter.config.max_submissions,
        )
    }
}

impl Drop for SubmissionPermit<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.limiter.lock().release(&self.client_id);
            debug!(client = %self.client_id, "Submission slot released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter_with_clock() -> (SubmissionLimiter, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let limiter =
            SubmissionLimiter::with_clock(RateLimitConfig::default(), Arc::new(clock.clone()));
        (limiter, clock)
    }

    #[test]
    fn test_unknown_client_has_zero_count() {
        let (limiter, _) = limiter_with_clock();
        assert_eq!(limiter.get_count("203.0.113.7"), 0);
        assert_eq!(limiter.remaining("203.0.113.7"), 3);
    }

    #[test]
    fn test_record_increments_up_to_max() {
        let (limiter, _) = limiter_with_clock();
        for expected in 1..=3 {
            assert_eq!(limiter.record_submission("a"), expected);
            assert_eq!(limiter.get_count("a"), expected);
        }
        assert_eq!(limiter.remaining("a"), 0);

        // Past the allowance the count stays put
        assert_eq!(limiter.record_submission("a"), 3);
        assert_eq!(limiter.get_count("a"), 3);
    }

    #[test]
    fn test_clients_are_independent() {
        let (limiter, _) = limiter_with_clock();
        limiter.record_submission("a");
        limiter.record_submission("a");
        limiter.record_submission("b");
        assert_eq!(limiter.get_count("a"), 2);
        assert_eq!(limiter.get_count("b"), 1);
    }

    #[test]
    fn test_window_expiry_resets_silently() {
        let (limiter, clock) = limiter_with_clock();
        for _ in 0..3 {
            limiter.record_submission("a");
        }

        // Exactly at the boundary the record is still live
        clock.advance(chrono::Duration::days(60));
        assert_eq!(limiter.get_count("a"), 3);

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(limiter.get_count("a"), 0);
        assert_eq!(limiter.tracked_clients(), 0);

        assert_eq!(limiter.record_submission("a"), 1);
    }

    #[test]
    fn test_record_on_expired_starts_new_window() {
        let (limiter, clock) = limiter_with_clock();
        limiter.record_submission("a");
        limiter.record_submission("a");

        clock.advance(chrono::Duration::days(61));
        // No read in between: recording must still see the expiry
        assert_eq!(limiter.record_submission("a"), 1);

        clock.advance(chrono::Duration::days(59));
        assert_eq!(limiter.get_count("a"), 1);
    }

    #[test]
    fn test_permit_commit_records() {
        let (limiter, _) = limiter_with_clock();
        let permit = limiter.reserve("a").unwrap();
        assert_eq!(permit.client_id(), "a");
        assert_eq!(limiter.get_count("a"), 0);
        assert_eq!(permit.commit(), 1);
        assert_eq!(limiter.get_count("a"), 1);
    }

    #[test]
    fn test_dropped_permit_releases_slot() {
        let (limiter, _) = limiter_with_clock();
        limiter.record_submission("a");
        limiter.record_submission("a");

        let permit = limiter.reserve("a").unwrap();
        assert_eq!(limiter.reserve("a").unwrap_err(), RateLimitExceeded { max: 3 });
        drop(permit);

        assert_eq!(limiter.get_count("a"), 2);
        assert!(limiter.reserve("a").is_ok());
    }

    #[test]
    fn test_in_flight_permits_count_against_allowance() {
        let (limiter, _) = limiter_with_clock();
        let first = limiter.reserve("a").unwrap();
        let second = limiter.reserve("a").unwrap();
        let third = limiter.reserve("a").unwrap();
        assert!(limiter.reserve("a").is_err());

        first.commit();
        second.commit();
        third.commit();
        assert_eq!(limiter.get_count("a"), 3);
        assert!(limiter.reserve("a").is_err());
    }

    #[test]
    fn test_concurrent_reservations_never_exceed_max() {
        let (limiter, _) = limiter_with_clock();
        let limiter = Arc::new(limiter);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || match limiter.reserve("shared") {
                    Ok(permit) => {
                        permit.commit();
                        true
                    }
                    Err(_) => false,
                })
            })
            .collect();

        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(granted, 3);
        assert_eq!(limiter.get_count("shared"), 3);
    }

    #[test]
    fn test_limit_message() {
        assert_eq!(
            RateLimitExceeded { max: 3 }.to_string(),
            "You have reached the maximum limit of 3 confessions."
        );
    }
}
