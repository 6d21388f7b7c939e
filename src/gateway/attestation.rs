// Lock attestations - where the externally locked quantity enters

use crate::identity::PublicKey;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// LOCK ATTESTATION
// ============================================================================

/// An already-verified statement of the cumulative amount an account has
/// locked on the external ledger. How it was verified (bridge proof,
/// oracle quorum) stays behind the [`AttestationSource`] seam.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockAttestation {
    /// The locking account
    pub account: PublicKey,
    /// Cumulative locked amount, never the increment
    pub locked_so_far: u64,
    /// When the attestation was produced
    pub attested_at: DateTime<Utc>,
}

impl LockAttestation {
    pub fn new(account: PublicKey, locked_so_far: u64) -> Self {
        Self {
            account,
            locked_so_far,
            attested_at: Utc::now(),
        }
    }
}

// ============================================================================
// ATTESTATION SOURCE TRAIT
// ============================================================================

/// Source of lock attestations (bridge watchers, oracles, indexers)
#[async_trait]
pub trait AttestationSource: Send + Sync {
    /// Fetch the latest attestation for an account.
    /// Returns an error message when the source is unavailable.
    async fn fetch_latest(&self, account: &PublicKey) -> Result<LockAttestation, String>;
}

// ============================================================================
// MOCK ATTESTATION SOURCE
// ============================================================================

/// Mock implementation of AttestationSource for testing
///
/// Scripted amounts are served in order; the last one repeats once the
/// script runs out.
pub struct MockAttestationSource {
    locked_amounts: Mutex<VecDeque<u64>>,
    should_succeed: bool,
    failure_message: Option<String>,
    delay_ms: u64,
    failures_before_success: AtomicUsize,
    call_count: AtomicUsize,
}

impl MockAttestationSource {
    /// Create a new mock source (defaults to failure)
    pub fn new() -> Self {
        Self {
            locked_amounts: Mutex::new(VecDeque::new()),
            should_succeed: false,
            failure_message: None,
            delay_ms: 0,
            failures_before_success: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Serve the given locked amount
    pub fn with_locked_amount(self, amount: u64) -> Self {
        self.with_locked_sequence(&[amount])
    }

    /// Serve the given amounts in order, repeating the last
    pub fn with_locked_sequence(mut self, amounts: &[u64]) -> Self {
        if let Ok(mut script) = self.locked_amounts.lock() {
            script.extend(amounts.iter().copied());
        }
        self.should_succeed = true;
        self
    }

    /// Configure to always fail with a message
    pub fn with_failure(mut self, message: String) -> Self {
        self.should_succeed = false;
        self.failure_message = Some(message);
        self
    }

    /// Add a delay before responding
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Fail N times, then serve the scripted amounts
    pub fn with_failures_then_success(mut self, failures: usize) -> Self {
        self.should_succeed = true;
        self.failures_before_success = AtomicUsize::new(failures);
        self
    }

    /// Number of fetches made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn failure(&self) -> String {
        self.failure_message
            .clone()
            .unwrap_or_else(|| "mock attestation failure".to_string())
    }
}

impl Default for MockAttestationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttestationSource for MockAttestationSource {
    async fn fetch_latest(&self, account: &PublicKey) -> Result<LockAttestation, String> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        let failures_remaining = self.failures_before_success.load(Ordering::SeqCst);

        if failures_remaining > 0 && call_num < failures_remaining {
            return Err(self.failure());
        }
        if !self.should_succeed {
            return Err(self.failure());
        }

        let mut script = self
            .locked_amounts
            .lock()
            .map_err(|_| "mock state poisoned".to_string())?;
        let amount = if script.len() > 1 {
            script.pop_front().unwrap_or(0)
        } else {
            script
                .front()
                .copied()
                .ok_or_else(|| "no attestation scripted".to_string())?
        };

        Ok(LockAttestation::new(account.clone(), amount))
    }
}
