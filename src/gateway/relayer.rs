// Mint relayer - drives attested locked amounts into controller mints

use crate::controller::{Controller, ControllerError};
use crate::gateway::{AttestationSource, LockAttestation};
use crate::identity::{Keypair, PublicKey};
use crate::ledger::MintError;
use crate::settlement::LocalChain;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// RELAY ERROR
// ============================================================================

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("attestation source unavailable after {attempts} attempts: {last_error}")]
    SourceUnavailable { attempts: u32, last_error: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("controller rejected the mint: {0}")]
    Controller(#[from] ControllerError),
}

// ============================================================================
// RELAYER CONFIG
// ============================================================================

/// Configuration for the relayer
#[derive(Clone, Debug)]
pub struct RelayerConfig {
    /// Maximum number of retry attempts when fetching attestations
    pub max_retries: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
    /// Timeout for a single fetch in milliseconds
    pub timeout_ms: u64,
}

impl RelayerConfig {
    /// Create a new config with builder pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the retry delay in milliseconds
    pub fn with_retry_delay_ms(mut self, ms: u64) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    /// Set the fetch timeout in milliseconds
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.timeout_ms == 0 {
            return Err(RelayError::InvalidConfig(
                "timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 100,
            timeout_ms: 5_000,
        }
    }
}

// ============================================================================
// RELAY OUTCOME
// ============================================================================

/// Outcome of one successful relay pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    /// A mint went through
    Minted {
        /// Freshly credited difference
        amount: u64,
        /// Counter value after the mint
        minted_so_far: u64,
    },
    /// The attested amount is already fully minted; nothing to do
    NothingToMint,
}

// ============================================================================
// RELAYER EVENTS
// ============================================================================

/// Events emitted by the relayer
#[derive(Clone, Debug)]
pub enum RelayerEvent {
    /// An attestation was fetched from the source
    AttestationFetched { locked_so_far: u64, attempts: u32 },
    /// A mint was submitted and committed
    MintSubmitted { amount: u64 },
    /// The attestation carried nothing new to mint
    MintSkipped,
    /// The relay pass failed
    RelayFailed { error: String },
}

// ============================================================================
// RELAYER STATS
// ============================================================================

/// Statistics about relayer operations
#[derive(Clone, Debug, Default)]
pub struct RelayerStats {
    pub attestations_fetched: u64,
    pub mints_submitted: u64,
    pub mints_skipped: u64,
    pub relays_failed: u64,
    pub total_amount_minted: u64,
}

// ============================================================================
// MINT RELAYER
// ============================================================================

/// Drives the fetch-attestation / relay-mint loop for one attestation source
pub struct MintRelayer {
    config: RelayerConfig,
    source: Arc<dyn AttestationSource>,
    events: Vec<RelayerEvent>,
    stats: RelayerStats,
}

impl MintRelayer {
    pub fn new(config: RelayerConfig, source: Arc<dyn AttestationSource>) -> Self {
        Self {
            config,
            source,
            events: Vec::new(),
            stats: RelayerStats::default(),
        }
    }

    /// One relay pass: fetch the caller's latest attested locked amount and
    /// relay it to the controller as a mint. `ZeroMintRejected` is the
    /// expected steady-state answer when nothing new is locked, so it comes
    /// back as [`RelayOutcome::NothingToMint`] rather than an error.
    pub async fn relay_mint(
        &mut self,
        chain: &mut LocalChain,
        controller: &Controller,
        caller: &Keypair,
    ) -> Result<RelayOutcome, RelayError> {
        self.config.validate()?;

        let caller_key = caller.public_key();
        let (attestation, attempts) = match self.fetch_attestation(&caller_key).await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.stats.relays_failed += 1;
                self.events.push(RelayerEvent::RelayFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        self.stats.attestations_fetched += 1;
        self.events.push(RelayerEvent::AttestationFetched {
            locked_so_far: attestation.locked_so_far,
            attempts,
        });

        match controller.mint(chain, caller, attestation.locked_so_far) {
            Ok(amount) => {
                self.stats.mints_submitted += 1;
                self.stats.total_amount_minted += amount;
                self.events.push(RelayerEvent::MintSubmitted { amount });
                info!(caller = %caller_key, amount, "relay minted");
                Ok(RelayOutcome::Minted {
                    amount,
                    minted_so_far: attestation.locked_so_far,
                })
            }
            Err(ControllerError::Mint(MintError::ZeroMintRejected)) => {
                self.stats.mints_skipped += 1;
                self.events.push(RelayerEvent::MintSkipped);
                info!(caller = %caller_key, "nothing to mint");
                Ok(RelayOutcome::NothingToMint)
            }
            Err(e) => {
                self.stats.relays_failed += 1;
                self.events.push(RelayerEvent::RelayFailed {
                    error: e.to_string(),
                });
                warn!(caller = %caller_key, error = %e, "relay failed");
                Err(RelayError::Controller(e))
            }
        }
    }

    /// Fetch the latest attestation with timeout and retries
    async fn fetch_attestation(
        &self,
        account: &PublicKey,
    ) -> Result<(LockAttestation, u32), RelayError> {
        let mut attempts = 0u32;

        let last_error = loop {
            attempts += 1;

            let fetch = self.source.fetch_latest(account);
            let timeout = Duration::from_millis(self.config.timeout_ms);

            let failure = match tokio::time::timeout(timeout, fetch).await {
                Ok(Ok(attestation)) => return Ok((attestation, attempts)),
                Ok(Err(e)) => e,
                Err(_) => "timeout".to_string(),
            };

            if attempts > self.config.max_retries {
                break failure;
            }
            warn!(attempts, error = %failure, "attestation fetch failed, retrying");
            if self.config.retry_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }
        };

        Err(RelayError::SourceUnavailable {
            attempts,
            last_error,
        })
    }

    /// Poll for events (clears the event queue)
    pub fn poll_events(&mut self) -> Vec<RelayerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get statistics
    pub fn stats(&self) -> &RelayerStats {
        &self.stats
    }
}
