use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use super::block::{digest, BlockData};
use super::error::{LedgerError, Result};

/// Mining difficulty (number of leading zeros required in hash)
pub const DIFFICULTY: usize = 4;

/// Shared flag used to abandon an in-flight proof of work search
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals every search holding this flag to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Checks if the flag was raised
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Checks if a hash satisfies the difficulty predicate
pub fn meets_difficulty(hash: &str) -> bool {
    hash.len() >= DIFFICULTY && hash.bytes().take(DIFFICULTY).all(|b| b == b'0')
}

/// Performs proof of work to find a valid nonce
///
/// Nonces are tried from 0 upwards until `hash(previous_hash, nonce, data)`
/// meets the difficulty predicate. The search has no iteration bound and
/// stops early with `StaleMiningTarget` once `cancel` is raised.
///
/// # Arguments
///
/// * `previous_hash` - The hash of the block being extended
/// * `data` - The payload of the new block
/// * `cancel` - Flag raised when the target tip goes stale
///
/// # Returns
///
/// The first nonce satisfying the predicate
pub fn proof_of_work(previous_hash: &str, data: &BlockData, cancel: &CancelFlag) -> Result<u64> {
    let payload = data.to_json()?;
    let mut nonce: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            debug!("Proof of work for block {} cancelled at nonce {}", data.index, nonce);
            return Err(LedgerError::StaleMiningTarget);
        }

        if meets_difficulty(&digest(previous_hash, nonce, &payload)) {
            debug!("Proof of work for block {} found nonce {}", data.index, nonce);
            return Ok(nonce);
        }

        nonce = nonce
            .checked_add(1)
            .ok_or_else(|| LedgerError::SystemError("Nonce space exhausted".to_string()))?;
    }
}
