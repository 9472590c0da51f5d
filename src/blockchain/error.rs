use thiserror::Error;

/// Errors that can occur during ledger operations
///
/// Validation failures are ordinary outcomes reported to the caller; the
/// network layer decides whether to log them or reject a peer's data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Chain does not start with the genesis block")]
    InvalidGenesis,

    #[error("Invalid chain linkage: {0}")]
    InvalidChainLinkage(String),

    #[error("Invalid proof of work: {0}")]
    InvalidProof(String),

    #[error("Transaction {0} appears in more than one block")]
    DuplicateTransaction(String),

    #[error("Application record {0} already exists in the chain")]
    DuplicateApplicationRecord(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Chain tip changed while mining")]
    StaleMiningTarget,

    #[error("System error: {0}")]
    SystemError(String),
}

/// Convenience alias used across the ledger
pub type Result<T> = std::result::Result<T, LedgerError>;
