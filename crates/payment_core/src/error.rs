use shared::protocol::ResultCodes;
use thiserror::Error;

use crate::transaction::TransactionError;

#[derive(Debug, Clone, Error)]
pub enum WalletError {
    #[error("wallet access denied: {0}")]
    AccessDenied(String),
    #[error("signing rejected: {0}")]
    Rejected(String),
    #[error("wallet error: {0}")]
    Extension(String),
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("account {0} not found")]
    NotFound(String),
    #[error("transaction rejected: {title} ({})", describe_codes(.result_codes))]
    Rejected {
        title: String,
        result_codes: ResultCodes,
    },
    #[error("horizon request failed: {0}")]
    Transport(String),
    #[error("unexpected horizon response: {0}")]
    Decode(String),
}

fn describe_codes(codes: &ResultCodes) -> String {
    let mut parts = Vec::new();
    if let Some(tx) = &codes.transaction {
        parts.push(tx.clone());
    }
    parts.extend(codes.operations.iter().cloned());
    if parts.is_empty() {
        "no result codes".to_string()
    } else {
        parts.join(", ")
    }
}

/// Where in the payment pipeline a submission broke down. Only ever logged;
/// callers see `WorkflowError::TransactionFailed`.
#[derive(Debug, Error)]
pub enum PaymentStageError {
    #[error("loading source account: {0}")]
    LoadAccount(#[source] LedgerError),
    #[error("building transaction: {0}")]
    Build(#[source] TransactionError),
    #[error("requesting signature: {0}")]
    Sign(#[source] WalletError),
    #[error("reconstructing signed transaction: {0}")]
    Reconstruct(#[source] TransactionError),
    #[error("wallet returned a different transaction than was requested")]
    Tampered,
    #[error("submitting transaction: {0}")]
    Submit(#[source] LedgerError),
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid ledger endpoint: {0}")]
    Ledger(#[source] LedgerError),
    #[error("invalid wallet configuration: {0}")]
    Wallet(#[source] WalletError),
}
