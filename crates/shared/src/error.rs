use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    WalletUnavailable,
    ConnectionFailed,
    InvalidInput,
    NotConnected,
    PaymentInProgress,
    TransactionFailed,
}

/// Everything the payment workflow reports to a rendering layer.
///
/// Provider failures are collapsed into these variants at the controller
/// boundary; the underlying cause only goes to the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("no wallet extension is available")]
    WalletUnavailable,
    #[error("wallet connection failed")]
    ConnectionFailed,
    #[error("recipient and amount are required")]
    InvalidInput,
    #[error("no wallet is connected")]
    NotConnected,
    #[error("a payment is already being submitted")]
    PaymentInProgress,
    #[error("transaction failed")]
    TransactionFailed,
}

impl WorkflowError {
    pub fn code(&self) -> ErrorCode {
        match self {
            WorkflowError::WalletUnavailable => ErrorCode::WalletUnavailable,
            WorkflowError::ConnectionFailed => ErrorCode::ConnectionFailed,
            WorkflowError::InvalidInput => ErrorCode::InvalidInput,
            WorkflowError::NotConnected => ErrorCode::NotConnected,
            WorkflowError::PaymentInProgress => ErrorCode::PaymentInProgress,
            WorkflowError::TransactionFailed => ErrorCode::TransactionFailed,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            WorkflowError::WalletUnavailable => {
                "Please install a Stellar wallet (or configure a wallet secret) to continue."
            }
            WorkflowError::ConnectionFailed => "Failed to connect wallet. Please try again.",
            WorkflowError::InvalidInput => "Please fill in recipient and amount.",
            WorkflowError::NotConnected => "Connect a wallet before sending a payment.",
            WorkflowError::PaymentInProgress => "A payment is already being sent.",
            WorkflowError::TransactionFailed => {
                "Transaction Failed. Check the address and amount and try again."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&WorkflowError> for ErrorReport {
    fn from(value: &WorkflowError) -> Self {
        Self {
            code: value.code(),
            message: value.user_message().to_string(),
        }
    }
}
