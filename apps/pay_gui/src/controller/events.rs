//! UI/backend events and error modeling for the payment GUI.

use payment_core::ControllerSnapshot;
use shared::{
    domain::{Session, TxHash},
    error::{ErrorCode, WorkflowError},
};

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    Error(UiError),
    StateChanged(ControllerSnapshot),
    ConnectFinished(Result<Session, UiError>),
    PaymentFinished(Result<TxHash, UiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connect,
    SendPayment,
}

#[derive(Debug, Clone)]
pub struct UiError {
    code: Option<ErrorCode>,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_workflow(context: UiErrorContext, err: &WorkflowError) -> Self {
        Self {
            code: Some(err.code()),
            context,
            message: err.user_message().to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            code: None,
            context,
            message: message.into(),
        }
    }

    /// Failed payments are already rendered from controller state.
    pub fn shown_in_payment_panel(&self) -> bool {
        self.code == Some(ErrorCode::TransactionFailed)
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_errors_use_user_facing_copy() {
        let err = UiError::from_workflow(UiErrorContext::Connect, &WorkflowError::WalletUnavailable);
        assert_eq!(err.code(), Some(ErrorCode::WalletUnavailable));
        assert_eq!(err.context(), UiErrorContext::Connect);
        assert!(err.message().contains("install"));
        assert!(!err.shown_in_payment_panel());
    }

    #[test]
    fn transaction_failures_defer_to_payment_panel() {
        let err = UiError::from_workflow(
            UiErrorContext::SendPayment,
            &WorkflowError::TransactionFailed,
        );
        assert!(err.shown_in_payment_panel());
        assert_eq!(
            err.message(),
            "Transaction Failed. Check the address and amount and try again."
        );
    }

    #[test]
    fn free_form_errors_carry_no_code() {
        let err = UiError::from_message(UiErrorContext::BackendStartup, "runtime failed");
        assert_eq!(err.code(), None);
        assert_eq!(err.message(), "runtime failed");
    }
}
