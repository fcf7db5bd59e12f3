//! Backend commands queued from UI to backend worker.

use shared::domain::PaymentDraft;

pub enum BackendCommand {
    Connect,
    Disconnect,
    SubmitPayment { draft: PaymentDraft },
}
