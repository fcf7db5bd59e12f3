use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{AccountAddress, BalanceView, PaymentDraft, PaymentOutcome, Session, TxHash},
    error::WorkflowError,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

pub mod config;
pub mod error;
pub mod horizon;
pub mod strkey;
pub mod transaction;
pub mod wallet;

use config::{Settings, TESTNET_EXPLORER_URL};
use error::{LedgerError, PaymentStageError, SetupError, WalletError};
use horizon::HorizonClient;
use transaction::{
    Amount, Operation, TransactionBuilder, TransactionEnvelope, BASE_FEE, TESTNET_PASSPHRASE,
};
use wallet::{AccessPolicy, LocalKeyWallet, MissingWallet};

/// Validity window applied to every payment, in seconds.
pub const PAYMENT_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn check_connected(&self) -> Result<bool, WalletError>;
    async fn request_access(&self) -> Result<(), WalletError>;
    async fn get_address(&self) -> Result<AccountAddress, WalletError>;
    /// Returns the signed envelope.
    async fn sign_transaction(
        &self,
        envelope: &str,
        network_passphrase: &str,
    ) -> Result<String, WalletError>;
}

#[async_trait]
pub trait LedgerProvider: Send + Sync {
    async fn load_account(&self, address: &AccountAddress) -> Result<AccountState, LedgerError>;
    async fn submit_transaction(&self, envelope: &str)
        -> Result<SubmittedTransaction, LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub account_id: AccountAddress,
    pub sequence: i64,
    pub native_balance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub hash: TxHash,
    pub ledger: Option<u64>,
}

/// Read-only view handed to rendering layers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerSnapshot {
    pub session: Option<Session>,
    pub balance: BalanceView,
    pub outcome: PaymentOutcome,
    /// `testnet`, `public` or `custom`.
    pub network: String,
    /// Explorer page for the last successful payment.
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    StateChanged(ControllerSnapshot),
    BalanceRefreshed {
        address: AccountAddress,
        balance: BalanceView,
    },
}

/// Balance display state for `address`; every failure degrades to `Unfunded`.
pub async fn lookup_balance(ledger: &dyn LedgerProvider, address: &AccountAddress) -> BalanceView {
    match ledger.load_account(address).await {
        Ok(account) => BalanceView::Available(
            account
                .native_balance
                .unwrap_or_else(|| "0".to_string()),
        ),
        Err(LedgerError::NotFound(_)) => {
            info!(address = %address, "balance: account not funded yet");
            BalanceView::Unfunded
        }
        Err(err) => {
            warn!(address = %address, "balance: lookup failed, reporting unfunded: {err}");
            BalanceView::Unfunded
        }
    }
}

struct ControllerState {
    session: Option<Session>,
    balance: BalanceView,
    outcome: PaymentOutcome,
    /// Bumped whenever the session is replaced or dropped; results from
    /// calls started under an older generation are discarded.
    generation: u64,
}

impl ControllerState {
    fn snapshot(&self, network_passphrase: &str, explorer_base_url: &str) -> ControllerSnapshot {
        let explorer_url = match &self.outcome {
            PaymentOutcome::Succeeded { hash } => {
                Some(config::explorer_tx_url(explorer_base_url, hash))
            }
            _ => None,
        };
        ControllerSnapshot {
            session: self.session.clone(),
            balance: self.balance.clone(),
            outcome: self.outcome.clone(),
            network: config::network_label(network_passphrase).to_string(),
            explorer_url,
        }
    }

    fn is_current(&self, address: &AccountAddress, generation: u64) -> bool {
        self.generation == generation
            && self
                .session
                .as_ref()
                .is_some_and(|session| &session.address == address)
    }
}

pub struct PaymentController {
    wallet: Arc<dyn WalletProvider>,
    ledger: Arc<dyn LedgerProvider>,
    network_passphrase: String,
    explorer_base_url: String,
    base_fee: u32,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl PaymentController {
    pub fn new(wallet: Arc<dyn WalletProvider>, ledger: Arc<dyn LedgerProvider>) -> Arc<Self> {
        Self::new_with_network(
            wallet,
            ledger,
            TESTNET_PASSPHRASE,
            TESTNET_EXPLORER_URL,
            BASE_FEE,
        )
    }

    pub fn new_with_network(
        wallet: Arc<dyn WalletProvider>,
        ledger: Arc<dyn LedgerProvider>,
        network_passphrase: impl Into<String>,
        explorer_base_url: impl Into<String>,
        base_fee: u32,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            wallet,
            ledger,
            network_passphrase: network_passphrase.into(),
            explorer_base_url: explorer_base_url.into(),
            base_fee,
            inner: Mutex::new(ControllerState {
                session: None,
                balance: BalanceView::Unknown,
                outcome: PaymentOutcome::Idle,
                generation: 0,
            }),
            events,
        })
    }

    /// Horizon ledger plus a local signer when `wallet_secret` is set;
    /// without one the wallet reports itself unavailable.
    pub fn from_settings(settings: &Settings) -> Result<Arc<Self>, SetupError> {
        let ledger = HorizonClient::new(&settings.horizon_url).map_err(SetupError::Ledger)?;
        let wallet: Arc<dyn WalletProvider> = match &settings.wallet_secret {
            Some(secret) => {
                let policy = if settings.auto_approve {
                    AccessPolicy::AutoApprove
                } else {
                    AccessPolicy::Deny
                };
                Arc::new(
                    LocalKeyWallet::from_secret_seed(secret, policy).map_err(SetupError::Wallet)?,
                )
            }
            None => Arc::new(MissingWallet),
        };
        Ok(Self::new_with_network(
            wallet,
            Arc::new(ledger),
            settings.network_passphrase.clone(),
            settings.explorer_base_url.clone(),
            settings.base_fee,
        ))
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.inner
            .lock()
            .await
            .snapshot(&self.network_passphrase, &self.explorer_base_url)
    }

    async fn publish_state(&self) {
        let snapshot = self.snapshot().await;
        let _ = self.events.send(ControllerEvent::StateChanged(snapshot));
    }

    pub async fn connect(&self) -> Result<Session, WorkflowError> {
        let available = self.wallet.check_connected().await.map_err(|err| {
            error!("wallet: presence check failed: {err}");
            WorkflowError::ConnectionFailed
        })?;
        if !available {
            info!("wallet: no wallet available");
            return Err(WorkflowError::WalletUnavailable);
        }

        let address = self.authorize().await.map_err(|err| {
            error!("wallet: connection failed: {err}");
            WorkflowError::ConnectionFailed
        })?;
        if address.as_str().trim().is_empty() {
            error!("wallet: returned an empty address");
            return Err(WorkflowError::ConnectionFailed);
        }

        let session = Session { address };
        {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            guard.session = Some(session.clone());
            guard.balance = BalanceView::Unknown;
            guard.outcome = PaymentOutcome::Idle;
        }
        info!(address = %session.address, "wallet: connected");
        self.publish_state().await;

        self.refresh_balance(&session.address).await;
        Ok(session)
    }

    async fn authorize(&self) -> Result<AccountAddress, WalletError> {
        self.wallet.request_access().await?;
        self.wallet.get_address().await
    }

    /// Local only; the wallet's own authorization is left alone.
    pub async fn disconnect(&self) {
        {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            guard.session = None;
            guard.balance = BalanceView::Unknown;
            guard.outcome = PaymentOutcome::Idle;
        }
        info!("wallet: disconnected");
        self.publish_state().await;
    }

    /// Recomputes the balance for the current session address. Requests for
    /// any other address are ignored and report `Unknown`.
    pub async fn refresh_balance(&self, address: &AccountAddress) -> BalanceView {
        let generation = {
            let guard = self.inner.lock().await;
            if !guard.is_current(address, guard.generation) {
                debug!(address = %address, "balance: address is not the active session");
                return BalanceView::Unknown;
            }
            guard.generation
        };

        let balance = lookup_balance(self.ledger.as_ref(), address).await;

        let applied = {
            let mut guard = self.inner.lock().await;
            if guard.is_current(address, generation) {
                guard.balance = balance.clone();
                true
            } else {
                false
            }
        };
        if applied {
            self.publish_state().await;
            let _ = self.events.send(ControllerEvent::BalanceRefreshed {
                address: address.clone(),
                balance: balance.clone(),
            });
        } else {
            debug!(address = %address, "balance: session changed during lookup, dropping result");
        }
        balance
    }

    pub async fn submit_payment(
        self: &Arc<Self>,
        draft: &PaymentDraft,
    ) -> Result<TxHash, WorkflowError> {
        if !draft.is_complete() {
            return Err(WorkflowError::InvalidInput);
        }

        let (address, generation) = {
            let mut guard = self.inner.lock().await;
            let address = guard
                .session
                .as_ref()
                .map(|session| session.address.clone())
                .ok_or(WorkflowError::NotConnected)?;
            if guard.outcome.is_pending() {
                return Err(WorkflowError::PaymentInProgress);
            }
            guard.outcome = PaymentOutcome::Pending;
            (address, guard.generation)
        };
        info!(
            source = %address,
            destination = %draft.recipient.trim(),
            amount = %draft.amount.trim(),
            "payment: submitting"
        );
        self.publish_state().await;

        let result = self.execute_payment(&address, draft).await;

        let outcome = match &result {
            Ok(hash) => PaymentOutcome::Succeeded { hash: hash.clone() },
            Err(err) => {
                error!(source = %address, "payment: failed: {err}");
                PaymentOutcome::Failed
            }
        };
        let applied = {
            let mut guard = self.inner.lock().await;
            if guard.is_current(&address, generation) {
                guard.outcome = outcome;
                true
            } else {
                false
            }
        };
        if applied {
            self.publish_state().await;
        } else {
            debug!("payment: session changed while in flight, outcome not recorded");
        }

        let hash = result.map_err(|_| WorkflowError::TransactionFailed)?;
        info!(hash = %hash, "payment: succeeded");
        if applied {
            let controller = Arc::clone(self);
            tokio::spawn(async move {
                controller.refresh_balance(&address).await;
            });
        }
        Ok(hash)
    }

    async fn execute_payment(
        &self,
        address: &AccountAddress,
        draft: &PaymentDraft,
    ) -> Result<TxHash, PaymentStageError> {
        let account = self
            .ledger
            .load_account(address)
            .await
            .map_err(PaymentStageError::LoadAccount)?;

        let amount = Amount::parse(&draft.amount).map_err(PaymentStageError::Build)?;
        let tx = TransactionBuilder::new(account.account_id.as_str(), account.sequence, self.base_fee)
            .add_operation(Operation::native_payment(draft.recipient.trim(), amount))
            .set_timeout(PAYMENT_TIMEOUT_SECS)
            .build()
            .map_err(PaymentStageError::Build)?;
        let expected_hash = tx
            .hash(&self.network_passphrase)
            .map_err(PaymentStageError::Build)?;
        let unsigned = TransactionEnvelope::unsigned(tx)
            .encode()
            .map_err(PaymentStageError::Build)?;
        debug!(source = %address, "payment: requesting signature");

        let signed = self
            .wallet
            .sign_transaction(&unsigned, &self.network_passphrase)
            .await
            .map_err(PaymentStageError::Sign)?;

        let envelope = TransactionEnvelope::from_signed(&signed, &self.network_passphrase)
            .map_err(PaymentStageError::Reconstruct)?;
        let signed_hash = envelope
            .tx
            .hash(&self.network_passphrase)
            .map_err(PaymentStageError::Reconstruct)?;
        if signed_hash != expected_hash {
            return Err(PaymentStageError::Tampered);
        }
        let encoded = envelope.encode().map_err(PaymentStageError::Reconstruct)?;

        let submitted = self
            .ledger
            .submit_transaction(&encoded)
            .await
            .map_err(PaymentStageError::Submit)?;
        debug!(hash = %submitted.hash, ledger = ?submitted.ledger, "payment: accepted by ledger");
        Ok(submitted.hash)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
