//! Wallet provider implementations usable outside a browser extension.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use shared::domain::AccountAddress;
use tracing::{debug, info};

use crate::{error::WalletError, strkey, transaction::TransactionEnvelope, WalletProvider};

/// Stand-in used when no signer is configured; reports itself absent.
pub struct MissingWallet;

#[async_trait]
impl WalletProvider for MissingWallet {
    async fn check_connected(&self) -> Result<bool, WalletError> {
        Ok(false)
    }

    async fn request_access(&self) -> Result<(), WalletError> {
        Err(WalletError::Extension("wallet is unavailable".to_string()))
    }

    async fn get_address(&self) -> Result<AccountAddress, WalletError> {
        Err(WalletError::Extension("wallet is unavailable".to_string()))
    }

    async fn sign_transaction(
        &self,
        _envelope: &str,
        _network_passphrase: &str,
    ) -> Result<String, WalletError> {
        Err(WalletError::Extension("wallet is unavailable".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    AutoApprove,
    Deny,
}

/// Signs with an ed25519 key held in process memory.
pub struct LocalKeyWallet {
    signing_key: SigningKey,
    address: AccountAddress,
    policy: AccessPolicy,
    access_granted: AtomicBool,
}

impl LocalKeyWallet {
    pub fn new(signing_key: SigningKey, policy: AccessPolicy) -> Self {
        let address = AccountAddress::new(strkey::encode_account_id(
            &signing_key.verifying_key().to_bytes(),
        ));
        Self {
            signing_key,
            address,
            policy,
            access_granted: AtomicBool::new(false),
        }
    }

    pub fn from_secret_seed(seed: &str, policy: AccessPolicy) -> Result<Self, WalletError> {
        let bytes = strkey::decode_secret_seed(seed.trim())
            .map_err(|err| WalletError::Extension(format!("invalid secret seed: {err}")))?;
        Ok(Self::new(SigningKey::from_bytes(&bytes), policy))
    }

    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    fn ensure_access(&self) -> Result<(), WalletError> {
        if self.access_granted.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(WalletError::AccessDenied(
                "site has not been granted access".to_string(),
            ))
        }
    }
}

#[async_trait]
impl WalletProvider for LocalKeyWallet {
    async fn check_connected(&self) -> Result<bool, WalletError> {
        Ok(true)
    }

    async fn request_access(&self) -> Result<(), WalletError> {
        match self.policy {
            AccessPolicy::AutoApprove => {
                self.access_granted.store(true, Ordering::Release);
                info!(address = %self.address, "wallet: access granted");
                Ok(())
            }
            AccessPolicy::Deny => Err(WalletError::AccessDenied(
                "user rejected the access request".to_string(),
            )),
        }
    }

    async fn get_address(&self) -> Result<AccountAddress, WalletError> {
        self.ensure_access()?;
        Ok(self.address.clone())
    }

    async fn sign_transaction(
        &self,
        envelope: &str,
        network_passphrase: &str,
    ) -> Result<String, WalletError> {
        self.ensure_access()?;
        let mut envelope = TransactionEnvelope::decode(envelope)
            .map_err(|err| WalletError::Rejected(err.to_string()))?;
        if envelope.tx.source_account != self.address.as_str() {
            return Err(WalletError::Rejected(format!(
                "transaction source {} is not this wallet",
                envelope.tx.source_account
            )));
        }

        let hash = envelope
            .tx
            .hash(network_passphrase)
            .map_err(|err| WalletError::Extension(err.to_string()))?;
        let signature = self.signing_key.sign(&hash);
        envelope.add_signature(
            &self.signing_key.verifying_key().to_bytes(),
            &signature.to_bytes(),
        );
        debug!(seq_num = envelope.tx.seq_num, "wallet: transaction signed");

        envelope
            .encode()
            .map_err(|err| WalletError::Extension(err.to_string()))
    }
}
