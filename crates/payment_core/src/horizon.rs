//! Ledger provider backed by the Horizon REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::{AccountAddress, TxHash},
    protocol::{HorizonAccount, HorizonProblem, SubmitTransactionResponse},
};
use tracing::{debug, warn};
use url::Url;

use crate::{error::LedgerError, AccountState, LedgerProvider, SubmittedTransaction};

pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";

#[derive(Debug, Clone)]
pub struct HorizonClient {
    http: Client,
    base_url: Url,
}

impl HorizonClient {
    pub fn new(horizon_url: &str) -> Result<Self, LedgerError> {
        let mut base_url = Url::parse(horizon_url.trim())
            .map_err(|err| LedgerError::Transport(format!("invalid horizon url: {err}")))?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, LedgerError> {
        self.base_url
            .join(path)
            .map_err(|err| LedgerError::Transport(format!("invalid horizon path '{path}': {err}")))
    }
}

#[async_trait]
impl LedgerProvider for HorizonClient {
    async fn load_account(&self, address: &AccountAddress) -> Result<AccountState, LedgerError> {
        let url = self.endpoint(&format!("accounts/{}", address.as_str()))?;
        debug!(%url, "horizon: loading account");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| LedgerError::Transport(err.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound(address.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|err| LedgerError::Transport(err.to_string()))?;
        let account: HorizonAccount = response
            .json()
            .await
            .map_err(|err| LedgerError::Decode(err.to_string()))?;

        AccountState::try_from(account)
    }

    async fn submit_transaction(
        &self,
        envelope: &str,
    ) -> Result<SubmittedTransaction, LedgerError> {
        let url = self.endpoint("transactions")?;
        let response = self
            .http
            .post(url)
            .form(&[("tx", envelope)])
            .send()
            .await
            .map_err(|err| LedgerError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|err| LedgerError::Transport(err.to_string()))?;
            return Err(match serde_json::from_str::<HorizonProblem>(&body) {
                Ok(problem) => {
                    warn!(
                        status = problem.status,
                        title = %problem.title,
                        "horizon: transaction rejected"
                    );
                    LedgerError::Rejected {
                        result_codes: problem.result_codes(),
                        title: problem.title,
                    }
                }
                Err(_) => LedgerError::Transport(format!("horizon returned {status}")),
            });
        }

        let body: SubmitTransactionResponse = response
            .json()
            .await
            .map_err(|err| LedgerError::Decode(err.to_string()))?;
        Ok(SubmittedTransaction {
            hash: TxHash::new(body.hash),
            ledger: body.ledger,
        })
    }
}

impl TryFrom<HorizonAccount> for AccountState {
    type Error = LedgerError;

    fn try_from(account: HorizonAccount) -> Result<Self, Self::Error> {
        let sequence = account.sequence.parse::<i64>().map_err(|err| {
            LedgerError::Decode(format!("invalid sequence '{}': {err}", account.sequence))
        })?;
        let native_balance = account.native_balance().map(str::to_string);
        Ok(AccountState {
            account_id: AccountAddress::new(account.account_id),
            sequence,
            native_balance,
        })
    }
}

#[cfg(test)]
#[path = "tests/horizon_tests.rs"]
mod tests;
