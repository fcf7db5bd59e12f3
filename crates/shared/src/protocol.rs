//! Horizon REST payloads consumed by the ledger client.

use serde::{Deserialize, Serialize};

pub const NATIVE_ASSET_TYPE: &str = "native";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonBalance {
    pub balance: String,
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_issuer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonAccount {
    pub account_id: String,
    /// Horizon encodes the 64-bit sequence number as a string.
    pub sequence: String,
    #[serde(default)]
    pub balances: Vec<HorizonBalance>,
}

impl HorizonAccount {
    pub fn native_balance(&self) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| b.asset_type == NATIVE_ASSET_TYPE)
            .map(|b| b.balance.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTransactionResponse {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultCodes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemExtras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_codes: Option<ResultCodes>,
}

/// RFC 7807 style problem document returned on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonProblem {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<ProblemExtras>,
}

impl HorizonProblem {
    pub fn result_codes(&self) -> ResultCodes {
        self.extras
            .as_ref()
            .and_then(|extras| extras.result_codes.clone())
            .unwrap_or_default()
    }
}
