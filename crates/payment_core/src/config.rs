use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use shared::domain::TxHash;
use tracing::warn;

use crate::{
    horizon::TESTNET_HORIZON_URL,
    transaction::{BASE_FEE, PUBLIC_PASSPHRASE, TESTNET_PASSPHRASE},
};

pub const SETTINGS_FILE_NAME: &str = "payment.toml";
pub const TESTNET_EXPLORER_URL: &str = "https://stellar.expert/explorer/testnet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub horizon_url: String,
    pub network_passphrase: String,
    pub explorer_base_url: String,
    pub base_fee: u32,
    pub wallet_secret: Option<String>,
    pub auto_approve: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            horizon_url: TESTNET_HORIZON_URL.into(),
            network_passphrase: TESTNET_PASSPHRASE.into(),
            explorer_base_url: TESTNET_EXPLORER_URL.into(),
            base_fee: BASE_FEE,
            wallet_secret: None,
            auto_approve: true,
        }
    }
}

impl Settings {
    pub fn explorer_tx_url(&self, hash: &TxHash) -> String {
        explorer_tx_url(&self.explorer_base_url, hash)
    }

    pub fn network_label(&self) -> &'static str {
        network_label(&self.network_passphrase)
    }
}

pub fn network_label(network_passphrase: &str) -> &'static str {
    match network_passphrase {
        TESTNET_PASSPHRASE => "testnet",
        PUBLIC_PASSPHRASE => "public",
        _ => "custom",
    }
}

pub fn explorer_tx_url(base: &str, hash: &TxHash) -> String {
    format!("{}/tx/{}", base.trim_end_matches('/'), hash.as_str())
}

/// `payment.toml` in the working directory, else the per-user config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    let local = PathBuf::from(SETTINGS_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|dir| dir.join("stellar_pay").join(SETTINGS_FILE_NAME))
}

pub fn load_settings() -> Settings {
    load_settings_from(default_settings_path().as_deref())
}

pub fn load_settings_from(path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    if let Some(path) = path {
        if let Ok(raw) = fs::read_to_string(path) {
            apply_file_overrides(&mut settings, &raw);
        }
    }
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    settings
}

pub fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let table = match toml::from_str::<toml::Table>(raw) {
        Ok(table) => table,
        Err(err) => {
            warn!("ignoring unreadable settings file: {err}");
            return;
        }
    };

    if let Some(v) = table.get("horizon_url").and_then(|v| v.as_str()) {
        settings.horizon_url = v.to_string();
    }
    if let Some(v) = table.get("network_passphrase").and_then(|v| v.as_str()) {
        settings.network_passphrase = v.to_string();
    }
    if let Some(v) = table.get("explorer_base_url").and_then(|v| v.as_str()) {
        settings.explorer_base_url = v.to_string();
    }
    if let Some(v) = table
        .get("base_fee")
        .and_then(|v| v.as_integer())
        .and_then(|v| u32::try_from(v).ok())
    {
        settings.base_fee = v;
    }
    if let Some(v) = table.get("wallet_secret").and_then(|v| v.as_str()) {
        settings.wallet_secret = Some(v.to_string());
    }
    if let Some(v) = table.get("auto_approve").and_then(|v| v.as_bool()) {
        settings.auto_approve = v;
    }
}

/// Plain names first, then `APP__` prefixed ones, which win.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for name in ["HORIZON_URL", "APP__HORIZON_URL"] {
        if let Some(v) = lookup(name) {
            settings.horizon_url = v;
        }
    }
    for name in ["NETWORK_PASSPHRASE", "APP__NETWORK_PASSPHRASE"] {
        if let Some(v) = lookup(name) {
            settings.network_passphrase = v;
        }
    }
    for name in ["EXPLORER_BASE_URL", "APP__EXPLORER_BASE_URL"] {
        if let Some(v) = lookup(name) {
            settings.explorer_base_url = v;
        }
    }
    for name in ["BASE_FEE", "APP__BASE_FEE"] {
        if let Some(v) = lookup(name) {
            match v.trim().parse::<u32>() {
                Ok(fee) => settings.base_fee = fee,
                Err(err) => warn!("ignoring {name}={v}: {err}"),
            }
        }
    }
    for name in ["WALLET_SECRET", "APP__WALLET_SECRET"] {
        if let Some(v) = lookup(name) {
            if !v.trim().is_empty() {
                settings.wallet_secret = Some(v);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
