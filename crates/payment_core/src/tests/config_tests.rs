use super::*;

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults_target_testnet() {
    let settings = Settings::default();
    assert_eq!(settings.horizon_url, "https://horizon-testnet.stellar.org");
    assert_eq!(settings.network_passphrase, TESTNET_PASSPHRASE);
    assert_eq!(settings.base_fee, 100);
    assert_eq!(settings.network_label(), "testnet");
    assert!(settings.wallet_secret.is_none());
}

#[test]
fn builds_explorer_links_from_hash() {
    let settings = Settings::default();
    assert_eq!(
        settings.explorer_tx_url(&TxHash::new("deadbeef")),
        "https://stellar.expert/explorer/testnet/tx/deadbeef"
    );
    assert_eq!(
        explorer_tx_url("https://example.test/explorer/", &TxHash::new("abc")),
        "https://example.test/explorer/tx/abc"
    );
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
            horizon_url = "http://127.0.0.1:8000"
            network_passphrase = "Public Global Stellar Network ; September 2015"
            base_fee = 250
            auto_approve = false
        "#,
    );

    assert_eq!(settings.horizon_url, "http://127.0.0.1:8000");
    assert_eq!(settings.network_label(), "public");
    assert_eq!(settings.base_fee, 250);
    assert!(!settings.auto_approve);
    assert_eq!(settings.explorer_base_url, TESTNET_EXPLORER_URL);
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, "horizon_url = [unterminated");
    assert_eq!(settings, Settings::default());
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("HORIZON_URL", "http://plain"),
            ("APP__HORIZON_URL", "http://prefixed"),
            ("BASE_FEE", "not-a-number"),
            ("WALLET_SECRET", "  "),
        ]),
    );

    assert_eq!(settings.horizon_url, "http://prefixed");
    assert_eq!(settings.base_fee, 100);
    assert!(settings.wallet_secret.is_none());
}

#[test]
fn loads_file_from_explicit_path() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("stellar_pay_settings_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("mkdir");
    let path = temp_root.join(SETTINGS_FILE_NAME);
    fs::write(&path, "explorer_base_url = \"https://explorer.local\"\n").expect("write");

    let settings = load_settings_from(Some(&path));
    assert_eq!(settings.explorer_base_url, "https://explorer.local");

    fs::remove_dir_all(temp_root).expect("cleanup");
}
