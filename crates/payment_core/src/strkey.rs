//! Account id (`G...`) and secret seed (`S...`) conversions.

use stellar_strkey::{
    ed25519::{PrivateKey, PublicKey},
    Strkey,
};
use thiserror::Error;

const KEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrkeyError {
    #[error("not a valid strkey")]
    Invalid,
    #[error("strkey is not {expected}")]
    WrongKind { expected: &'static str },
}

pub fn encode_account_id(public_key: &[u8; KEY_LEN]) -> String {
    PublicKey(*public_key).to_string()
}

pub fn decode_account_id(encoded: &str) -> Result<[u8; KEY_LEN], StrkeyError> {
    match Strkey::from_string(encoded).map_err(|_| StrkeyError::Invalid)? {
        Strkey::PublicKeyEd25519(key) => Ok(key.0),
        _ => Err(StrkeyError::WrongKind {
            expected: "an account id",
        }),
    }
}

pub fn encode_secret_seed(seed: &[u8; KEY_LEN]) -> String {
    PrivateKey(*seed).to_string()
}

pub fn decode_secret_seed(encoded: &str) -> Result<[u8; KEY_LEN], StrkeyError> {
    match Strkey::from_string(encoded).map_err(|_| StrkeyError::Invalid)? {
        Strkey::PrivateKeyEd25519(seed) => Ok(seed.0),
        _ => Err(StrkeyError::WrongKind {
            expected: "a secret seed",
        }),
    }
}

pub fn is_valid_account_id(encoded: &str) -> bool {
    decode_account_id(encoded).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_key_matches_known_account_id() {
        assert_eq!(
            encode_account_id(&[0u8; KEY_LEN]),
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        );
    }

    #[test]
    fn account_ids_and_seeds_use_their_prefixes() {
        let key = [42u8; KEY_LEN];
        let account = encode_account_id(&key);
        let seed = encode_secret_seed(&key);

        assert!(account.starts_with('G'));
        assert!(seed.starts_with('S'));
        assert_eq!(account.len(), 56);
        assert_eq!(decode_account_id(&account), Ok(key));
        assert_eq!(decode_secret_seed(&seed), Ok(key));
    }

    #[test]
    fn rejects_seed_where_account_expected() {
        let seed = encode_secret_seed(&[1u8; KEY_LEN]);
        assert!(matches!(
            decode_account_id(&seed),
            Err(StrkeyError::WrongKind { .. })
        ));
        let account = encode_account_id(&[1u8; KEY_LEN]);
        assert!(matches!(
            decode_secret_seed(&account),
            Err(StrkeyError::WrongKind { .. })
        ));
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut account = encode_account_id(&[9u8; KEY_LEN]).into_bytes();
        account[10] = if account[10] == b'A' { b'B' } else { b'A' };
        let account = String::from_utf8(account).expect("ascii");
        assert_eq!(decode_account_id(&account), Err(StrkeyError::Invalid));
    }

    #[test]
    fn rejects_wrong_length_and_alphabet() {
        assert_eq!(decode_account_id("GABC"), Err(StrkeyError::Invalid));
        assert_eq!(
            decode_account_id(&"g".repeat(56)),
            Err(StrkeyError::Invalid)
        );
    }
}
