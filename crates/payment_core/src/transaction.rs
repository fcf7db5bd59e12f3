//! Payment transaction model, builder and envelope encoding.
//!
//! Transactions are held in a small domain model and converted to Stellar
//! XDR for hashing and transport. Envelopes travel as base64 of the XDR
//! `TransactionEnvelope`; hashes are SHA-256 of the XDR signature payload, so
//! a signature produced for one network never verifies on another.

use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use stellar_xdr::curr as xdr;
use stellar_xdr::curr::{Limits, ReadXdr, WriteXdr};
use thiserror::Error;

use crate::strkey::{self, StrkeyError};

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
/// Fee per operation, in stroops.
pub const BASE_FEE: u32 = 100;
pub const STROOPS_PER_XLM: i64 = 10_000_000;
const AMOUNT_DECIMALS: usize = 7;
const MEMO_TEXT_MAX: usize = 28;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("invalid account address '{address}': {source}")]
    InvalidAddress {
        address: String,
        source: StrkeyError,
    },
    #[error("transaction has no operations")]
    NoOperations,
    #[error("transaction timeout was not set")]
    TimeoutNotSet,
    #[error("memo text exceeds 28 bytes")]
    MemoTooLong,
    #[error("fee or sequence number overflow")]
    Overflow,
    #[error("malformed transaction envelope: {0}")]
    Envelope(String),
    #[error("unsupported transaction: {0}")]
    Unsupported(&'static str),
    #[error("envelope carries no signature from the source account")]
    MissingSignature,
    #[error("signature does not verify for this network")]
    SignatureMismatch,
}

impl From<xdr::Error> for TransactionError {
    fn from(err: xdr::Error) -> Self {
        TransactionError::Envelope(err.to_string())
    }
}

/// A strictly positive native amount, held in stroops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    pub fn from_stroops(stroops: i64) -> Result<Self, TransactionError> {
        if stroops <= 0 {
            return Err(TransactionError::InvalidAmount(stroops.to_string()));
        }
        Ok(Self(stroops))
    }

    pub fn parse(input: &str) -> Result<Self, TransactionError> {
        let invalid = || TransactionError::InvalidAmount(input.to_string());
        let trimmed = input.trim();
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > AMOUNT_DECIMALS
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_value = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().map_err(|_| invalid())?
        };
        let fraction_value = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{fraction:0<width$}", width = AMOUNT_DECIMALS);
            padded.parse::<i64>().map_err(|_| invalid())?
        };

        let stroops = whole_value
            .checked_mul(STROOPS_PER_XLM)
            .and_then(|value| value.checked_add(fraction_value))
            .ok_or_else(invalid)?;
        if stroops == 0 {
            return Err(invalid());
        }
        Ok(Self(stroops))
    }

    pub fn stroops(self) -> i64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:07}",
            self.0 / STROOPS_PER_XLM,
            self.0 % STROOPS_PER_XLM
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Payment {
        destination: String,
        asset: Asset,
        /// Stroops.
        amount: i64,
    },
}

impl Operation {
    pub fn native_payment(destination: impl Into<String>, amount: Amount) -> Self {
        Operation::Payment {
            destination: destination.into(),
            asset: Asset::Native,
            amount: amount.stroops(),
        }
    }

    fn to_xdr(&self) -> Result<xdr::Operation, TransactionError> {
        let Operation::Payment {
            destination,
            asset: Asset::Native,
            amount,
        } = self;
        Ok(xdr::Operation {
            source_account: None,
            body: xdr::OperationBody::Payment(xdr::PaymentOp {
                destination: muxed_account(destination)?,
                asset: xdr::Asset::Native,
                amount: *amount,
            }),
        })
    }

    fn from_xdr(operation: &xdr::Operation) -> Result<Self, TransactionError> {
        if operation.source_account.is_some() {
            return Err(TransactionError::Unsupported("operation source account"));
        }
        match &operation.body {
            xdr::OperationBody::Payment(payment) => {
                if !matches!(payment.asset, xdr::Asset::Native) {
                    return Err(TransactionError::Unsupported("non-native asset"));
                }
                Ok(Operation::Payment {
                    destination: account_from_muxed(&payment.destination)?,
                    asset: Asset::Native,
                    amount: payment.amount,
                })
            }
            _ => Err(TransactionError::Unsupported("operation other than payment")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    /// Zero means unbounded.
    pub max_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Memo {
    #[default]
    None,
    Text(String),
}

impl Memo {
    fn to_xdr(&self) -> Result<xdr::Memo, TransactionError> {
        match self {
            Memo::None => Ok(xdr::Memo::None),
            Memo::Text(text) => {
                if text.len() > MEMO_TEXT_MAX {
                    return Err(TransactionError::MemoTooLong);
                }
                Ok(xdr::Memo::Text(text.clone().try_into()?))
            }
        }
    }

    fn from_xdr(memo: &xdr::Memo) -> Result<Self, TransactionError> {
        match memo {
            xdr::Memo::None => Ok(Memo::None),
            xdr::Memo::Text(text) => {
                String::from_utf8(text.to_vec())
                    .map(Memo::Text)
                    .map_err(|_| TransactionError::Envelope("memo text is not utf-8".into()))
            }
            _ => Err(TransactionError::Unsupported("memo other than text")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source_account: String,
    pub fee: u32,
    pub seq_num: i64,
    pub time_bounds: Option<TimeBounds>,
    pub memo: Memo,
    pub operations: Vec<Operation>,
}

pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

impl Transaction {
    pub fn to_xdr(&self) -> Result<xdr::Transaction, TransactionError> {
        let operations = self
            .operations
            .iter()
            .map(Operation::to_xdr)
            .collect::<Result<Vec<_>, _>>()?;
        let cond = match self.time_bounds {
            Some(bounds) => xdr::Preconditions::Time(xdr::TimeBounds {
                min_time: xdr::TimePoint(bounds.min_time),
                max_time: xdr::TimePoint(bounds.max_time),
            }),
            None => xdr::Preconditions::None,
        };
        Ok(xdr::Transaction {
            source_account: muxed_account(&self.source_account)?,
            fee: self.fee,
            seq_num: xdr::SequenceNumber(self.seq_num),
            cond,
            memo: self.memo.to_xdr()?,
            operations: operations.try_into()?,
            ext: xdr::TransactionExt::V0,
        })
    }

    pub fn from_xdr(tx: &xdr::Transaction) -> Result<Self, TransactionError> {
        let time_bounds = match &tx.cond {
            xdr::Preconditions::None => None,
            xdr::Preconditions::Time(bounds) => Some(TimeBounds {
                min_time: bounds.min_time.0,
                max_time: bounds.max_time.0,
            }),
            xdr::Preconditions::V2(_) => {
                return Err(TransactionError::Unsupported("v2 preconditions"))
            }
        };
        if !matches!(tx.ext, xdr::TransactionExt::V0) {
            return Err(TransactionError::Unsupported("transaction extension"));
        }
        let operations = tx
            .operations
            .iter()
            .map(Operation::from_xdr)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source_account: account_from_muxed(&tx.source_account)?,
            fee: tx.fee,
            seq_num: tx.seq_num.0,
            time_bounds,
            memo: Memo::from_xdr(&tx.memo)?,
            operations,
        })
    }

    /// Network-bound hash over the XDR signature payload; this is what
    /// signers sign and what the ledger reports as the transaction id.
    pub fn hash(&self, network_passphrase: &str) -> Result<[u8; 32], TransactionError> {
        let payload = xdr::TransactionSignaturePayload {
            network_id: xdr::Hash(network_id(network_passphrase)),
            tagged_transaction: xdr::TransactionSignaturePayloadTaggedTransaction::Tx(
                self.to_xdr()?,
            ),
        };
        let bytes = payload.to_xdr(Limits::none())?;
        Ok(Sha256::digest(&bytes).into())
    }

    pub fn hash_hex(&self, network_passphrase: &str) -> Result<String, TransactionError> {
        Ok(to_hex(&self.hash(network_passphrase)?))
    }
}

fn muxed_account(address: &str) -> Result<xdr::MuxedAccount, TransactionError> {
    let key = strkey::decode_account_id(address).map_err(|source| {
        TransactionError::InvalidAddress {
            address: address.to_string(),
            source,
        }
    })?;
    Ok(xdr::MuxedAccount::Ed25519(xdr::Uint256(key)))
}

fn account_from_muxed(account: &xdr::MuxedAccount) -> Result<String, TransactionError> {
    match account {
        xdr::MuxedAccount::Ed25519(key) => Ok(strkey::encode_account_id(&key.0)),
        xdr::MuxedAccount::MuxedEd25519(_) => {
            Err(TransactionError::Unsupported("muxed account"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    /// Last four bytes of the signer's public key.
    pub hint: [u8; 4],
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

impl TransactionEnvelope {
    pub fn unsigned(tx: Transaction) -> Self {
        Self {
            tx,
            signatures: Vec::new(),
        }
    }

    pub fn to_xdr(&self) -> Result<xdr::TransactionEnvelope, TransactionError> {
        let signatures = self
            .signatures
            .iter()
            .map(|sig| -> Result<xdr::DecoratedSignature, TransactionError> {
                Ok(xdr::DecoratedSignature {
                    hint: xdr::SignatureHint(sig.hint),
                    signature: xdr::Signature(sig.signature.clone().try_into()?),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
            tx: self.tx.to_xdr()?,
            signatures: signatures.try_into()?,
        }))
    }

    pub fn from_xdr(envelope: &xdr::TransactionEnvelope) -> Result<Self, TransactionError> {
        let xdr::TransactionEnvelope::Tx(v1) = envelope else {
            return Err(TransactionError::Unsupported(
                "envelope other than a v1 transaction",
            ));
        };
        let signatures = v1
            .signatures
            .iter()
            .map(|sig| DecoratedSignature {
                hint: sig.hint.0,
                signature: sig.signature.0.to_vec(),
            })
            .collect();
        Ok(Self {
            tx: Transaction::from_xdr(&v1.tx)?,
            signatures,
        })
    }

    /// Base64 XDR, the form wallets sign and Horizon accepts.
    pub fn encode(&self) -> Result<String, TransactionError> {
        let bytes = self.to_xdr()?.to_xdr(Limits::none())?;
        Ok(STANDARD.encode(bytes))
    }

    pub fn decode(encoded: &str) -> Result<Self, TransactionError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| TransactionError::Envelope(format!("invalid base64: {e}")))?;
        let envelope = xdr::TransactionEnvelope::from_xdr(bytes, Limits::none())?;
        Self::from_xdr(&envelope)
    }

    pub fn add_signature(&mut self, public_key: &[u8; 32], signature: &[u8; 64]) {
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public_key[28..]);
        self.signatures.push(DecoratedSignature {
            hint,
            signature: signature.to_vec(),
        });
    }

    /// Rebuilds a signed envelope bound to `network_passphrase`.
    ///
    /// Every signature hinted at the source account must verify against the
    /// hash for this network, and at least one such signature must exist.
    pub fn from_signed(encoded: &str, network_passphrase: &str) -> Result<Self, TransactionError> {
        let envelope = Self::decode(encoded)?;
        let source_key = strkey::decode_account_id(&envelope.tx.source_account).map_err(|e| {
            TransactionError::InvalidAddress {
                address: envelope.tx.source_account.clone(),
                source: e,
            }
        })?;
        let verifying_key =
            VerifyingKey::from_bytes(&source_key).map_err(|_| TransactionError::SignatureMismatch)?;
        let hash = envelope.tx.hash(network_passphrase)?;

        let mut verified = 0usize;
        for decorated in envelope
            .signatures
            .iter()
            .filter(|sig| sig.hint[..] == source_key[28..])
        {
            let bytes: [u8; 64] = decorated
                .signature
                .as_slice()
                .try_into()
                .map_err(|_| TransactionError::Envelope("signature must be 64 bytes".into()))?;
            verifying_key
                .verify(&hash, &Signature::from_bytes(&bytes))
                .map_err(|_| TransactionError::SignatureMismatch)?;
            verified += 1;
        }

        if verified == 0 {
            return Err(TransactionError::MissingSignature);
        }
        Ok(envelope)
    }
}

pub struct TransactionBuilder {
    source_account: String,
    sequence: i64,
    base_fee: u32,
    memo: Memo,
    operations: Vec<Operation>,
    timeout_secs: Option<u64>,
}

impl TransactionBuilder {
    /// `sequence` is the account's current sequence; the built transaction
    /// uses the next one.
    pub fn new(source_account: impl Into<String>, sequence: i64, base_fee: u32) -> Self {
        Self {
            source_account: source_account.into(),
            sequence,
            base_fee,
            memo: Memo::None,
            operations: Vec::new(),
            timeout_secs: None,
        }
    }

    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn add_memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    /// Zero means no upper time bound.
    pub fn set_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<Transaction, TransactionError> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        self.build_at(now)
    }

    pub fn build_at(self, now_unix: u64) -> Result<Transaction, TransactionError> {
        validate_account(&self.source_account)?;
        if self.operations.is_empty() {
            return Err(TransactionError::NoOperations);
        }
        for operation in &self.operations {
            let Operation::Payment {
                destination,
                amount,
                ..
            } = operation;
            validate_account(destination)?;
            Amount::from_stroops(*amount)?;
        }

        let timeout_secs = self.timeout_secs.ok_or(TransactionError::TimeoutNotSet)?;
        let max_time = if timeout_secs == 0 {
            0
        } else {
            now_unix
                .checked_add(timeout_secs)
                .ok_or(TransactionError::Overflow)?
        };

        let operation_count =
            u32::try_from(self.operations.len()).map_err(|_| TransactionError::Overflow)?;
        let fee = self
            .base_fee
            .checked_mul(operation_count)
            .ok_or(TransactionError::Overflow)?;
        let seq_num = self
            .sequence
            .checked_add(1)
            .ok_or(TransactionError::Overflow)?;

        Ok(Transaction {
            source_account: self.source_account,
            fee,
            seq_num,
            time_bounds: Some(TimeBounds {
                min_time: 0,
                max_time,
            }),
            memo: self.memo,
            operations: self.operations,
        })
    }
}

fn validate_account(address: &str) -> Result<(), TransactionError> {
    strkey::decode_account_id(address)
        .map(|_| ())
        .map_err(|source| TransactionError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[path = "tests/transaction_tests.rs"]
mod tests;
