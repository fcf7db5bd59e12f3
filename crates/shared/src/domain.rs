use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_newtype!(AccountAddress);
string_newtype!(TxHash);

/// The address the user authorized for the current interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub address: AccountAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "amount", rename_all = "snake_case")]
pub enum BalanceView {
    /// No session, or the first lookup has not finished yet.
    #[default]
    Unknown,
    Available(String),
    /// The account does not exist on the ledger, or could not be read.
    Unfunded,
}

impl BalanceView {
    pub fn label(&self) -> String {
        match self {
            BalanceView::Unknown => "Loading...".to_string(),
            BalanceView::Available(amount) => format!("{amount} XLM"),
            BalanceView::Unfunded => "Account not funded yet".to_string(),
        }
    }
}

/// Form state for a payment; edited directly by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub recipient: String,
    pub amount: String,
}

impl PaymentDraft {
    pub fn new(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.recipient.trim().is_empty() && !self.amount.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    #[default]
    Idle,
    Pending,
    Succeeded {
        hash: TxHash,
    },
    Failed,
}

impl PaymentOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, PaymentOutcome::Pending)
    }

    pub fn hash(&self) -> Option<&TxHash> {
        match self {
            PaymentOutcome::Succeeded { hash } => Some(hash),
            _ => None,
        }
    }
}

/// `GABCDEFG...UVWXYZ` style rendering; short inputs are returned untouched.
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 14 {
        return address.to_string();
    }
    match (address.get(..8), address.get(address.len() - 6..)) {
        (Some(head), Some(tail)) => format!("{head}...{tail}"),
        _ => address.to_string(),
    }
}

pub fn shorten_hash(hash: &str) -> String {
    match hash.get(..20) {
        Some(head) if hash.len() > 20 => format!("{head}..."),
        _ => hash.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_both_fields() {
        assert!(!PaymentDraft::new("", "5").is_complete());
        assert!(!PaymentDraft::new("GABC", "  ").is_complete());
        assert!(PaymentDraft::new("GABC", "5").is_complete());
    }

    #[test]
    fn shortens_long_addresses_and_hashes() {
        let address = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
        assert_eq!(shorten_address(address), "GAAZI4TC...OCCWN7");
        assert_eq!(shorten_address("GSHORT"), "GSHORT");
        assert_eq!(
            shorten_hash("deadbeefdeadbeefdeadbeefdeadbeef"),
            "deadbeefdeadbeefdead..."
        );
    }

    #[test]
    fn balance_labels_match_display_states() {
        assert_eq!(BalanceView::Unknown.label(), "Loading...");
        assert_eq!(
            BalanceView::Available("100.0000000".into()).label(),
            "100.0000000 XLM"
        );
        assert_eq!(BalanceView::Unfunded.label(), "Account not funded yet");
    }
}
