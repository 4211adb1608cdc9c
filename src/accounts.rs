//! Account parsing.
//!
//! Turns the key textarea (one private key or mnemonic per line) into signing
//! accounts. Lines that cannot be turned into an account are dropped and only
//! counted; their text is never logged.

use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer};
use ethers::types::Address;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// How an account was derived
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountKind {
    PrivateKey,
    Mnemonic,
}

impl AccountKind {
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::PrivateKey => "private key",
            AccountKind::Mnemonic => "mnemonic",
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid private key: {0}")]
    PrivateKey(String),
    #[error("invalid mnemonic: {0}")]
    Mnemonic(String),
}

/// A signing identity. Key material stays inside the wallet and is never printed.
#[derive(Clone)]
pub struct Account {
    address: Address,
    kind: AccountKind,
    wallet: LocalWallet,
}

impl Account {
    pub fn from_wallet(wallet: LocalWallet, kind: AccountKind) -> Self {
        Self {
            address: wallet.address(),
            kind,
            wallet,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("kind", &self.kind)
            .finish()
    }
}

/// True for exactly `0x` followed by 64 hex digits
pub fn is_private_key_format(line: &str) -> bool {
    line.len() == 66
        && line.starts_with("0x")
        && line[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Derive an account from one line of input: a raw private key if it looks
/// like one, otherwise a BIP-39 English mnemonic at `m/44'/60'/0'/0/0`.
pub fn derive_account(secret: &str) -> Result<Account, AccountError> {
    if is_private_key_format(secret) {
        let bytes = hex::decode(&secret[2..]).map_err(|e| AccountError::PrivateKey(e.to_string()))?;
        let wallet =
            LocalWallet::from_bytes(&bytes).map_err(|e| AccountError::PrivateKey(e.to_string()))?;
        Ok(Account::from_wallet(wallet, AccountKind::PrivateKey))
    } else {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(secret)
            .build()
            .map_err(|e| AccountError::Mnemonic(e.to_string()))?;
        Ok(Account::from_wallet(wallet, AccountKind::Mnemonic))
    }
}

/// Result of parsing the key input
#[derive(Debug, Default, Clone)]
pub struct ParsedAccounts {
    /// Valid accounts in input order, duplicates kept
    pub accounts: Vec<Account>,
    /// Non-empty lines that could not be turned into an account
    pub dropped: usize,
}

impl ParsedAccounts {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.dropped == 0 {
            format!("{} account(s) loaded", self.accounts.len())
        } else {
            format!(
                "{} account(s) loaded, {} line(s) ignored",
                self.accounts.len(),
                self.dropped
            )
        }
    }
}

/// Parse multi-line key input with the local `ethers` derivation.
pub fn parse_accounts(text: &str) -> ParsedAccounts {
    parse_accounts_with(text, derive_account)
}

/// Parse multi-line key input with a caller-supplied derivation.
pub fn parse_accounts_with<F>(text: &str, derive: F) -> ParsedAccounts
where
    F: Fn(&str) -> Result<Account, AccountError>,
{
    let mut parsed = ParsedAccounts::default();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match derive(line) {
            Ok(account) => parsed.accounts.push(account),
            Err(e) => {
                // The error text may echo key material, so only its kind is traced
                let kind = match e {
                    AccountError::PrivateKey(_) => "private key",
                    AccountError::Mnemonic(_) => "mnemonic",
                };
                debug!("Ignoring line {} ({} could not be parsed)", line_no + 1, kind);
                parsed.dropped += 1;
            }
        }
    }
    parsed
}
